//! Walking a deck: listing placeholders and filling slides from a data index.

use crate::deck::Deck;
use crate::image::{ImageSwap, ImageSwapper};
use crate::shape::ShapeKind;
use crate::slide::Slide;
use crate::text::{TableSubstitutor, TextSubstitutor};
use deckfill_core::{DataIndex, FillOptions, PlaceholderReport, Result, SlideRecord, TokenMatcher};
use serde::Serialize;

/// Counts from one substitution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FillSummary {
    /// Slides that had a data record.
    pub slides_visited: usize,
    /// Slides left untouched for lack of a record.
    pub slides_skipped: usize,
    pub tokens_replaced: usize,
    pub images_swapped: usize,
    pub links_rewritten: usize,
}

impl FillSummary {
    fn add(&mut self, other: FillSummary) {
        self.slides_visited += other.slides_visited;
        self.slides_skipped += other.slides_skipped;
        self.tokens_replaced += other.tokens_replaced;
        self.images_swapped += other.images_swapped;
        self.links_rewritten += other.links_rewritten;
    }
}

/// Drives discovery and substitution over a whole deck.
#[derive(Debug, Clone)]
pub struct DeckWalker {
    matcher: TokenMatcher,
    options: FillOptions,
}

impl DeckWalker {
    pub fn new(options: FillOptions) -> Self {
        Self {
            matcher: TokenMatcher::new(),
            options,
        }
    }

    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    /// List every native placeholder in slide order. Does not modify the deck.
    pub fn discover(&self, deck: &Deck) -> Result<Vec<PlaceholderReport>> {
        let mut reports = Vec::new();
        for slide in deck.slides() {
            for shape in slide.shapes()? {
                let Some(ph) = &shape.placeholder else {
                    continue;
                };
                reports.push(PlaceholderReport {
                    slide_number: slide.number(),
                    idx: ph.idx,
                    placeholder_type: ph.ph_type.to_string(),
                    shape_name: shape.name.clone(),
                });
            }
        }
        log::info!("Found {} placeholder(s)", reports.len());
        Ok(reports)
    }

    /// Fill every slide that has a record in `index`.
    pub fn substitute(&self, deck: &mut Deck, index: &DataIndex) -> Result<FillSummary> {
        let mut summary = FillSummary::default();

        for i in 0..deck.slides().len() {
            let Some((package, slide)) = deck.package_and_slide_mut(i) else {
                continue;
            };
            let record = u32::try_from(slide.number()).ok().and_then(|n| index.record(n));
            let Some(record) = record else {
                log::debug!("Slide {}: no data, skipping", slide.number());
                summary.slides_skipped += 1;
                continue;
            };

            let (mut slide_summary, swaps) = self.scan_slide(slide, record)?;
            slide_summary.images_swapped = ImageSwapper::new().apply(package, slide, swaps)?;
            slide_summary.slides_visited = 1;

            log::debug!(
                "Slide {}: {} token(s), {} image(s), {} link(s)",
                slide.number(),
                slide_summary.tokens_replaced,
                slide_summary.images_swapped,
                slide_summary.links_rewritten
            );
            summary.add(slide_summary);
        }

        log::info!(
            "Filled {} slide(s): {} token(s) replaced, {} image(s) swapped, {} link(s) rewritten",
            summary.slides_visited,
            summary.tokens_replaced,
            summary.images_swapped,
            summary.links_rewritten
        );
        Ok(summary)
    }

    /// Substitute text and tables on one slide and collect the image swaps
    /// to apply once the scan is over.
    fn scan_slide(&self, slide: &mut Slide, record: &SlideRecord) -> Result<(FillSummary, Vec<ImageSwap>)> {
        let mut summary = FillSummary::default();
        let mut swaps = Vec::new();
        let text = TextSubstitutor::new(&self.matcher, &self.options);
        let table = TableSubstitutor::new(&self.matcher);

        for shape in slide.shapes()? {
            // A position-indexed binding wins over anything in the shape's text.
            if let Some(image) = shape.placeholder_idx().and_then(|idx| record.image_for(idx)) {
                log::debug!("Slide {}: placeholder {} bound to {}", slide.number(), shape.name, image.display());
                swaps.push(ImageSwap {
                    shape,
                    image: image.clone(),
                });
                continue;
            }

            match shape.kind {
                ShapeKind::Text => {
                    let outcome = text.substitute_shape(slide, &shape, &record.content)?;
                    summary.tokens_replaced += outcome.replaced;
                    summary.links_rewritten += outcome.links_rewritten;
                    if let Some(image) = outcome.image {
                        swaps.push(ImageSwap { shape, image });
                    }
                }
                ShapeKind::Table => {
                    summary.tokens_replaced += table.substitute_shape(slide, &shape, &record.content)?;
                }
                _ => {}
            }
        }
        Ok((summary, swaps))
    }
}

impl Default for DeckWalker {
    fn default() -> Self {
        Self::new(FillOptions::default())
    }
}
