//! Token substitution in text frames and table cells.

use crate::hyperlink::HyperlinkRewriter;
use crate::shape::{table_mut, Shape};
use crate::slide::Slide;
use crate::xml::XmlElement;
use deckfill_core::{substitute_literal, substitute_text, ContentMap, FillOptions, Result, TokenMatcher};
use std::path::PathBuf;

/// What happened to one shape's text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextOutcome {
    /// Tokens replaced or removed.
    pub replaced: usize,

    /// Image the shape should be swapped for, from an image token.
    pub image: Option<PathBuf>,

    /// Hyperlink addresses rewritten.
    pub links_rewritten: usize,
}

/// Substitutes tokens in the runs of a shape's text frame.
#[derive(Debug, Clone, Copy)]
pub struct TextSubstitutor<'a> {
    matcher: &'a TokenMatcher,
    options: &'a FillOptions,
}

impl<'a> TextSubstitutor<'a> {
    pub fn new(matcher: &'a TokenMatcher, options: &'a FillOptions) -> Self {
        Self { matcher, options }
    }

    /// Substitute every run of `shape`, then rewrite its hyperlinks.
    ///
    /// When an image token resolves, the swap is reported in the outcome
    /// rather than performed, and the rest of the shape is left alone since
    /// the shape is about to be replaced.
    pub fn substitute_shape(&self, slide: &mut Slide, shape: &Shape, content: &ContentMap) -> Result<TextOutcome> {
        let element = slide.shape_element_mut(shape)?;
        let mut outcome = self.substitute_runs(element, content);

        if outcome.image.is_none() {
            outcome.links_rewritten = HyperlinkRewriter::new().rewrite(slide, shape, content)?;
        }
        Ok(outcome)
    }

    /// Substitute the runs of a shape element's `p:txBody`.
    pub fn substitute_runs(&self, element: &mut XmlElement, content: &ContentMap) -> TextOutcome {
        let mut outcome = TextOutcome::default();
        let Some(body) = element.child_mut("txBody") else {
            return outcome;
        };

        for paragraph in body.children_named_mut("p") {
            for run in paragraph.children_named_mut("r") {
                let Some(t) = run.child_mut("t") else {
                    continue;
                };
                let text = t.text();
                if !self.matcher.has_tokens(&text) {
                    continue;
                }

                let result = substitute_text(self.matcher, &text, content, self.options);
                if result.changed() {
                    log::debug!("Run '{}' -> '{}'", text, result.text);
                    t.set_text(result.text);
                    outcome.replaced += result.replaced;
                }
                if let Some(image) = result.images.into_iter().next() {
                    outcome.image = Some(image);
                    return outcome;
                }
            }
        }
        outcome
    }
}

/// Substitutes tokens in table cells with literal values only.
#[derive(Debug, Clone, Copy)]
pub struct TableSubstitutor<'a> {
    matcher: &'a TokenMatcher,
}

impl<'a> TableSubstitutor<'a> {
    pub fn new(matcher: &'a TokenMatcher) -> Self {
        Self { matcher }
    }

    /// Substitute every cell of a table shape. Returns the number of tokens replaced.
    pub fn substitute_shape(&self, slide: &mut Slide, shape: &Shape, content: &ContentMap) -> Result<usize> {
        let element = slide.shape_element_mut(shape)?;
        Ok(self.substitute_table(element, content))
    }

    /// Substitute every cell of a `p:graphicFrame` holding a table.
    pub fn substitute_table(&self, frame: &mut XmlElement, content: &ContentMap) -> usize {
        let Some(table) = table_mut(frame) else {
            return 0;
        };

        let mut replaced = 0;
        for row in table.children_named_mut("tr") {
            for cell in row.children_named_mut("tc") {
                let Some(body) = cell.child_mut("txBody") else {
                    continue;
                };
                for paragraph in body.children_named_mut("p") {
                    for run in paragraph.children_named_mut("r") {
                        let Some(t) = run.child_mut("t") else {
                            continue;
                        };
                        let text = t.text();
                        let result = substitute_literal(self.matcher, &text, content);
                        if result.changed() {
                            t.set_text(result.text);
                            replaced += result.replaced;
                        }
                    }
                }
            }
        }
        replaced
    }
}
