//! Hyperlink address rewriting.
//!
//! A shape's links are retargeted when a content key appears anywhere in the
//! shape's visible text. Matching is a raw substring test, not a token match,
//! so a short key such as `a` matches most shapes.

use crate::shape::{visible_text, Shape};
use crate::slide::Slide;
use crate::xml::XmlElement;
use deckfill_core::{ContentMap, Result};
use std::collections::HashSet;

/// Retargets shape click actions and run-level links.
#[derive(Debug, Clone, Copy, Default)]
pub struct HyperlinkRewriter;

impl HyperlinkRewriter {
    pub fn new() -> Self {
        Self
    }

    /// The address the shape's links should point at, if any key matches.
    ///
    /// Every matching key would be applied in content order, so the last one wins.
    pub fn matching_address<'c>(&self, text: &str, content: &'c ContentMap) -> Option<&'c str> {
        content
            .iter()
            .filter(|(key, _)| !key.is_empty() && text.contains(key.as_str()))
            .inspect(|(key, address)| log::debug!("Hyperlink key '{}' matched, address '{}'", key, address))
            .last()
            .map(|(_, address)| address.as_str())
    }

    /// Rewrite the links of `shape`. Returns the number of links rewritten.
    pub fn rewrite(&self, slide: &mut Slide, shape: &Shape, content: &ContentMap) -> Result<usize> {
        let text = visible_text(slide.shape_element(shape)?);
        let Some(address) = self.matching_address(&text, content) else {
            return Ok(0);
        };

        // Only links whose id resolves have an address to replace.
        let known: HashSet<String> = slide.rels().iter().map(|r| r.id.clone()).collect();

        // Only create the relationship when there is a link to point at it.
        if links_mut(slide.shape_element_mut(shape)?, &known).is_empty() {
            return Ok(0);
        }
        let rid = slide.rels_mut().get_or_add_hyperlink(address);

        let element = slide.shape_element_mut(shape)?;
        let mut previous = Vec::new();
        for link in links_mut(element, &known) {
            if let Some(old) = set_rel_id(link, &rid) {
                previous.push(old);
            }
        }
        previous.retain(|old| *old != rid);
        let rewritten = previous.len();

        previous.sort();
        previous.dedup();
        for old in previous {
            if !slide.references_rel(&old) {
                slide.rels_mut().remove(&old);
                log::debug!("Dropped unused relationship {} from {}", old, slide.part_name());
            }
        }

        log::debug!(
            "Slide {}: {} link(s) on '{}' -> {}",
            slide.number(),
            rewritten,
            shape.name,
            address
        );
        Ok(rewritten)
    }
}

/// The relationship-id attribute of an `a:hlinkClick`.
fn rel_id_key(link: &XmlElement) -> Option<String> {
    link.attributes
        .iter()
        .find(|(k, _)| k.ends_with(":id"))
        .map(|(k, _)| k.clone())
}

/// Whether a link carries an address: a non-empty id naming one of the slide's relationships.
fn has_address(link: &XmlElement, known: &HashSet<String>) -> bool {
    rel_id_key(link)
        .and_then(|key| link.attr(&key))
        .is_some_and(|id| known.contains(id))
}

/// Whether a shape-level click is a plain hyperlink rather than a jump or macro.
fn is_hyperlink_action(link: &XmlElement, known: &HashSet<String>) -> bool {
    has_address(link, known) && link.attr("action").map_or(true, str::is_empty)
}

/// Point a link at `rid`, returning the id it had before.
///
/// The link becomes a plain hyperlink, so any action verb it carried is dropped.
fn set_rel_id(link: &mut XmlElement, rid: &str) -> Option<String> {
    let key = rel_id_key(link)?;
    let old = link.attr(&key).map(str::to_string);
    link.set_attr(&key, rid);
    link.remove_attr("action");
    old
}

/// The shape click action, if a hyperlink, followed by every run link with an address.
fn links_mut<'a>(element: &'a mut XmlElement, known: &HashSet<String>) -> Vec<&'a mut XmlElement> {
    let mut links = Vec::new();
    // Split borrows: cNvPr lives under the non-visual wrapper, runs under txBody.
    let (mut click, mut body) = (None, None);
    for child in element.elements_mut() {
        if child.local_name().starts_with("nv") {
            click = child
                .child_mut("cNvPr")
                .and_then(|c| c.child_mut("hlinkClick"))
                .filter(|l| is_hyperlink_action(l, known));
        } else if child.is("txBody") {
            body = Some(child);
        }
    }
    links.extend(click);

    if let Some(body) = body {
        for paragraph in body.children_named_mut("p") {
            for run in paragraph.children_named_mut("r") {
                if let Some(link) = run.path_mut(&["rPr", "hlinkClick"]) {
                    if has_address(link, known) {
                        links.push(link);
                    }
                }
            }
        }
    }
    links
}
