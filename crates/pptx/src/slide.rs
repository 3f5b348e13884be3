//! A slide part, its shape tree and its relationships.

use crate::package::resolve_target;
use crate::rels::{Relationships, RT_SLIDE_LAYOUT};
use crate::shape::Shape;
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use deckfill_core::{Error, Result};

/// An editable slide.
#[derive(Debug, Clone)]
pub struct Slide {
    number: usize,
    part_name: String,
    doc: XmlDocument,
    rels: Relationships,
    doc_dirty: bool,
    rels_dirty: bool,
}

impl Slide {
    /// Wrap a parsed slide part.
    pub fn new(number: usize, part_name: impl Into<String>, doc: XmlDocument, rels: Relationships) -> Self {
        Self {
            number,
            part_name: part_name.into(),
            doc,
            rels,
            doc_dirty: false,
            rels_dirty: false,
        }
    }

    /// 1-based position in the presentation.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn part_name(&self) -> &str {
        &self.part_name
    }

    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Mutable relationships; marks them for writing on save.
    pub fn rels_mut(&mut self) -> &mut Relationships {
        self.rels_dirty = true;
        &mut self.rels
    }

    pub(crate) fn rels_dirty(&self) -> bool {
        self.rels_dirty
    }

    /// Whether the slide XML was handed out for editing since it was opened.
    pub(crate) fn doc_dirty(&self) -> bool {
        self.doc_dirty
    }

    pub(crate) fn document(&self) -> &XmlDocument {
        &self.doc
    }

    pub(crate) fn document_mut(&mut self) -> &mut XmlDocument {
        self.doc_dirty = true;
        &mut self.doc
    }

    /// The `p:spTree` element.
    pub fn sp_tree(&self) -> Result<&XmlElement> {
        self.doc
            .root
            .path(&["cSld", "spTree"])
            .ok_or_else(|| Error::CorruptedFile(format!("{} has no shape tree", self.part_name)))
    }

    /// Mutable `p:spTree`; marks the slide for writing on save.
    pub fn sp_tree_mut(&mut self) -> Result<&mut XmlElement> {
        self.doc_dirty = true;
        let part_name = &self.part_name;
        self.doc
            .root
            .path_mut(&["cSld", "spTree"])
            .ok_or_else(|| Error::CorruptedFile(format!("{} has no shape tree", part_name)))
    }

    /// Top-level shapes, in document order.
    pub fn shapes(&self) -> Result<Vec<Shape>> {
        let tree = self.sp_tree()?;
        Ok(tree
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                XmlNode::Element(e) => Shape::from_element(i, e),
                _ => None,
            })
            .collect())
    }

    /// The element of a shape returned by [`Slide::shapes`].
    pub fn shape_element(&self, shape: &Shape) -> Result<&XmlElement> {
        match self.sp_tree()?.children.get(shape.tree_index) {
            Some(XmlNode::Element(e)) => Ok(e),
            _ => Err(self.stale(shape)),
        }
    }

    /// Mutable element of a shape returned by [`Slide::shapes`].
    pub fn shape_element_mut(&mut self, shape: &Shape) -> Result<&mut XmlElement> {
        let err = self.stale(shape);
        match self.sp_tree_mut()?.children.get_mut(shape.tree_index) {
            Some(XmlNode::Element(e)) => Ok(e),
            _ => Err(err),
        }
    }

    fn stale(&self, shape: &Shape) -> Error {
        Error::CorruptedFile(format!(
            "shape '{}' is no longer at position {} of {}",
            shape.name, shape.tree_index, self.part_name
        ))
    }

    /// An id one greater than every `cNvPr` id on the slide.
    pub fn next_shape_id(&self) -> u32 {
        let mut max = 0;
        self.doc.root.walk(&mut |e| {
            if e.is("cNvPr") {
                if let Some(id) = e.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                    max = max.max(id);
                }
            }
        });
        max + 1
    }

    /// Part name of the slide layout this slide is based on.
    pub fn layout_part(&self) -> Option<String> {
        self.rels
            .first_of_type(RT_SLIDE_LAYOUT)
            .map(|rel| resolve_target(&self.part_name, &rel.target))
    }

    /// Whether any element on the slide references relationship `rid`.
    pub fn references_rel(&self, rid: &str) -> bool {
        let mut found = false;
        self.doc.root.walk(&mut |e| {
            found |= e
                .attributes
                .iter()
                .any(|(k, v)| v == rid && is_rel_attribute(k));
        });
        found
    }

    /// Remove and return the element at a shape tree position.
    pub fn remove_tree_child(&mut self, tree_index: usize) -> Result<XmlNode> {
        let tree = self.sp_tree_mut()?;
        if tree_index >= tree.children.len() {
            return Err(Error::CorruptedFile(format!(
                "no shape at position {} of {}",
                tree_index, self.part_name
            )));
        }
        Ok(tree.children.remove(tree_index))
    }

    /// Append a shape at the top of the z-order, before any trailing `p:extLst`.
    pub fn append_shape(&mut self, element: XmlElement) -> Result<()> {
        let tree = self.sp_tree_mut()?;
        let pos = tree
            .children
            .iter()
            .rposition(|n| matches!(n, XmlNode::Element(e) if e.is("extLst")))
            .unwrap_or(tree.children.len());
        tree.children.insert(pos, XmlNode::Element(element));
        Ok(())
    }
}

/// Attributes in the relationships namespace that hold relationship ids.
fn is_rel_attribute(key: &str) -> bool {
    matches!(
        key.rsplit_once(':'),
        Some((_, "id" | "embed" | "link" | "pict" | "dm" | "lo" | "qs" | "cs"))
    )
}
