//! Part relationships (`_rels/*.rels`).

use crate::xml::{XmlDocument, XmlElement};
use deckfill_core::Result;

pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub const RT_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const RT_SLIDE_LAYOUT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const RT_SLIDE_MASTER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const RT_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const RT_HYPERLINK: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
pub const RT_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

/// A single relationship entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `true` for `TargetMode="External"` (hyperlinks).
    pub external: bool,
}

impl Relationship {
    /// Whether this relationship has the given type. Only the last URI segment
    /// is compared, so strict-conformance type URIs match as well.
    pub fn is_type(&self, rel_type: &str) -> bool {
        last_segment(&self.rel_type) == last_segment(rel_type)
    }
}

fn last_segment(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// The relationships of one part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty relationship set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let doc = XmlDocument::from_bytes(bytes)?;
        let entries = doc
            .root
            .children_named("Relationship")
            .map(|e| Relationship {
                id: e.attr("Id").unwrap_or_default().to_string(),
                rel_type: e.attr("Type").unwrap_or_default().to_string(),
                target: e.attr("Target").unwrap_or_default().to_string(),
                external: e.attr("TargetMode") == Some("External"),
            })
            .collect();
        Ok(Self { entries })
    }

    /// Serialize back to a `.rels` part.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut root = XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS);
        for rel in &self.entries {
            let mut e = XmlElement::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.rel_type.as_str())
                .with_attr("Target", rel.target.as_str());
            if rel.external {
                e = e.with_attr("TargetMode", "External");
            }
            root = root.with_child(e);
        }
        XmlDocument::new(root).to_bytes()
    }

    /// All entries, in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    /// Look up a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// First relationship of the given type.
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.is_type(rel_type))
    }

    /// Lowest `rIdN` not yet in use.
    pub fn next_id(&self) -> String {
        let mut n = 1;
        loop {
            let id = format!("rId{}", n);
            if self.get(&id).is_none() {
                return id;
            }
            n += 1;
        }
    }

    /// Add a relationship and return its id.
    pub fn add(&mut self, rel_type: &str, target: &str, external: bool) -> String {
        let id = self.next_id();
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external,
        });
        id
    }

    /// Id of an external hyperlink to `address`, adding one if none exists.
    pub fn get_or_add_hyperlink(&mut self, address: &str) -> String {
        let existing = self
            .entries
            .iter()
            .find(|r| r.is_type(RT_HYPERLINK) && r.external && r.target == address);
        match existing {
            Some(rel) => rel.id.clone(),
            None => self.add(RT_HYPERLINK, address, true),
        }
    }

    /// Remove a relationship. Returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#;

    #[test]
    fn test_parse() {
        let rels = Relationships::from_bytes(RELS.as_bytes()).unwrap();
        assert_eq!(rels.len(), 2);
        let link = rels.get("rId2").unwrap();
        assert!(link.external);
        assert_eq!(link.target, "https://example.com/?a=1&b=2");
        assert_eq!(
            rels.first_of_type(RT_SLIDE_LAYOUT).unwrap().target,
            "../slideLayouts/slideLayout1.xml"
        );
    }

    #[test]
    fn test_next_id_fills_gaps() {
        let rels = Relationships::from_bytes(RELS.as_bytes()).unwrap();
        assert_eq!(rels.next_id(), "rId3");
        let mut rels = Relationships::new();
        assert_eq!(rels.add(RT_IMAGE, "../media/image1.png", false), "rId1");
        assert_eq!(rels.next_id(), "rId2");
    }

    #[test]
    fn test_hyperlink_reuse_and_remove() {
        let mut rels = Relationships::from_bytes(RELS.as_bytes()).unwrap();
        assert_eq!(rels.get_or_add_hyperlink("https://example.com/?a=1&b=2"), "rId2");
        assert_eq!(rels.get_or_add_hyperlink("https://new.example"), "rId3");
        assert!(rels.remove("rId2"));
        assert!(!rels.remove("rId2"));
        assert_eq!(rels.len(), 2);
    }

    #[test]
    fn test_strict_type_uri_matches() {
        let rel = Relationship {
            id: "rId1".to_string(),
            rel_type: "http://purl.oclc.org/ooxml/officeDocument/relationships/image".to_string(),
            target: "../media/image1.png".to_string(),
            external: false,
        };
        assert!(rel.is_type(RT_IMAGE));
        assert!(!rel.is_type(RT_HYPERLINK));
    }

    #[test]
    fn test_round_trip() {
        let rels = Relationships::from_bytes(RELS.as_bytes()).unwrap();
        let reparsed = Relationships::from_bytes(&rels.to_bytes().unwrap()).unwrap();
        assert_eq!(reparsed, rels);
    }
}
