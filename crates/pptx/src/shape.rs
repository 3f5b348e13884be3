//! Read-only views over the shapes of a slide's shape tree.
//!
//! A shape is classified once into a [`ShapeKind`]; the placeholder capability
//! is carried separately because text boxes, pictures and graphic frames can
//! all be placeholders.

use crate::xml::XmlElement;
use deckfill_core::PlaceholderType;
use serde::Serialize;

/// What a top-level shape element is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ShapeKind {
    /// `p:sp`, an autoshape or text box with a text frame.
    Text,
    /// `p:graphicFrame` holding an `a:tbl`.
    Table,
    /// `p:pic`.
    Picture,
    /// `p:grpSp`. Members are not visited.
    Group,
    /// `p:cxnSp`.
    Connector,
    /// Any other graphic frame (chart, diagram, OLE object).
    GraphicFrame,
}

/// Native placeholder properties from `<p:ph>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Position index; `0` when the attribute is absent.
    pub idx: u32,
    pub ph_type: PlaceholderType,
}

/// Position and size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Geometry {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Geometry {
    /// Read `a:off` and `a:ext` from an `xfrm` element.
    pub fn from_xfrm(xfrm: &XmlElement) -> Option<Self> {
        let off = xfrm.child("off")?;
        let ext = xfrm.child("ext")?;
        let num = |e: &XmlElement, key: &str| e.attr(key).and_then(|v| v.trim().parse::<i64>().ok());
        Some(Self {
            left: num(off, "x")?,
            top: num(off, "y")?,
            width: num(ext, "cx")?,
            height: num(ext, "cy")?,
        })
    }
}

/// A top-level shape of a slide.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Index of the element among the shape tree's child nodes.
    pub tree_index: usize,
    pub id: u32,
    pub name: String,
    pub kind: ShapeKind,
    pub placeholder: Option<Placeholder>,
}

impl Shape {
    /// Classify a shape tree child. Returns `None` for non-shape children
    /// such as `p:nvGrpSpPr` or `p:extLst`.
    pub fn from_element(tree_index: usize, element: &XmlElement) -> Option<Self> {
        let kind = match element.local_name() {
            "sp" => ShapeKind::Text,
            "pic" => ShapeKind::Picture,
            "grpSp" => ShapeKind::Group,
            "cxnSp" => ShapeKind::Connector,
            "graphicFrame" if table(element).is_some() => ShapeKind::Table,
            "graphicFrame" => ShapeKind::GraphicFrame,
            _ => return None,
        };

        let c_nv_pr = c_nv_pr(element);
        let id = c_nv_pr
            .and_then(|e| e.attr("id"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let name = c_nv_pr
            .and_then(|e| e.attr("name"))
            .unwrap_or_default()
            .to_string();

        Some(Self {
            tree_index,
            id,
            name,
            kind,
            placeholder: placeholder(element),
        })
    }

    /// Position index, for placeholders.
    pub fn placeholder_idx(&self) -> Option<u32> {
        self.placeholder.as_ref().map(|p| p.idx)
    }
}

/// The non-visual properties wrapper (`p:nvSpPr`, `p:nvPicPr`, ...).
pub fn non_visual(element: &XmlElement) -> Option<&XmlElement> {
    element
        .elements()
        .find(|e| e.local_name().starts_with("nv"))
}

/// Mutable variant of [`non_visual`].
pub fn non_visual_mut(element: &mut XmlElement) -> Option<&mut XmlElement> {
    element
        .elements_mut()
        .find(|e| e.local_name().starts_with("nv"))
}

/// `p:cNvPr`, which carries the id, the name and the click action.
pub fn c_nv_pr(element: &XmlElement) -> Option<&XmlElement> {
    non_visual(element)?.child("cNvPr")
}

/// Mutable `p:cNvPr`.
pub fn c_nv_pr_mut(element: &mut XmlElement) -> Option<&mut XmlElement> {
    non_visual_mut(element)?.child_mut("cNvPr")
}

/// Placeholder properties, if the shape is a native placeholder.
pub fn placeholder(element: &XmlElement) -> Option<Placeholder> {
    let ph = non_visual(element)?.path(&["nvPr", "ph"])?;
    Some(Placeholder {
        idx: ph.attr("idx").and_then(|v| v.parse().ok()).unwrap_or(0),
        ph_type: PlaceholderType::from_xml(ph.attr("type")),
    })
}

/// The shape's own geometry, if it declares one.
pub fn geometry(element: &XmlElement) -> Option<Geometry> {
    let xfrm = match element.local_name() {
        "graphicFrame" => element.child("xfrm"),
        "grpSp" => element.path(&["grpSpPr", "xfrm"]),
        _ => element.path(&["spPr", "xfrm"]),
    }?;
    Geometry::from_xfrm(xfrm)
}

/// The `a:tbl` of a table graphic frame.
pub fn table(element: &XmlElement) -> Option<&XmlElement> {
    element.path(&["graphic", "graphicData", "tbl"])
}

/// Mutable `a:tbl`.
pub fn table_mut(element: &mut XmlElement) -> Option<&mut XmlElement> {
    element.path_mut(&["graphic", "graphicData", "tbl"])
}

/// Text the shape shows: paragraphs joined with `\n`, line breaks as `\u{b}`.
pub fn visible_text(element: &XmlElement) -> String {
    let Some(body) = element.child("txBody") else {
        return String::new();
    };
    body.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push('\u{b}'),
            _ => {}
        }
    }
    text
}
