//! Domain types for slide data and placeholder reporting.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Placeholder name to replacement value, in first-insertion order.
pub type ContentMap = IndexMap<String, String>;

/// One row of the tabular input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRow {
    /// 1-based slide number the row applies to.
    pub slide_num: u32,

    /// Token name, or a digits-only placeholder position index.
    pub placeholder: String,

    /// Replacement text or image path. Empty when the cell was missing.
    pub value: String,
}

impl InputRow {
    /// Create a new input row.
    pub fn new(slide_num: u32, placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            slide_num,
            placeholder: placeholder.into(),
            value: value.into(),
        }
    }

    /// The placeholder as a position index, if it consists only of decimal digits.
    ///
    /// Placeholder `idx` attributes are `xsd:unsignedInt`, so digits beyond
    /// `u32::MAX` cannot name any placeholder and yield `None`. Such a row is
    /// still kept as an ordinary content key.
    pub fn position_index(&self) -> Option<u32> {
        if self.placeholder.is_empty() || !self.placeholder.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        self.placeholder.parse().ok()
    }
}

/// Replacement data for a single slide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlideRecord {
    /// 1-based slide number.
    pub slide_num: u32,

    /// Every placeholder seen for this slide and its resolved value.
    pub content: ContentMap,

    /// Position index to image path, for digits-only placeholders naming an existing file.
    pub images: BTreeMap<u32, PathBuf>,
}

impl SlideRecord {
    /// Create an empty record for the given slide.
    pub fn new(slide_num: u32) -> Self {
        Self {
            slide_num,
            content: ContentMap::new(),
            images: BTreeMap::new(),
        }
    }

    /// Image bound to the placeholder at `idx`, if any.
    pub fn image_for(&self, idx: u32) -> Option<&PathBuf> {
        self.images.get(&idx)
    }
}

/// Type of a native template placeholder (`ST_PlaceholderType`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaceholderType {
    Title,
    Body,
    CenterTitle,
    Subtitle,
    Date,
    SlideNumber,
    Footer,
    Header,
    Object,
    Chart,
    Table,
    ClipArt,
    OrgChart,
    MediaClip,
    SlideImage,
    Picture,
    /// A type token this crate does not know about.
    Other(String),
}

impl PlaceholderType {
    /// Parse the `type` attribute of `<p:ph>`. An absent attribute means `obj`.
    pub fn from_xml(value: Option<&str>) -> Self {
        match value.unwrap_or("obj") {
            "title" => Self::Title,
            "body" => Self::Body,
            "ctrTitle" => Self::CenterTitle,
            "subTitle" => Self::Subtitle,
            "dt" => Self::Date,
            "sldNum" => Self::SlideNumber,
            "ftr" => Self::Footer,
            "hdr" => Self::Header,
            "obj" => Self::Object,
            "chart" => Self::Chart,
            "tbl" => Self::Table,
            "clipArt" => Self::ClipArt,
            "dgm" => Self::OrgChart,
            "media" => Self::MediaClip,
            "sldImg" => Self::SlideImage,
            "pic" => Self::Picture,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether a layout placeholder of type `other` can supply inherited
    /// properties for a slide placeholder of this type.
    pub fn inherits_from(&self, other: &PlaceholderType) -> bool {
        match (self, other) {
            // Title-like placeholders all inherit from the master title.
            (Self::CenterTitle, Self::Title) | (Self::Title, Self::CenterTitle) => true,
            // Content placeholders inherit from the master body.
            (Self::Subtitle | Self::Object | Self::Chart | Self::Table
                | Self::ClipArt | Self::OrgChart | Self::MediaClip | Self::Picture, Self::Body) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for PlaceholderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "TITLE",
            Self::Body => "BODY",
            Self::CenterTitle => "CENTER_TITLE",
            Self::Subtitle => "SUBTITLE",
            Self::Date => "DATE",
            Self::SlideNumber => "SLIDE_NUMBER",
            Self::Footer => "FOOTER",
            Self::Header => "HEADER",
            Self::Object => "OBJECT",
            Self::Chart => "CHART",
            Self::Table => "TABLE",
            Self::ClipArt => "CLIP_ART",
            Self::OrgChart => "ORG_CHART",
            Self::MediaClip => "MEDIA_CLIP",
            Self::SlideImage => "SLIDE_IMAGE",
            Self::Picture => "PICTURE",
            Self::Other(raw) => raw,
        };
        f.write_str(name)
    }
}

/// A native placeholder found while listing a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceholderReport {
    /// 1-based slide number.
    pub slide_number: usize,

    /// Position index of the placeholder.
    pub idx: u32,

    /// Placeholder type, as displayed to operators.
    #[serde(rename = "type")]
    pub placeholder_type: String,

    /// Shape name from the template, if it has one.
    pub shape_name: String,
}

/// Image formats that can be embedded in a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
}

impl ImageFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" | "jpe" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }
        if bytes.starts_with(b"BM") && bytes.len() >= 14 {
            return Some(Self::Bmp);
        }
        if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            return Some(Self::Tiff);
        }
        None
    }

    /// Extension used for the media part inside the package.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    /// MIME content type registered in `[Content_Types].xml`.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_index() {
        assert_eq!(InputRow::new(1, "3", "x").position_index(), Some(3));
        assert_eq!(InputRow::new(1, "03", "x").position_index(), Some(3));
        assert_eq!(InputRow::new(1, "title", "x").position_index(), None);
        assert_eq!(InputRow::new(1, "-1", "x").position_index(), None);
        assert_eq!(InputRow::new(1, "", "x").position_index(), None);
        assert_eq!(InputRow::new(1, "99999999999", "x").position_index(), None);
    }

    #[test]
    fn test_placeholder_type_from_xml() {
        assert_eq!(PlaceholderType::from_xml(None), PlaceholderType::Object);
        assert_eq!(PlaceholderType::from_xml(Some("ctrTitle")), PlaceholderType::CenterTitle);
        assert_eq!(PlaceholderType::from_xml(Some("pic")).to_string(), "PICTURE");
        assert_eq!(PlaceholderType::from_xml(Some("weird")).to_string(), "weird");
    }

    #[test]
    fn test_placeholder_type_inheritance() {
        assert!(PlaceholderType::Picture.inherits_from(&PlaceholderType::Body));
        assert!(PlaceholderType::CenterTitle.inherits_from(&PlaceholderType::Title));
        assert!(PlaceholderType::Footer.inherits_from(&PlaceholderType::Footer));
        assert!(!PlaceholderType::Footer.inherits_from(&PlaceholderType::Body));
    }

    #[test]
    fn test_image_format_detection() {
        assert_eq!(
            ImageFormat::from_magic(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0]),
            Some(ImageFormat::Png)
        );
        assert_eq!(ImageFormat::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(ImageFormat::from_magic(b"hello"), None);
        assert_eq!(ImageFormat::from_extension("JPG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_extension("svg"), None);
        assert_eq!(ImageFormat::Jpeg.content_type(), "image/jpeg");
    }
}
