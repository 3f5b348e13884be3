//! The `.pptx` zip package: an ordered set of named parts.

use crate::rels::Relationships;
use crate::xml::{XmlDocument, XmlElement, XmlNode};
use deckfill_core::{Error, ImageFormat, Result};
use std::io::{Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const MEDIA_DIR: &str = "ppt/media";

/// A named part and its raw bytes.
#[derive(Debug, Clone)]
struct Part {
    name: String,
    data: Vec<u8>,
}

/// All parts of a package, kept in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Read every part of a zip package into memory.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))?;
            parts.push(Part { name, data });
        }

        log::debug!("Read {} part(s) from package", parts.len());
        Ok(Self { parts })
    }

    /// Write every part to a new zip archive.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            zip.start_file(part.name.as_str(), options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", part.name, e)))?;
            zip.write_all(&part.data)?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.data.as_slice())
    }

    /// Whether a part exists.
    pub fn has_part(&self, name: &str) -> bool {
        self.part(name).is_some()
    }

    /// Names of all parts, in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Replace a part's bytes, or append a new part.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(Part {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Parse an XML part. A missing part is a corrupted package.
    pub fn read_xml(&self, name: &str) -> Result<XmlDocument> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::CorruptedFile(format!("missing part '{}'", name)))?;
        XmlDocument::from_bytes(data)
    }

    /// Relationships of a part; empty when the part has no `.rels`.
    pub fn read_rels(&self, part_name: &str) -> Result<Relationships> {
        match self.part(&rels_path_for(part_name)) {
            Some(data) => Relationships::from_bytes(data),
            None => Ok(Relationships::new()),
        }
    }

    /// Store relationships for a part.
    pub fn write_rels(&mut self, part_name: &str, rels: &Relationships) -> Result<()> {
        let data = rels.to_bytes()?;
        self.set_part(&rels_path_for(part_name), data);
        Ok(())
    }

    /// Add an image as a new media part and return the part name.
    pub fn add_media(&mut self, format: ImageFormat, data: Vec<u8>) -> Result<String> {
        let mut n = 1;
        let name = loop {
            // imageN is taken whatever its extension.
            let stem = format!("{}/image{}.", MEDIA_DIR, n);
            if !self.parts.iter().any(|p| p.name.starts_with(&stem)) {
                break format!("{}{}", stem, format.extension());
            }
            n += 1;
        };

        self.ensure_default_content_type(format.extension(), format.content_type())?;
        self.set_part(&name, data);
        log::debug!("Added media part {}", name);
        Ok(name)
    }

    /// Register a `<Default>` content type for an extension if none exists.
    pub fn ensure_default_content_type(&mut self, extension: &str, content_type: &str) -> Result<()> {
        let mut doc = self.read_xml(CONTENT_TYPES_PART)?;
        let exists = doc.root.children_named("Default").any(|e| {
            e.attr("Extension")
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        });
        if exists {
            return Ok(());
        }

        let default = XmlElement::new("Default")
            .with_attr("Extension", extension)
            .with_attr("ContentType", content_type);
        // Defaults conventionally precede Overrides.
        let pos = doc
            .root
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.is("Override")))
            .unwrap_or(doc.root.children.len());
        doc.root.children.insert(pos, XmlNode::Element(default));

        self.set_part(CONTENT_TYPES_PART, doc.to_bytes()?);
        Ok(())
    }
}

/// Path of the `.rels` part belonging to `part_name`.
pub fn rels_path_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_name),
    }
}

/// Resolve a relationship target relative to the part that owns the relationship.
pub fn resolve_target(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match base_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Relative reference from `from_part` to `to_part`, for use as a relationship target.
pub fn relative_target(from_part: &str, to_part: &str) -> String {
    let from_dir: Vec<&str> = match from_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    let to: Vec<&str> = to_part.split('/').collect();

    let common = from_dir
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out: Vec<&str> = vec![".."; from_dir.len() - common];
    out.extend(&to[common..]);
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::DeckBuilder;
    use std::io::Cursor;

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("ppt/slides/slide1.xml"), "ppt/slides/_rels/slide1.xml.rels");
        assert_eq!(rels_path_for("ppt/presentation.xml"), "ppt/_rels/presentation.xml.rels");
        assert_eq!(rels_path_for("file.xml"), "_rels/file.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("ppt/slides/slide1.xml", "../slideLayouts/slideLayout2.xml"),
            "ppt/slideLayouts/slideLayout2.xml"
        );
        assert_eq!(resolve_target("ppt/presentation.xml", "slides/slide3.xml"), "ppt/slides/slide3.xml");
        assert_eq!(resolve_target("ppt/presentation.xml", "/ppt/slides/slide3.xml"), "ppt/slides/slide3.xml");
    }

    #[test]
    fn test_relative_target() {
        assert_eq!(relative_target("ppt/slides/slide1.xml", "ppt/media/image1.png"), "../media/image1.png");
        assert_eq!(relative_target("ppt/presentation.xml", "ppt/slides/slide1.xml"), "slides/slide1.xml");
    }

    #[test]
    fn test_round_trip_keeps_parts() {
        let bytes = DeckBuilder::new().slide(DeckBuilder::text_shape(2, "Title", "Hello")).build();
        let package = Package::from_reader(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = package.part_names().map(String::from).collect();
        assert_eq!(names.first().map(String::as_str), Some(CONTENT_TYPES_PART));

        let written = package.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
        let reread = Package::from_reader(Cursor::new(written)).unwrap();
        let reread_names: Vec<String> = reread.part_names().map(String::from).collect();
        assert_eq!(reread_names, names);
        assert_eq!(reread.part("ppt/slides/slide1.xml"), package.part("ppt/slides/slide1.xml"));
    }

    #[test]
    fn test_add_media_registers_content_type_once() {
        let bytes = DeckBuilder::new().slide(DeckBuilder::text_shape(2, "Title", "Hello")).build();
        let mut package = Package::from_reader(Cursor::new(bytes)).unwrap();

        let first = package.add_media(ImageFormat::Png, vec![1]).unwrap();
        let second = package.add_media(ImageFormat::Png, vec![2]).unwrap();
        assert_eq!(first, "ppt/media/image1.png");
        assert_eq!(second, "ppt/media/image2.png");

        let types = package.read_xml(CONTENT_TYPES_PART).unwrap();
        let png_defaults = types
            .root
            .children_named("Default")
            .filter(|e| e.attr("Extension") == Some("png"))
            .count();
        assert_eq!(png_defaults, 1);
    }

    #[test]
    fn test_not_a_zip() {
        let err = Package::from_reader(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert!(matches!(err, Error::ZipError(_)));
    }
}
