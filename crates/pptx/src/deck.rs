//! Opening, editing and saving a presentation.

use crate::package::{resolve_target, Package};
use crate::rels::{RT_OFFICE_DOCUMENT, RT_SLIDE};
use crate::slide::Slide;
use crate::xml::XmlDocument;
use deckfill_core::{Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

const DEFAULT_PRESENTATION_PART: &str = "ppt/presentation.xml";

/// A presentation held in memory.
#[derive(Debug, Clone)]
pub struct Deck {
    package: Package,
    slides: Vec<Slide>,
}

impl Deck {
    /// Open a `.pptx` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingTemplate(path.display().to_string()));
        }
        let file = File::open(path)?;
        log::debug!("Opening template {}", path.display());
        Self::from_reader(BufReader::new(file))
    }

    /// Read a presentation from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let package = Package::from_reader(reader)?;
        let presentation_part = presentation_part(&package)?;

        let slide_parts = slide_order(&package, &presentation_part)?;
        let mut slides = Vec::with_capacity(slide_parts.len());
        for part_name in slide_parts {
            let Some(bytes) = package.part(&part_name) else {
                log::warn!("Slide relationship points at missing part '{}', skipping", part_name);
                continue;
            };
            let doc = XmlDocument::from_bytes(bytes)?;
            let rels = package.read_rels(&part_name)?;
            slides.push(Slide::new(slides.len() + 1, part_name, doc, rels));
        }

        log::info!("Loaded presentation with {} slide(s)", slides.len());
        Ok(Self { package, slides })
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Mutable slide by 0-based position.
    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// The package and a slide, borrowed together for edits that touch both.
    pub fn package_and_slide_mut(&mut self, index: usize) -> Option<(&mut Package, &mut Slide)> {
        let slide = self.slides.get_mut(index)?;
        Some((&mut self.package, slide))
    }

    /// Write the presentation to a file. The parent directory must exist.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(Error::MissingOutputDir(parent.display().to_string()));
            }
        }

        let file = File::create(path)?;
        let mut writer = self.write_to(BufWriter::new(file))?;
        writer.flush()?;
        log::info!("Saved presentation to {}", path.display());
        Ok(())
    }

    /// Serialize the presentation into a writer.
    ///
    /// Slides never edited keep their original bytes.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut package = self.package.clone();
        for slide in &self.slides {
            if slide.doc_dirty() {
                package.set_part(slide.part_name(), slide.document().to_bytes()?);
            }
            if slide.rels_dirty() {
                package.write_rels(slide.part_name(), slide.rels())?;
            }
        }
        package.write_to(writer)
    }
}

/// Name of the main presentation part, from the package relationships.
fn presentation_part(package: &Package) -> Result<String> {
    let rels = package.read_rels("")?;
    let name = rels
        .first_of_type(RT_OFFICE_DOCUMENT)
        .map(|rel| resolve_target("", &rel.target))
        .unwrap_or_else(|| DEFAULT_PRESENTATION_PART.to_string());

    if !package.has_part(&name) {
        return Err(Error::CorruptedFile(format!("presentation part '{}' not found", name)));
    }
    Ok(name)
}

/// Slide part names in presentation order.
///
/// Order comes from `p:sldIdLst`. Without one, slide relationships are
/// sorted by the number in their target name, then their id.
fn slide_order(package: &Package, presentation_part: &str) -> Result<Vec<String>> {
    let rels = package.read_rels(presentation_part)?;
    let presentation = package.read_xml(presentation_part)?;

    if let Some(list) = presentation.root.child("sldIdLst") {
        let mut slides = Vec::new();
        for sld_id in list.children_named("sldId") {
            let rid = sld_id
                .attributes
                .iter()
                .find(|(k, _)| k.ends_with(":id"))
                .map(|(_, v)| v.as_str())
                .ok_or_else(|| Error::CorruptedFile("slide id without relationship".to_string()))?;
            let rel = rels
                .get(rid)
                .ok_or_else(|| Error::CorruptedFile(format!("dangling slide relationship '{}'", rid)))?;
            slides.push(resolve_target(presentation_part, &rel.target));
        }
        return Ok(slides);
    }

    let mut slides: Vec<(String, Option<usize>, Option<usize>)> = rels
        .iter()
        .filter(|rel| rel.is_type(RT_SLIDE))
        .map(|rel| {
            (
                resolve_target(presentation_part, &rel.target),
                extract_slide_number(&rel.target),
                extract_slide_number(&rel.id),
            )
        })
        .collect();

    slides.sort_by(|a, b| match (a.1.or(a.2), b.1.or(b.2)) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _, _)| path).collect())
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::visible_text;
    use crate::testutil::DeckBuilder;
    use std::io::Cursor;

    fn two_slides() -> DeckBuilder {
        DeckBuilder::new()
            .slide(DeckBuilder::text_shape(2, "First", "one"))
            .slide(DeckBuilder::text_shape(2, "Second", "two"))
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slides/slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_slide_order_from_id_list() {
        let deck = Deck::from_reader(Cursor::new(two_slides().build())).unwrap();
        let names: Vec<&str> = deck.slides().iter().map(|s| s.part_name()).collect();
        assert_eq!(names, vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml"]);
        assert_eq!(deck.slides()[1].number(), 2);
    }

    #[test]
    fn test_slide_order_without_id_list() {
        let deck = Deck::from_reader(Cursor::new(two_slides().without_slide_list().build())).unwrap();
        let names: Vec<&str> = deck.slides().iter().map(|s| s.part_name()).collect();
        assert_eq!(names, vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml"]);
    }

    #[test]
    fn test_round_trip_unchanged_text() {
        let deck = Deck::from_reader(Cursor::new(two_slides().build())).unwrap();
        let bytes = deck.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
        let reread = Deck::from_reader(Cursor::new(bytes)).unwrap();

        for (a, b) in deck.slides().iter().zip(reread.slides()) {
            let sa = a.shapes().unwrap();
            let sb = b.shapes().unwrap();
            assert_eq!(sa, sb);
            assert_eq!(
                visible_text(a.shape_element(&sa[0]).unwrap()),
                visible_text(b.shape_element(&sb[0]).unwrap())
            );
        }
    }

    #[test]
    fn test_unedited_slides_keep_original_bytes() {
        let alt = DeckBuilder::text_shape(2, "Alt", "one").replace(
            r#"name="Alt""#,
            r#"name="Alt" descr="line one&#xA;line two""#,
        );
        let mut deck = Deck::from_reader(Cursor::new(
            DeckBuilder::new()
                .slide(alt)
                .slide(DeckBuilder::text_shape(2, "Second", "two"))
                .build(),
        ))
        .unwrap();
        deck.slide_mut(1).unwrap().sp_tree_mut().unwrap();

        let bytes = deck.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
        let reread = Deck::from_reader(Cursor::new(bytes)).unwrap();
        let name = "ppt/slides/slide1.xml";
        assert_eq!(reread.package().part(name), deck.package().part(name));
        assert!(String::from_utf8_lossy(reread.package().part(name).unwrap()).contains("line one&#xA;line two"));
    }

    #[test]
    fn test_open_missing_template() {
        let err = Deck::open("/no/such/template.pptx").unwrap_err();
        assert!(matches!(err, Error::MissingTemplate(_)));
    }

    #[test]
    fn test_save_requires_output_dir() {
        let deck = Deck::from_reader(Cursor::new(two_slides().build())).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = deck.save(dir.path().join("missing").join("out.pptx")).unwrap_err();
        assert!(matches!(err, Error::MissingOutputDir(_)));

        let out = dir.path().join("out.pptx");
        deck.save(&out).unwrap();
        let reopened = Deck::open(&out).unwrap();
        assert_eq!(reopened.slides().len(), 2);
    }
}
