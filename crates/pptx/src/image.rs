//! Replacing placeholder shapes with pictures.

use crate::package::{relative_target, resolve_target, Package};
use crate::rels::{RT_IMAGE, RT_SLIDE_MASTER};
use crate::shape::{geometry, placeholder, Geometry, Placeholder, Shape};
use crate::slide::Slide;
use crate::xml::{XmlDocument, XmlElement};
use deckfill_core::{Error, ImageFormat, Result};
use std::path::{Path, PathBuf};

const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A scheduled replacement of one shape by an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSwap {
    pub shape: Shape,
    pub image: PathBuf,
}

/// Swaps shapes for pictures with the same position and size.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageSwapper;

impl ImageSwapper {
    pub fn new() -> Self {
        Self
    }

    /// Replace a single shape with a picture of `image`.
    pub fn swap(&self, package: &mut Package, slide: &mut Slide, shape: &Shape, image: &Path) -> Result<()> {
        self.apply(
            package,
            slide,
            vec![ImageSwap {
                shape: shape.clone(),
                image: image.to_path_buf(),
            }],
        )
        .map(|_| ())
    }

    /// Apply a batch of swaps collected while scanning the slide.
    ///
    /// Pictures are built first, then the original shapes are removed from the
    /// back of the shape tree forward so earlier positions stay valid, then
    /// the pictures are appended in scan order. Returns the number of swaps.
    pub fn apply(&self, package: &mut Package, slide: &mut Slide, swaps: Vec<ImageSwap>) -> Result<usize> {
        if swaps.is_empty() {
            return Ok(0);
        }

        let mut next_id = slide.next_shape_id();
        let mut pictures = Vec::with_capacity(swaps.len());
        for swap in &swaps {
            let element = slide.shape_element(&swap.shape)?;
            let geometry = resolve_geometry(package, slide, element)?;
            let picture = self.embed(package, slide, &swap.image, next_id, geometry)?;
            log::debug!(
                "Slide {}: '{}' -> picture {} at {:?}",
                slide.number(),
                swap.shape.name,
                swap.image.display(),
                geometry
            );
            pictures.push(picture);
            next_id += 1;
        }

        let mut indices: Vec<usize> = swaps.iter().map(|s| s.shape.tree_index).collect();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for index in indices {
            slide.remove_tree_child(index)?;
        }

        ensure_relationships_ns(slide);
        for picture in pictures {
            slide.append_shape(picture)?;
        }
        Ok(swaps.len())
    }

    /// Store the image in the package and build the `p:pic` element.
    fn embed(
        &self,
        package: &mut Package,
        slide: &mut Slide,
        image: &Path,
        id: u32,
        geometry: Geometry,
    ) -> Result<XmlElement> {
        if !image.is_file() {
            return Err(Error::ImageNotFound(image.display().to_string()));
        }
        let data = std::fs::read(image)?;
        let format = ImageFormat::from_magic(&data)
            .or_else(|| {
                image
                    .extension()
                    .and_then(|e| e.to_str())
                    .and_then(ImageFormat::from_extension)
            })
            .ok_or_else(|| Error::UnsupportedImage(image.display().to_string()))?;

        let media_part = package.add_media(format, data)?;
        let target = relative_target(slide.part_name(), &media_part);
        let rid = slide.rels_mut().add(RT_IMAGE, &target, false);

        let descr = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(picture_element(id, &descr, &rid, geometry))
    }
}

fn picture_element(id: u32, descr: &str, rid: &str, g: Geometry) -> XmlElement {
    let nv_pic_pr = XmlElement::new("p:nvPicPr")
        .with_child(
            XmlElement::new("p:cNvPr")
                .with_attr("id", id.to_string())
                .with_attr("name", format!("Picture {}", id.saturating_sub(1)))
                .with_attr("descr", descr),
        )
        .with_child(
            XmlElement::new("p:cNvPicPr")
                .with_child(XmlElement::new("a:picLocks").with_attr("noChangeAspect", "1")),
        )
        .with_child(XmlElement::new("p:nvPr"));

    let blip_fill = XmlElement::new("p:blipFill")
        .with_child(XmlElement::new("a:blip").with_attr("r:embed", rid))
        .with_child(XmlElement::new("a:stretch").with_child(XmlElement::new("a:fillRect")));

    let sp_pr = XmlElement::new("p:spPr")
        .with_child(
            XmlElement::new("a:xfrm")
                .with_child(
                    XmlElement::new("a:off")
                        .with_attr("x", g.left.to_string())
                        .with_attr("y", g.top.to_string()),
                )
                .with_child(
                    XmlElement::new("a:ext")
                        .with_attr("cx", g.width.to_string())
                        .with_attr("cy", g.height.to_string()),
                ),
        )
        .with_child(
            XmlElement::new("a:prstGeom")
                .with_attr("prst", "rect")
                .with_child(XmlElement::new("a:avLst")),
        );

    XmlElement::new("p:pic")
        .with_child(nv_pic_pr)
        .with_child(blip_fill)
        .with_child(sp_pr)
}

/// The `r:` prefix used by `r:embed` must be declared on the slide root.
fn ensure_relationships_ns(slide: &mut Slide) {
    let root = &mut slide.document_mut().root;
    if root.attr("xmlns:r").is_none() {
        root.set_attr("xmlns:r", R_NS);
    }
}

/// Geometry of a shape, inherited through the layout and master for
/// placeholders that do not declare their own.
pub fn resolve_geometry(package: &Package, slide: &Slide, element: &XmlElement) -> Result<Geometry> {
    if let Some(g) = geometry(element) {
        return Ok(g);
    }

    let missing = || Error::CorruptedFile(format!("shape on slide {} has no position or size", slide.number()));
    let ph = placeholder(element).ok_or_else(missing)?;
    let layout_part = slide.layout_part().ok_or_else(missing)?;

    let layout = package.read_xml(&layout_part)?;
    let layout_ph = find_placeholder(&layout, |p| p.idx == ph.idx);
    if let Some(g) = layout_ph.as_ref().and_then(|(e, _)| geometry(e)) {
        log::debug!("Geometry for placeholder {} inherited from {}", ph.idx, layout_part);
        return Ok(g);
    }

    // The master is matched by type, starting from the layout placeholder's type.
    let base_type = layout_ph.map_or_else(|| ph.ph_type.clone(), |(_, p)| p.ph_type);
    let master_part = package
        .read_rels(&layout_part)?
        .first_of_type(RT_SLIDE_MASTER)
        .map(|rel| resolve_target(&layout_part, &rel.target))
        .ok_or_else(missing)?;
    let master = package.read_xml(&master_part)?;
    find_placeholder(&master, |p| base_type.inherits_from(&p.ph_type))
        .and_then(|(e, _)| geometry(&e))
        .map(|g| {
            log::debug!("Geometry for placeholder {} inherited from {}", ph.idx, master_part);
            g
        })
        .ok_or_else(missing)
}

/// First placeholder shape in a part's shape tree matching `pred`.
fn find_placeholder<F>(doc: &XmlDocument, pred: F) -> Option<(XmlElement, Placeholder)>
where
    F: Fn(&Placeholder) -> bool,
{
    let tree = doc.root.path(&["cSld", "spTree"])?;
    tree.elements().find_map(|e| {
        let p = placeholder(e)?;
        pred(&p).then(|| (e.clone(), p))
    })
}
