//! Builds small in-memory `.pptx` packages for tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const NS_DECLS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

/// Geometry given to shapes built without an explicit one.
pub const GEOM: (i64, i64, i64, i64) = (914400, 1828800, 3657600, 2743200);

struct SlideSpec {
    shapes: String,
    rels: Vec<(String, String, String, bool)>,
}

/// Assembles a minimal but structurally complete presentation.
pub struct DeckBuilder {
    slides: Vec<SlideSpec>,
    layout_shapes: String,
    master_shapes: String,
    with_slide_list: bool,
}

impl DeckBuilder {
    pub fn new() -> Self {
        Self {
            slides: Vec::new(),
            layout_shapes: String::new(),
            master_shapes: String::new(),
            with_slide_list: true,
        }
    }

    /// Add a slide with the given shape tree content.
    pub fn slide(self, shapes: impl Into<String>) -> Self {
        self.slide_with_rels(shapes, &[])
    }

    /// Add a slide with extra relationships `(id, type short name, target, external)`.
    /// `rId1` is reserved for the layout.
    pub fn slide_with_rels(mut self, shapes: impl Into<String>, rels: &[(&str, &str, &str, bool)]) -> Self {
        self.slides.push(SlideSpec {
            shapes: shapes.into(),
            rels: rels
                .iter()
                .map(|(id, ty, target, ext)| (id.to_string(), ty.to_string(), target.to_string(), *ext))
                .collect(),
        });
        self
    }

    /// Shapes of the single slide layout.
    pub fn layout(mut self, shapes: impl Into<String>) -> Self {
        self.layout_shapes = shapes.into();
        self
    }

    /// Shapes of the slide master.
    pub fn master(mut self, shapes: impl Into<String>) -> Self {
        self.master_shapes = shapes.into();
        self
    }

    /// Omit `p:sldIdLst` from the presentation part.
    pub fn without_slide_list(mut self) -> Self {
        self.with_slide_list = false;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        let mut put = |name: &str, content: String| {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        };

        let mut overrides = String::new();
        for i in 1..=self.slides.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                i
            ));
        }
        put(
            "[Content_Types].xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>{}</Types>"#,
                overrides
            ),
        );
        put(
            "_rels/.rels",
            rels_xml(&[("rId1".into(), "officeDocument".into(), "ppt/presentation.xml".into(), false)]),
        );

        let mut sld_ids = String::new();
        let mut pres_rels = vec![(
            "rId1".to_string(),
            "slideMaster".to_string(),
            "slideMasters/slideMaster1.xml".to_string(),
            false,
        )];
        // Relationship ids run backwards so ordering must come from sldIdLst.
        for i in 0..self.slides.len() {
            let rid = format!("rId{}", 100 - i);
            sld_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + i, rid));
            pres_rels.push((rid, "slide".into(), format!("slides/slide{}.xml", i + 1), false));
        }
        let sld_id_lst = if self.with_slide_list {
            format!("<p:sldIdLst>{}</p:sldIdLst>", sld_ids)
        } else {
            String::new()
        };
        put(
            "ppt/presentation.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{}<p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
                NS_DECLS, sld_id_lst
            ),
        );
        put("ppt/_rels/presentation.xml.rels", rels_xml(&pres_rels));

        put("ppt/slideMasters/slideMaster1.xml", part_xml("sldMaster", &self.master_shapes));
        put(
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            rels_xml(&[("rId1".into(), "slideLayout".into(), "../slideLayouts/slideLayout1.xml".into(), false)]),
        );
        put("ppt/slideLayouts/slideLayout1.xml", part_xml("sldLayout", &self.layout_shapes));
        put(
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            rels_xml(&[("rId1".into(), "slideMaster".into(), "../slideMasters/slideMaster1.xml".into(), false)]),
        );

        for (i, slide) in self.slides.iter().enumerate() {
            put(&format!("ppt/slides/slide{}.xml", i + 1), part_xml("sld", &slide.shapes));
            let mut rels = vec![(
                "rId1".to_string(),
                "slideLayout".to_string(),
                "../slideLayouts/slideLayout1.xml".to_string(),
                false,
            )];
            rels.extend(slide.rels.iter().cloned());
            put(&format!("ppt/slides/_rels/slide{}.xml.rels", i + 1), rels_xml(&rels));
        }

        zip.finish().unwrap().into_inner()
    }

    /// A `p:sp` with optional placeholder `(idx, type)` and optional geometry.
    pub fn sp(
        id: u32,
        name: &str,
        ph: Option<(u32, Option<&str>)>,
        geom: Option<(i64, i64, i64, i64)>,
        c_nv_pr_inner: &str,
        paragraphs: &str,
    ) -> String {
        let nv_pr = match ph {
            Some((idx, Some(ty))) => format!(r#"<p:nvPr><p:ph type="{}" idx="{}"/></p:nvPr>"#, ty, idx),
            Some((idx, None)) => format!(r#"<p:nvPr><p:ph idx="{}"/></p:nvPr>"#, idx),
            None => "<p:nvPr/>".to_string(),
        };
        let c_nv_pr = if c_nv_pr_inner.is_empty() {
            format!(r#"<p:cNvPr id="{}" name="{}"/>"#, id, name)
        } else {
            format!(r#"<p:cNvPr id="{}" name="{}">{}</p:cNvPr>"#, id, name, c_nv_pr_inner)
        };
        let sp_pr = match geom {
            Some(g) => format!("<p:spPr>{}</p:spPr>", xfrm("a", g)),
            None => "<p:spPr/>".to_string(),
        };
        format!(
            r#"<p:sp><p:nvSpPr>{}<p:cNvSpPr/>{}</p:nvSpPr>{}<p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
            c_nv_pr, nv_pr, sp_pr, paragraphs
        )
    }

    /// A plain text box with one run.
    pub fn text_shape(id: u32, name: &str, text: &str) -> String {
        Self::sp(id, name, None, Some(GEOM), "", &para(&[run(text)]))
    }

    /// A placeholder shape with one run and explicit geometry.
    pub fn placeholder_shape(id: u32, idx: u32, ty: Option<&str>, text: &str, geom: Option<(i64, i64, i64, i64)>) -> String {
        Self::sp(id, &format!("Placeholder {}", id), Some((idx, ty)), geom, "", &para(&[run(text)]))
    }

    /// A table frame; each row is a list of single-run cells.
    pub fn table_shape(id: u32, name: &str, rows: &[&[&str]]) -> String {
        let mut body = String::new();
        for row in rows {
            body.push_str(r#"<a:tr h="370840">"#);
            for cell in *row {
                body.push_str(&format!(
                    "<a:tc><a:txBody><a:bodyPr/><a:lstStyle/>{}</a:txBody><a:tcPr/></a:tc>",
                    para(&[run(cell)])
                ));
            }
            body.push_str("</a:tr>");
        }
        format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{}" name="{}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr>{}<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr/><a:tblGrid><a:gridCol w="2000000"/></a:tblGrid>{}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
            id,
            name,
            xfrm("p", GEOM),
            body
        )
    }
}

/// `<a:r>` with text.
pub fn run(text: &str) -> String {
    format!(r#"<a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r>"#, text)
}

/// `<a:r>` carrying an inline hyperlink.
pub fn link_run(text: &str, rid: &str) -> String {
    format!(
        r#"<a:r><a:rPr lang="en-US"><a:hlinkClick r:id="{}"/></a:rPr><a:t>{}</a:t></a:r>"#,
        rid, text
    )
}

/// `<a:p>` around the given runs.
pub fn para(runs: &[String]) -> String {
    format!("<a:p>{}</a:p>", runs.concat())
}

fn xfrm(prefix: &str, (x, y, cx, cy): (i64, i64, i64, i64)) -> String {
    format!(
        r#"<{p}:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{p}:xfrm>"#,
        x,
        y,
        cx,
        cy,
        p = prefix
    )
}

fn part_xml(root: &str, shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:{root} {ns}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld></p:{root}>"#,
        root = root,
        ns = NS_DECLS,
        shapes = shapes
    )
}

fn rels_xml(rels: &[(String, String, String, bool)]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (id, ty, target, external) in rels {
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{}" Target="{}"{}/>"#,
            id,
            ty,
            target,
            if *external { r#" TargetMode="External""# } else { "" }
        ));
    }
    out.push_str("</Relationships>");
    out
}
