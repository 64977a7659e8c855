//! PDF assembly: one page per normalised image, plus decorations and merging.
//!
//! Pages are built directly as `lopdf` objects. The JPEG produced by the codec
//! is embedded untouched as a `DCTDecode` image XObject, scaled to fit the
//! printable area and centred. Text decorations use a standard Type 1 font so
//! nothing has to be embedded.
//!
//! Painting order on each page: background fill, image, watermark, page
//! number.

use crate::config::{Orientation, PdfLayoutOptions};
use crate::error::{ConversionError, Result};
use crate::output::NormalizedImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::fmt::Write as _;
use std::path::Path;
use tracing::{debug, info, warn};

const PAGE_NUMBER_SIZE: f32 = 10.0;
const PAGE_NUMBER_BASELINE: f32 = 12.0;
const WATERMARK_MAX_SIZE: f32 = 72.0;
const WATERMARK_GRAY: f32 = 0.85;
const FONT_RESOURCE: &str = "F1";

/// Where one image lands on its page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_width: f32,
    pub page_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

/// Scale-to-fit and centre an `image_width`×`image_height` pixel image on a
/// page of the given size.
///
/// The scale is the largest that keeps the image inside the page minus the
/// orientation's margin budget. Small images are scaled up.
pub fn fit(
    image_width: u32,
    image_height: u32,
    page_width: f32,
    page_height: f32,
    orientation: Orientation,
) -> Placement {
    let (h_margin, v_margin) = orientation.margins();
    let (iw, ih) = (image_width as f32, image_height as f32);
    let scale = ((page_width - h_margin) / iw).min((page_height - v_margin) / ih);
    let (width, height) = (iw * scale, ih * scale);
    Placement {
        page_width,
        page_height,
        x: (page_width - width) / 2.0,
        y: (page_height - height) / 2.0,
        width,
        height,
        scale,
    }
}

/// Map a requested font name onto one of the standard PDF fonts.
pub fn base_font(requested: Option<&str>) -> &'static str {
    let Some(name) = requested else {
        return "Helvetica";
    };
    match name.trim().to_lowercase().replace([' ', '-', '_'], "").as_str() {
        "helvetica" | "arial" | "sans" | "sansserif" => "Helvetica",
        "helveticabold" | "arialbold" => "Helvetica-Bold",
        "times" | "timesroman" | "timesnewroman" | "serif" => "Times-Roman",
        "timesbold" => "Times-Bold",
        "courier" | "couriernew" | "mono" | "monospace" => "Courier",
        "courierbold" => "Courier-Bold",
        _ => {
            warn!("Font '{}' is not a standard PDF font, using Helvetica", name);
            "Helvetica"
        }
    }
}

// Average glyph advance as a fraction of the font size. Good enough to
// centre short strings.
fn average_advance(font: &str) -> f32 {
    if font.starts_with("Courier") {
        0.6
    } else if font.starts_with("Times") {
        0.5
    } else {
        0.556
    }
}

fn text_width(font: &str, text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * average_advance(font) * size
}

/// Encode `text` as a PDF literal string for a WinAnsi font.
///
/// WinAnsi agrees with Latin-1 on ASCII and U+00A0..=U+00FF only; anything
/// else becomes `?`.
fn pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('(');
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => out.push(' '),
            c if c.is_ascii() => out.push(c),
            c if (0xA0..=0xFF).contains(&(c as u32)) => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out.push(')');
    out
}

/// Builds the document page by page.
///
/// Each [`NormalizedImage`] is consumed by [`PdfAssembler::add_page`], so
/// its bytes live only until the page is written.
pub struct PdfAssembler {
    doc: Document,
    options: PdfLayoutOptions,
    page_size: (f32, f32),
    font: &'static str,
    font_id: Option<ObjectId>,
    pages: Vec<ObjectId>,
}

impl PdfAssembler {
    pub fn new(options: &PdfLayoutOptions) -> Self {
        Self {
            doc: Document::with_version("1.5"),
            page_size: options.page_size.dimensions_pt(options.orientation),
            font: base_font(options.font.as_deref()),
            font_id: None,
            pages: Vec::new(),
            options: options.clone(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn needs_text(&self) -> bool {
        self.options.show_page_numbers || self.watermark().is_some()
    }

    fn watermark(&self) -> Option<&str> {
        self.options
            .watermark_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }

    fn font_id(&mut self) -> ObjectId {
        if let Some(id) = self.font_id {
            return id;
        }
        let mut font = Dictionary::new();
        font.set("Type", "Font");
        font.set("Subtype", "Type1");
        font.set("BaseFont", self.font);
        font.set("Encoding", "WinAnsiEncoding");
        let id = self.doc.add_object(font);
        self.font_id = Some(id);
        id
    }

    /// Append one page showing `image`.
    pub fn add_page(&mut self, image: NormalizedImage) -> Result<()> {
        if image.width == 0 || image.height == 0 || image.jpeg.is_empty() {
            return Err(ConversionError::DocumentWrite(format!(
                "cannot embed '{}': empty image ({}x{})",
                image.source.display(),
                image.width,
                image.height
            )));
        }

        let number = self.pages.len() + 1;
        let (page_width, page_height) = self.page_size;
        let placement = fit(
            image.width,
            image.height,
            page_width,
            page_height,
            self.options.orientation,
        );
        if !(placement.scale.is_finite() && placement.scale > 0.0) {
            return Err(ConversionError::DocumentWrite(format!(
                "cannot place '{}': a {:.1}x{:.1}pt page leaves no room inside the margins",
                image.source.display(),
                page_width,
                page_height
            )));
        }

        let mut xobject = Dictionary::new();
        xobject.set("Type", "XObject");
        xobject.set("Subtype", "Image");
        xobject.set("Width", Object::Integer(image.width as i64));
        xobject.set("Height", Object::Integer(image.height as i64));
        xobject.set("ColorSpace", "DeviceRGB");
        xobject.set("BitsPerComponent", Object::Integer(8));
        xobject.set("Filter", "DCTDecode");
        let image_id = self.doc.add_object(Stream::new(xobject, image.jpeg));
        let image_name = format!("Im{number}");

        let content = self.page_content(number, &image_name, placement);
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut resources = Dictionary::new();
        let mut xobjects = Dictionary::new();
        xobjects.set(image_name, image_id);
        resources.set("XObject", xobjects);
        if self.needs_text() {
            let mut fonts = Dictionary::new();
            fonts.set(FONT_RESOURCE, self.font_id());
            resources.set("Font", fonts);
        }

        let mut page = Dictionary::new();
        page.set("Type", "Page");
        page.set(
            "MediaBox",
            vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_width),
                Object::Real(page_height),
            ],
        );
        page.set("Resources", resources);
        page.set("Contents", content_id);
        self.pages.push(self.doc.add_object(page));

        debug!(
            "Page {}: {} at {:.1},{:.1} size {:.1}x{:.1} (scale {:.3})",
            number,
            image.source.display(),
            placement.x,
            placement.y,
            placement.width,
            placement.height,
            placement.scale
        );
        Ok(())
    }

    fn page_content(&self, number: usize, image_name: &str, p: Placement) -> String {
        let mut ops = String::new();

        if let Some(color) = self.options.background_color {
            let (r, g, b) = color.unit();
            let _ = writeln!(
                ops,
                "q {r:.3} {g:.3} {b:.3} rg 0 0 {:.2} {:.2} re f Q",
                p.page_width, p.page_height
            );
        }

        let _ = writeln!(
            ops,
            "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /{} Do Q",
            p.width, p.height, p.x, p.y, image_name
        );

        if let Some(text) = self.watermark() {
            // Along the page diagonal, sized to span at most 80% of it.
            let diagonal = p.page_width.hypot(p.page_height);
            let size = (diagonal * 0.8 / text_width(self.font, text, 1.0)).min(WATERMARK_MAX_SIZE);
            let angle = p.page_height.atan2(p.page_width);
            let (sin, cos) = angle.sin_cos();
            let _ = writeln!(
                ops,
                "q {WATERMARK_GRAY} g BT /{FONT_RESOURCE} {size:.2} Tf {cos:.4} {sin:.4} {:.4} {cos:.4} {:.2} {:.2} Tm {:.2} {:.2} Td {} Tj ET Q",
                -sin,
                p.page_width / 2.0,
                p.page_height / 2.0,
                -text_width(self.font, text, size) / 2.0,
                -size / 3.0,
                pdf_string(text)
            );
        }

        if self.options.show_page_numbers {
            let label = format!("Page {number}");
            let x = (p.page_width - text_width(self.font, &label, PAGE_NUMBER_SIZE)) / 2.0;
            let _ = writeln!(
                ops,
                "q 0 g BT /{FONT_RESOURCE} {PAGE_NUMBER_SIZE} Tf {x:.2} {PAGE_NUMBER_BASELINE} Td {} Tj ET Q",
                pdf_string(&label)
            );
        }

        ops
    }

    /// Close the page tree and return the document.
    pub fn finish(mut self) -> Result<Document> {
        if self.pages.is_empty() {
            return Err(ConversionError::DocumentWrite(
                "no pages to write".to_string(),
            ));
        }

        let kids: Vec<Object> = self.pages.iter().map(|id| Object::Reference(*id)).collect();
        let mut pages = Dictionary::new();
        pages.set("Type", "Pages");
        pages.set("Kids", Object::Array(kids));
        pages.set("Count", Object::Integer(self.pages.len() as i64));
        let pages_id = self.doc.add_object(pages);

        for &page_id in &self.pages {
            if let Ok(page) = self.doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
                page.set("Parent", pages_id);
            }
        }

        let mut catalog = Dictionary::new();
        catalog.set("Type", "Catalog");
        catalog.set("Pages", pages_id);
        let catalog_id = self.doc.add_object(catalog);
        self.doc.trailer.set("Root", catalog_id);

        info!("Assembled {} page(s)", self.pages.len());
        Ok(self.doc)
    }
}

/// Build a complete document from `images`, then merge `options.merge_with`.
pub fn assemble(images: Vec<NormalizedImage>, options: &PdfLayoutOptions) -> Result<Document> {
    let mut assembler = PdfAssembler::new(options);
    for image in images {
        assembler.add_page(image)?;
    }
    let doc = assembler.finish()?;
    merge_all(doc, &options.merge_with)
}

/// Append every document in `paths`, in order, after `doc`'s pages.
pub fn merge_all(mut doc: Document, paths: &[impl AsRef<Path>]) -> Result<Document> {
    for path in paths {
        let path = path.as_ref();
        let other = Document::load(path).map_err(|e| ConversionError::MergeInput {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let before = doc.get_pages().len();
        doc = merge_documents(doc, other).map_err(|detail| ConversionError::MergeInput {
            path: path.to_path_buf(),
            detail,
        })?;
        info!(
            "Merged {} ({} page(s))",
            path.display(),
            doc.get_pages().len() - before
        );
    }
    Ok(doc)
}

const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

// Copy attributes a page inherits from its page-tree ancestors onto the page
// itself, so it renders the same once reparented.
fn materialize_inherited(doc: &mut Document) {
    let page_ids: Vec<ObjectId> = doc.page_iter().collect();
    for page_id in page_ids {
        let mut inherited: Vec<(&[u8], Object)> = Vec::new();
        if let Ok(page) = doc.get_dictionary(page_id) {
            let mut missing: Vec<&[u8]> = INHERITABLE
                .iter()
                .copied()
                .filter(|key| !page.has(key))
                .collect();
            let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
            let mut depth = 0;
            while let Some(parent_id) = parent {
                if missing.is_empty() || depth > 64 {
                    break;
                }
                let Ok(node) = doc.get_dictionary(parent_id) else {
                    break;
                };
                missing.retain(|key| match node.get(key) {
                    Ok(value) => {
                        inherited.push((*key, value.clone()));
                        false
                    }
                    Err(_) => true,
                });
                parent = node.get(b"Parent").and_then(Object::as_reference).ok();
                depth += 1;
            }
        }
        if inherited.is_empty() {
            continue;
        }
        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            for (key, value) in inherited {
                page.set(key, value);
            }
        }
    }
}

fn merge_documents(mut primary: Document, mut secondary: Document) -> std::result::Result<Document, String> {
    materialize_inherited(&mut secondary);
    secondary.renumber_objects_with(primary.max_id + 1);

    let secondary_pages: Vec<ObjectId> = secondary.page_iter().collect();
    if secondary_pages.is_empty() {
        return Err("document has no pages".to_string());
    }

    primary.max_id = primary.max_id.max(secondary.max_id);
    primary.objects.extend(secondary.objects);

    let pages_root = primary
        .catalog()
        .map_err(|e| format!("no catalog: {e}"))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|e| format!("no page tree: {e}"))?;

    let pages = primary
        .get_object_mut(pages_root)
        .and_then(Object::as_dict_mut)
        .map_err(|e| format!("page tree unreadable: {e}"))?;
    let kids = pages
        .get_mut(b"Kids")
        .and_then(Object::as_array_mut)
        .map_err(|e| format!("page tree has no kids: {e}"))?;
    kids.extend(secondary_pages.iter().map(|id| Object::Reference(*id)));
    let count = kids.len() as i64;
    pages.set("Count", count);

    for page_id in secondary_pages {
        if let Ok(page) = primary.get_object_mut(page_id).and_then(Object::as_dict_mut) {
            page.set("Parent", pages_root);
        }
    }

    Ok(primary)
}

/// Serialise `doc` to `path` through a sibling temp file, creating parent
/// directories as needed.
pub fn save(doc: &mut Document, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConversionError::io(parent, e))?;
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ConversionError::DocumentWrite(format!("serialising {}: {e}", path.display())))?;

    let tmp_path = path.with_extension("pdf.tmp");
    std::fs::write(&tmp_path, &buffer).map_err(|e| ConversionError::io(&tmp_path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        ConversionError::io(path, e)
    })?;

    info!("Wrote {} ({} bytes)", path.display(), buffer.len());
    Ok(())
}
