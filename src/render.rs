//! PDF rendering
//!
//! The pipeline talks to rendering through the [`Renderer`] capability trait
//! so tests can substitute doubles. [`TemplateRenderer`] is the production
//! implementation: it builds a one-page US-Letter flyer with lopdf carrying
//! the template title, clickable Canva and Etsy link buttons, usage notes,
//! and a footer.

use async_trait::async_trait;
use lopdf::{Document, Object, Stream, dictionary};

use crate::error::{Error, Result};
use crate::types::SourceMetadata;

/// Page dimensions (US Letter, points)
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;

/// Link button geometry
const BUTTON_WIDTH: i64 = 260;
const BUTTON_HEIGHT: i64 = 42;

/// Opaque render step: template fields in, document bytes out
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Produce the PDF bytes for the given template fields
    async fn render(&self, source: &SourceMetadata) -> Result<Vec<u8>>;
}

/// Production renderer for the flyer template layout
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    /// Create a renderer
    pub fn new() -> Self {
        Self
    }

    fn build_document(&self, source: &SourceMetadata) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
        });
        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let oblique_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Oblique",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => bold_id,
                "F2" => regular_id,
                "F3" => oblique_id,
            },
        });

        let canva_rect = button_rect(560);
        let etsy_rect = button_rect(495);

        let content = page_content(source, canva_rect, etsy_rect);
        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            content.into_bytes(),
        )));

        let canva_link_id = doc.add_object(link_annotation(canva_rect, &source.canva_link));
        let etsy_link_id = doc.add_object(link_annotation(etsy_rect, &source.etsy_design_link));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Annots" => vec![canva_link_id.into(), etsy_link_id.into()],
        });

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| Error::Generation(format!("failed to serialize PDF: {e}")))?;
        Ok(buffer)
    }
}

#[async_trait]
impl Renderer for TemplateRenderer {
    async fn render(&self, source: &SourceMetadata) -> Result<Vec<u8>> {
        self.build_document(source)
    }
}

/// Button rectangle [x1, y1, x2, y2] centered horizontally at baseline `y`
fn button_rect(y: i64) -> [i64; 4] {
    let x = (PAGE_WIDTH - BUTTON_WIDTH) / 2;
    [x, y, x + BUTTON_WIDTH, y + BUTTON_HEIGHT]
}

/// A `/Link` annotation opening `url` when the rectangle is clicked
fn link_annotation(rect: [i64; 4], url: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![
            rect[0].into(),
            rect[1].into(),
            rect[2].into(),
            rect[3].into(),
        ],
        "Border" => vec![0.into(), 0.into(), 0.into()],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(url),
        },
    }
}

/// Assemble the page content stream
fn page_content(source: &SourceMetadata, canva_rect: [i64; 4], etsy_rect: [i64; 4]) -> String {
    let mut ops = String::new();

    let title = format!("{} [Template]", source.title);
    ops.push_str(&text_op("F1", 20, centered_x(&title, 20.0), 710, &title));

    ops.push_str(&text_op(
        "F2",
        13,
        centered_x(THANK_YOU_LINE, 13.0),
        660,
        THANK_YOU_LINE,
    ));
    ops.push_str(&text_op(
        "F2",
        13,
        centered_x(EDIT_PROMPT_LINE, 13.0),
        640,
        EDIT_PROMPT_LINE,
    ));

    ops.push_str(&button_ops(canva_rect, (0.15, 0.39, 0.92), "Edit in Canva"));
    ops.push_str(&button_ops(etsy_rect, (0.95, 0.45, 0.21), "Order a Custom Design"));

    // Usage notes
    ops.push_str(&text_op("F1", 13, 72, 430, "How it works:"));
    for (i, line) in INFO_LINES.iter().enumerate() {
        ops.push_str(&text_op("F2", 11, 86, 405 - (i as i64) * 20, line));
    }

    ops.push_str(&text_op(
        "F3",
        9,
        centered_x(FOOTER_LINE, 9.0),
        60,
        FOOTER_LINE,
    ));

    ops
}

const THANK_YOU_LINE: &str = "Thank you for your purchase!";
const EDIT_PROMPT_LINE: &str = "Your editable template is one click away.";
const INFO_LINES: &[&str] = &[
    "- Click the Canva button above to open your editable template.",
    "- Customize text, colors, and images to match your event.",
    "- Download or print straight from Canva when you are done.",
    "- Need something unique? Order a custom design with the second button.",
];
const FOOTER_LINE: &str = "This download link expires; save your template to Canva today.";

/// One positioned text run, restoring black fill afterwards
fn text_op(font: &str, size: i64, x: i64, y: i64, text: &str) -> String {
    format!(
        "BT /{font} {size} Tf {x} {y} Td ({}) Tj ET\n",
        escape_pdf_string(text)
    )
}

/// A filled button rectangle with a centered white label
fn button_ops(rect: [i64; 4], color: (f32, f32, f32), label: &str) -> String {
    let (r, g, b) = color;
    let width = rect[2] - rect[0];
    let height = rect[3] - rect[1];
    let label_x = rect[0] + (width - text_width(label, 13.0)) / 2;
    let label_y = rect[1] + height / 2 - 5;
    format!(
        "q {r:.2} {g:.2} {b:.2} rg {} {} {width} {height} re f Q\n\
         BT /F1 13 Tf 1 1 1 rg {label_x} {label_y} Td ({}) Tj 0 0 0 rg ET\n",
        rect[0],
        rect[1],
        escape_pdf_string(label)
    )
}

/// Approximate width of `text` in points at `size` (Helvetica average glyph
/// width is close to half the point size; exact metrics are not worth
/// carrying for this layout)
fn text_width(text: &str, size: f32) -> i64 {
    (text.chars().count() as f32 * size * 0.5) as i64
}

fn centered_x(text: &str, size: f32) -> i64 {
    ((PAGE_WIDTH - text_width(text, size)) / 2).max(36)
}

/// Escape characters with meaning inside PDF literal strings
fn escape_pdf_string(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            '\\' => vec!['\\', '\\'],
            '(' => vec!['\\', '('],
            ')' => vec!['\\', ')'],
            _ => vec![c],
        })
        .collect()
}
