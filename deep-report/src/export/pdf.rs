//! PDF export: A4 pages of wrapped plain text with page numbers.

use crate::text::strip_markdown;
use anyhow::{Context, Result};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const FONT_SIZE_PT: f32 = 11.0;
const LINE_HEIGHT_MM: f32 = 5.0;
/// Gap between the title line and the first body line
const TITLE_GAP_MM: f32 = 15.0;
/// Distance of the page number from the bottom edge
const FOOTER_OFFSET_MM: f32 = 10.0;
/// Average Helvetica glyph width as a fraction of the font size
const AVG_CHAR_WIDTH_EM: f32 = 0.5;
const MM_PER_PT: f32 = 0.352_778;

/// A line placed on a page, `y` measured in mm from the top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub y: f32,
}

/// One laid-out page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub number: usize,
    pub lines: Vec<PlacedLine>,
}

impl PageLayout {
    fn new(number: usize) -> Self {
        Self {
            number,
            lines: Vec::new(),
        }
    }

    pub fn footer(&self) -> String {
        format!("Page {}", self.number)
    }
}

fn text_width_mm(text: &str) -> f32 {
    text.chars().count() as f32 * FONT_SIZE_PT * AVG_CHAR_WIDTH_EM * MM_PER_PT
}

/// Characters that fit on one line of the usable width.
fn chars_per_line() -> usize {
    let usable = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    (usable / (FONT_SIZE_PT * AVG_CHAR_WIDTH_EM * MM_PER_PT)) as usize
}

/// Word-wrap text to at most `width` characters per line.
///
/// Each input line is wrapped separately and blank lines are kept, so
/// paragraph breaks survive. Words longer than a line are split.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(width) {
                let piece: String = piece.iter().collect();
                let piece_len = piece.chars().count();

                if current_len == 0 {
                    current = piece;
                    current_len = piece_len;
                } else if current_len + 1 + piece_len <= width {
                    current.push(' ');
                    current.push_str(&piece);
                    current_len += 1 + piece_len;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current = piece;
                    current_len = piece_len;
                }
            }
        }
        lines.push(current);
    }

    lines
}

/// Place body lines on pages.
///
/// The first page starts below the title. A new page begins when the next
/// line would come within 10 mm of the bottom margin.
pub fn paginate(lines: &[String]) -> Vec<PageLayout> {
    let mut pages = vec![PageLayout::new(1)];
    let mut cursor_y = MARGIN_MM + TITLE_GAP_MM;

    for line in lines {
        if cursor_y + 10.0 > PAGE_HEIGHT_MM - MARGIN_MM {
            pages.push(PageLayout::new(pages.len() + 1));
            cursor_y = MARGIN_MM;
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(PlacedLine {
                text: line.clone(),
                y: cursor_y,
            });
        }
        cursor_y += LINE_HEIGHT_MM;
    }

    pages
}

/// Write a markdown report as a PDF document.
pub fn write_pdf(markdown: &str, topic: &str, path: &Path) -> Result<()> {
    let title = format!("Report: {}", topic);
    let body = strip_markdown(markdown);
    let pages = paginate(&wrap_lines(&body, chars_per_line()));

    let (doc, first_page, first_layer) = PdfDocument::new(
        title.as_str(),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| anyhow::anyhow!("Failed to load PDF font: {:?}", e))?;

    for page in &pages {
        let (page_index, layer_index) = if page.number == 1 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1")
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);

        if page.number == 1 {
            layer.use_text(
                title.as_str(),
                FONT_SIZE_PT,
                Mm(MARGIN_MM),
                Mm(PAGE_HEIGHT_MM - MARGIN_MM),
                &font,
            );
        }

        for line in page.lines.iter().filter(|l| !l.text.is_empty()) {
            layer.use_text(
                line.text.as_str(),
                FONT_SIZE_PT,
                Mm(MARGIN_MM),
                Mm(PAGE_HEIGHT_MM - line.y),
                &font,
            );
        }

        // Right-aligned page number
        let footer = page.footer();
        let footer_x = PAGE_WIDTH_MM - MARGIN_MM - text_width_mm(&footer);
        layer.use_text(
            footer.as_str(),
            FONT_SIZE_PT,
            Mm(footer_x),
            Mm(FOOTER_OFFSET_MM),
            &font,
        );
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| anyhow::anyhow!("Failed to write PDF: {:?}", e))?;

    Ok(())
}
