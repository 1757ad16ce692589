//! Report export to PDF and Word documents.

mod docx;
mod pdf;

pub use docx::write_docx;
pub use pdf::write_pdf;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("regex is valid"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\-]+").expect("regex is valid"));
static DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").expect("regex is valid"));

/// Export document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

/// Turn a topic into a file-name-safe slug.
pub fn slugify(text: &str) -> String {
    let lower = text.trim().to_lowercase();
    let dashed = WHITESPACE.replace_all(&lower, "-");
    let word_only = NON_WORD.replace_all(&dashed, "");
    let collapsed = DASHES.replace_all(&word_only, "-");
    collapsed.trim_matches('-').to_string()
}

/// Default file name for an exported report: `report-<slug>.<ext>`.
pub fn default_filename(topic: &str, format: ExportFormat) -> String {
    format!("report-{}.{}", slugify(topic), format.extension())
}

/// Export a markdown report into `dir` and return the written path.
pub fn export_report(
    markdown: &str,
    topic: &str,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf> {
    let path = dir.join(default_filename(topic, format));
    match format {
        ExportFormat::Pdf => write_pdf(markdown, topic, &path)?,
        ExportFormat::Docx => write_docx(markdown, topic, &path)?,
    }
    log::info!("Exported {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Hello World  "), "hello-world");
        assert_eq!(slugify("Rust: the  Book!"), "rust-the-book");
        assert_eq!(slugify("--a -- b--"), "a-b");
        assert_eq!(slugify("Perché il cielo è blu?"), "perché-il-cielo-è-blu");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_default_filename() {
        assert_eq!(default_filename("Black Holes", ExportFormat::Pdf), "report-black-holes.pdf");
        assert_eq!(default_filename("Black Holes", ExportFormat::Docx), "report-black-holes.docx");
    }

    #[test]
    fn test_export_report_writes_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let report = "**Title**\n\nSome text.\n\n- a point";

        let pdf = export_report(report, "My Topic", ExportFormat::Pdf, dir.path()).unwrap();
        let docx = export_report(report, "My Topic", ExportFormat::Docx, dir.path()).unwrap();

        assert_eq!(pdf.file_name().unwrap(), "report-my-topic.pdf");
        assert_eq!(docx.file_name().unwrap(), "report-my-topic.docx");
        assert!(std::fs::metadata(&pdf).unwrap().len() > 0);
        assert!(std::fs::metadata(&docx).unwrap().len() > 0);
    }
}
