//! Minimal WordprocessingML package: a bold title and one paragraph per line.

use crate::text::strip_markdown;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

/// Title run size in half-points (16 pt)
const TITLE_SIZE: u32 = 32;
/// Paragraph spacing after, in twentieths of a point
const TITLE_SPACING_AFTER: u32 = 400;
const PARAGRAPH_SPACING_AFTER: u32 = 200;

/// Escape text for an XML text node, dropping characters XML 1.0 forbids.
fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

fn paragraph(text: &str, spacing_after: u32, run_props: &str) -> String {
    format!(
        "<w:p><w:pPr><w:spacing w:after=\"{}\"/></w:pPr><w:r>{}<w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
        spacing_after,
        run_props,
        escape_xml(text)
    )
}

/// Build `word/document.xml` for a title and plain-text body.
pub fn document_xml(topic: &str, body: &str) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>",
    );

    let title_props = format!(
        "<w:rPr><w:b/><w:sz w:val=\"{0}\"/><w:szCs w:val=\"{0}\"/></w:rPr>",
        TITLE_SIZE
    );
    xml.push_str(&paragraph(
        &format!("Report: {}", topic),
        TITLE_SPACING_AFTER,
        &title_props,
    ));

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        xml.push_str(&paragraph(line, PARAGRAPH_SPACING_AFTER, ""));
    }

    xml.push_str("<w:sectPr/></w:body></w:document>");
    xml
}

/// Write a markdown report as a .docx document.
pub fn write_docx(markdown: &str, topic: &str, path: &Path) -> Result<()> {
    let body = strip_markdown(markdown);
    let file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/document.xml", document_xml(topic, &body)),
    ];
    for (name, contents) in &parts {
        zip.start_file(*name, options)
            .with_context(|| format!("Failed to add {} to document", name))?;
        zip.write_all(contents.as_bytes())?;
    }

    zip.finish().context("Failed to finalize document")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_xml("\"x\" 'y'"), "&quot;x&quot; &apos;y&apos;");
        assert_eq!(escape_xml("bell\u{7}less"), "bellless");
    }

    #[test]
    fn test_document_xml_title_and_paragraphs() {
        let xml = document_xml("Rust & C", "First line\n\n   \nSecond line");

        assert!(xml.contains("<w:b/><w:sz w:val=\"32\"/>"));
        assert!(xml.contains("Report: Rust &amp; C"));
        assert!(xml.contains("<w:spacing w:after=\"400\"/>"));
        // Blank lines produce no paragraphs
        assert_eq!(xml.matches("<w:p>").count(), 3);
        assert_eq!(xml.matches("<w:spacing w:after=\"200\"/>").count(), 2);
        assert!(xml.find("First line").unwrap() < xml.find("Second line").unwrap());
    }

    #[test]
    fn test_write_docx_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");

        write_docx("# Titolo\n\n**Grassetto** e testo.", "Prova", &path).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        assert!(archive.by_name("[Content_Types].xml").is_ok());
        assert!(archive.by_name("_rels/.rels").is_ok());

        let mut document = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut document)
            .unwrap();
        assert!(document.contains("Report: Prova"));
        assert!(document.contains(">Titolo<"));
        assert!(document.contains(">Grassetto e testo.<"));
        assert!(!document.contains("**"));
    }
}
