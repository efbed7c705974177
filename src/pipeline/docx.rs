//! Minimal WordprocessingML (DOCX) writer.
//!
//! A `.docx` file is a ZIP package of XML parts. Only four parts are needed
//! for Word, LibreOffice and Google Docs to open the document:
//!
//! ```text
//! [Content_Types].xml   part → MIME type map
//! _rels/.rels           package → main document relationship
//! word/document.xml     the body
//! docProps/core.xml     title
//! ```
//!
//! The body holds one right-aligned paragraph per page. Consecutive pages are
//! separated by a paragraph containing only a page-break run, so an N-page
//! document has exactly N−1 breaks and none after the last page.

use crate::error::OcrError;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

type XmlResult<T> = Result<T, quick_xml::Error>;

/// Build a DOCX package with one right-aligned paragraph per page.
pub fn build_docx<S: AsRef<str>>(pages: &[S], title: &str) -> Result<Vec<u8>, OcrError> {
    let document = document_xml(pages).map_err(xml_err)?;
    let core = core_xml(title).map_err(xml_err)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &[u8]); 4] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", PACKAGE_RELS.as_bytes()),
        ("word/document.xml", &document),
        ("docProps/core.xml", &core),
    ];
    for (name, bytes) in parts {
        zip.start_file(name, options).map_err(zip_err)?;
        zip.write_all(bytes)
            .map_err(|e| OcrError::DocumentWriteFailed(format!("{name}: {e}")))?;
    }

    Ok(zip.finish().map_err(zip_err)?.into_inner())
}

fn xml_err(e: quick_xml::Error) -> OcrError {
    OcrError::DocumentWriteFailed(format!("XML: {e}"))
}

fn zip_err(e: zip::result::ZipError) -> OcrError {
    OcrError::DocumentWriteFailed(format!("ZIP: {e}"))
}

fn document_xml<S: AsRef<str>>(pages: &[S]) -> XmlResult<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    w.write_event(Event::Start(
        BytesStart::new("w:document").with_attributes([("xmlns:w", NS_W)]),
    ))?;
    w.write_event(Event::Start(BytesStart::new("w:body")))?;

    for (i, page) in pages.iter().enumerate() {
        write_page_paragraph(&mut w, page.as_ref())?;
        if i + 1 < pages.len() {
            write_page_break(&mut w)?;
        }
    }

    write_section_properties(&mut w)?;
    w.write_event(Event::End(BytesEnd::new("w:body")))?;
    w.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(w.into_inner())
}

/// `<w:p>` with right alignment; lines become `<w:br/>`, tabs `<w:tab/>`.
fn write_page_paragraph(w: &mut Writer<Vec<u8>>, text: &str) -> XmlResult<()> {
    w.write_event(Event::Start(BytesStart::new("w:p")))?;
    w.write_event(Event::Start(BytesStart::new("w:pPr")))?;
    w.write_event(Event::Empty(
        BytesStart::new("w:jc").with_attributes([("w:val", "right")]),
    ))?;
    w.write_event(Event::End(BytesEnd::new("w:pPr")))?;

    let text = xml_safe(text);
    if !text.is_empty() {
        w.write_event(Event::Start(BytesStart::new("w:r")))?;
        for (line_no, line) in text.split('\n').enumerate() {
            if line_no > 0 {
                w.write_event(Event::Empty(BytesStart::new("w:br")))?;
            }
            for (seg_no, segment) in line.split('\t').enumerate() {
                if seg_no > 0 {
                    w.write_event(Event::Empty(BytesStart::new("w:tab")))?;
                }
                if !segment.is_empty() {
                    w.write_event(Event::Start(
                        BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
                    ))?;
                    w.write_event(Event::Text(BytesText::new(segment)))?;
                    w.write_event(Event::End(BytesEnd::new("w:t")))?;
                }
            }
        }
        w.write_event(Event::End(BytesEnd::new("w:r")))?;
    }

    w.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

fn write_page_break(w: &mut Writer<Vec<u8>>) -> XmlResult<()> {
    w.write_event(Event::Start(BytesStart::new("w:p")))?;
    w.write_event(Event::Start(BytesStart::new("w:r")))?;
    w.write_event(Event::Empty(
        BytesStart::new("w:br").with_attributes([("w:type", "page")]),
    ))?;
    w.write_event(Event::End(BytesEnd::new("w:r")))?;
    w.write_event(Event::End(BytesEnd::new("w:p")))?;
    Ok(())
}

/// US Letter with one-inch margins, the python-docx / Word default.
fn write_section_properties(w: &mut Writer<Vec<u8>>) -> XmlResult<()> {
    w.write_event(Event::Start(BytesStart::new("w:sectPr")))?;
    w.write_event(Event::Empty(
        BytesStart::new("w:pgSz").with_attributes([("w:w", "12240"), ("w:h", "15840")]),
    ))?;
    w.write_event(Event::Empty(BytesStart::new("w:pgMar").with_attributes([
        ("w:top", "1440"),
        ("w:right", "1440"),
        ("w:bottom", "1440"),
        ("w:left", "1440"),
        ("w:header", "720"),
        ("w:footer", "720"),
        ("w:gutter", "0"),
    ])))?;
    w.write_event(Event::End(BytesEnd::new("w:sectPr")))?;
    Ok(())
}

fn core_xml(title: &str) -> XmlResult<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    w.write_event(Event::Start(BytesStart::new("cp:coreProperties").with_attributes([
        (
            "xmlns:cp",
            "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
        ),
        ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ])))?;
    w.write_event(Event::Start(BytesStart::new("dc:title")))?;
    w.write_event(Event::Text(BytesText::new(&xml_safe(title))))?;
    w.write_event(Event::End(BytesEnd::new("dc:title")))?;
    w.write_event(Event::Start(BytesStart::new("dc:creator")))?;
    w.write_event(Event::Text(BytesText::new("arabic-pdf-ocr")))?;
    w.write_event(Event::End(BytesEnd::new("dc:creator")))?;
    w.write_event(Event::End(BytesEnd::new("cp:coreProperties")))?;
    Ok(w.into_inner())
}

/// Drop characters XML 1.0 cannot represent and normalise CRLF/CR to LF.
fn xml_safe(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n')
                || ('\u{20}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || c >= '\u{10000}'
        })
        .collect()
}
