#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub const LETTER: &str = r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440"/><w:cols w:space="720"/></w:sectPr>"#;

/// Builds small .docx packages in memory.
#[derive(Default, Clone)]
pub struct DocxFixture {
    body: String,
    section: Option<String>,
    header: Option<String>,
}

impl DocxFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.body.push_str(&format!(
            r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#
        ));
        self
    }

    pub fn paragraphs(self, lines: &[&str]) -> Self {
        lines.iter().fold(self, |fixture, line| fixture.paragraph(line))
    }

    pub fn table(mut self, widths: &[u32], text: &str) -> Self {
        let cells: String = widths
            .iter()
            .map(|w| {
                format!(
                    r#"<w:tc><w:tcPr><w:tcW w:w="{w}" w:type="dxa"/></w:tcPr><w:p><w:r><w:rPr><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr><w:t>{text}</w:t></w:r></w:p></w:tc>"#
                )
            })
            .collect();
        self.body
            .push_str(&format!("<w:tbl><w:tblPr/><w:tr>{cells}</w:tr></w:tbl>"));
        self
    }

    /// A paragraph holding an inline picture of `cx` by `cy` EMU.
    pub fn picture(mut self, cx: u64, cy: u64) -> Self {
        self.body.push_str(&format!(
            r#"<w:p><w:r><w:drawing><wp:inline><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="7" name="Figure"/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture"><pic:pic><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
        ));
        self
    }

    pub fn raw(mut self, xml: &str) -> Self {
        self.body.push_str(xml);
        self
    }

    /// Replaces the trailing letter-size section.
    pub fn section(mut self, sect_pr: &str) -> Self {
        self.section = Some(sect_pr.to_string());
        self
    }

    /// Adds an existing default header part referenced by the final section.
    pub fn with_header(mut self, text: &str) -> Self {
        self.header = Some(text.to_string());
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut section = self.section.unwrap_or_else(|| LETTER.to_string());
        let mut overrides = String::new();
        let mut rels = String::from(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        );
        let mut parts: Vec<(String, String)> = Vec::new();

        if let Some(text) = &self.header {
            rels.push_str(r#"<Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>"#);
            overrides.push_str(r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#);
            parts.push((
                "word/header1.xml".to_string(),
                format!(r#"<w:hdr xmlns:w="{W_NS}"><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:hdr>"#),
            ));
            section = section.replacen(
                "<w:sectPr>",
                r#"<w:sectPr><w:headerReference w:type="default" r:id="rId9"/>"#,
                1,
            );
        }

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{}{section}</w:body></w:document>"#,
            self.body
        );

        parts.push((
            "[Content_Types].xml".to_string(),
            format!(
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>{overrides}</Types>"#
            ),
        ));
        parts.push((
            "_rels/.rels".to_string(),
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#.to_string(),
        ));
        parts.push(("word/document.xml".to_string(), document));
        parts.push((
            "word/_rels/document.xml.rels".to_string(),
            format!(
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        ));
        parts.push((
            "word/styles.xml".to_string(),
            format!(r#"<w:styles xmlns:w="{W_NS}"/>"#),
        ));

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in &parts {
            zip.start_file(name.as_str(), FileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}

pub fn logo_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(10, 5, image::Rgb([0, 80, 160]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

/// Names of every entry in a zip archive.
pub fn entry_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    archive.file_names().map(str::to_string).collect()
}
