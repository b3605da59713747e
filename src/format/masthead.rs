//! Branded header and footer for every section.
//!
//! Each section gets a freshly created header part (logo and three masthead
//! lines in a borderless two-cell table) and footer part (copyright line,
//! optional DOI and a live PAGE field). Default parts the sections used
//! before are removed once nothing refers to them.

use crate::config::JournalConfig;
use crate::core::document::Document;
use crate::core::package::{Relationships, REL_IMAGE};
use crate::core::paragraph::{Alignment, Paragraph};
use crate::core::schema::{
    inches_to_emu, inches_to_twips, A_NS, PIC_NS, R_NS, TCPR_ORDER, WP_NS, W_NS,
};
use crate::core::section::HeaderFooterKind;
use crate::core::xml::Element;
use crate::error::{Error, Result};
use image::ImageFormat;
use log::{debug, info};

const TABLE_WIDTH_IN: f32 = 8.0;
const LOGO_COLUMN_IN: f32 = 0.6;
const TEXT_COLUMN_IN: f32 = 7.4;
const LOGO_WIDTH_IN: f32 = 0.4;
const RULE_COLOR: &str = "BFBFBF";

/// A decoded logo, ready to be embedded.
#[derive(Debug, Clone)]
pub struct Logo {
    data: Vec<u8>,
    format: ImageFormat,
    width_px: u32,
    height_px: u32,
}

impl Logo {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::input("logo image is empty"));
        }
        let format = image::guess_format(bytes)?;
        if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
            return Err(Error::input(format!(
                "logo must be PNG or JPEG, got {format:?}"
            )));
        }
        let decoded = image::load_from_memory_with_format(bytes, format)?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(Error::input("logo image has no pixels"));
        }
        Ok(Self {
            data: bytes.to_vec(),
            format,
            width_px: decoded.width(),
            height_px: decoded.height(),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width_px, self.height_px)
    }

    fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "jpeg",
            _ => "png",
        }
    }

    fn content_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "image/jpeg",
            _ => "image/png",
        }
    }

    /// Extent in EMU when drawn `width_in` inches wide.
    pub fn extent(&self, width_in: f32) -> (u64, u64) {
        let cx = inches_to_emu(width_in);
        let cy = (cx as f64 * self.height_px as f64 / self.width_px as f64).round() as u64;
        (cx, cy)
    }
}

/// Footer text up to, not including, the page number.
pub fn footer_text(config: &JournalConfig) -> String {
    let mut text = format!(
        "© {} {} | {}",
        config.year(),
        config.footer_journal,
        config.base_url
    );
    if let Some(doi) = config.doi() {
        text.push_str(&format!(" | Journal DOI URL: {doi}"));
    }
    text.push_str(" | Page ");
    text
}

pub struct MastheadInjector<'a> {
    config: &'a JournalConfig,
}

impl<'a> MastheadInjector<'a> {
    pub fn new(config: &'a JournalConfig) -> Self {
        Self { config }
    }

    /// Replaces the header and footer of every section. Returns the number of
    /// sections touched.
    pub fn apply(&self, doc: &mut Document, logo: &Logo) -> Result<usize> {
        let previous: Vec<String> = doc
            .sections_mut()
            .iter()
            .flat_map(|s| {
                [HeaderFooterKind::Header, HeaderFooterKind::Footer]
                    .into_iter()
                    .filter_map(|kind| s.reference(kind).map(str::to_string))
                    .collect::<Vec<_>>()
            })
            .collect();

        let media = doc.add_media(logo.data.clone(), logo.extension(), logo.content_type());
        debug!("stored logo as {media}");

        let count = doc.section_count();
        let first_drawing_id = doc.max_drawing_id() + 1;
        let mut parts = Vec::with_capacity(count);
        for index in 0..count {
            let header = doc.add_header_footer_part(HeaderFooterKind::Header, |rels| {
                self.header(rels, &media, logo, first_drawing_id + index as u32)
            });
            let footer =
                doc.add_header_footer_part(HeaderFooterKind::Footer, |_| self.footer());
            parts.push((header, footer));
        }

        {
            let mut sections = doc.sections_mut();
            if sections.len() != parts.len() {
                return Err(Error::structure(format!(
                    "expected {} sections, found {}",
                    parts.len(),
                    sections.len()
                )));
            }
            for (section, (header, footer)) in sections.iter_mut().zip(&parts) {
                section.set_reference(HeaderFooterKind::Header, header);
                section.set_reference(HeaderFooterKind::Footer, footer);
            }
            if let Some(first) = sections.first_mut() {
                first.set_page_number_start(self.config.start_page_number);
            }
        }

        for rel_id in previous {
            doc.remove_unreferenced_part(&rel_id);
        }
        info!("masthead applied to {count} section(s)");
        Ok(count)
    }

    fn header(&self, rels: &mut Relationships, media: &str, logo: &Logo, drawing_id: u32) -> Element {
        let image_rel = rels.add(REL_IMAGE, media);

        let mut logo_para = Paragraph::new();
        logo_para
            .add_run("")
            .append(logo_drawing(logo, &image_rel, drawing_id));

        let lines = [
            (self.config.line1.as_str(), Alignment::Right, 9.0),
            (self.config.line2.as_str(), Alignment::Center, 11.0),
            (self.config.line3.as_str(), Alignment::Center, 8.0),
        ];
        let text_paras = lines.into_iter().map(|(text, alignment, size)| {
            let mut para = Paragraph::new();
            para.set_alignment(alignment);
            para.add_run(text).set_bold(true).set_font_size(size);
            para
        });

        let logo_width = inches_to_twips(LOGO_COLUMN_IN);
        let text_width = inches_to_twips(TEXT_COLUMN_IN);
        let row = Element::new("w:tr")
            .with_child(cell(logo_width, [logo_para]))
            .with_child(cell(text_width, text_paras));

        let table = Element::new("w:tbl")
            .with_child(table_properties())
            .with_child(
                Element::new("w:tblGrid")
                    .with_child(Element::new("w:gridCol").with_attr("w:w", logo_width.to_string()))
                    .with_child(Element::new("w:gridCol").with_attr("w:w", text_width.to_string())),
            )
            .with_child(row);

        part_root("w:hdr")
            .with_child(table)
            // A header part has to end with a paragraph.
            .with_child(Element::new("w:p"))
    }

    fn footer(&self) -> Element {
        let mut para = Paragraph::new();
        para.set_alignment(Alignment::Center);
        para.add_run(&footer_text(self.config)).set_font_size(8.0);
        for piece in page_field() {
            para.add_run("").set_font_size(8.0).append(piece);
        }
        part_root("w:ftr").with_child(para.into_element())
    }
}

fn part_root(name: &str) -> Element {
    Element::new(name)
        .with_attr("xmlns:w", W_NS)
        .with_attr("xmlns:r", R_NS)
        .with_attr("xmlns:wp", WP_NS)
        .with_attr("xmlns:a", A_NS)
        .with_attr("xmlns:pic", PIC_NS)
}

fn table_properties() -> Element {
    let mut borders = Element::new("w:tblBorders");
    for side in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        borders.push(Element::new(side).with_attr("w:val", "nil"));
    }
    Element::new("w:tblPr")
        .with_child(
            Element::new("w:tblW")
                .with_attr("w:w", inches_to_twips(TABLE_WIDTH_IN).to_string())
                .with_attr("w:type", "dxa"),
        )
        .with_child(Element::new("w:jc").with_attr("w:val", "center"))
        .with_child(borders)
        .with_child(Element::new("w:tblLayout").with_attr("w:type", "fixed"))
}

/// A fixed-width cell with the double gray rule under it.
fn cell(width: u32, paragraphs: impl IntoIterator<Item = Paragraph>) -> Element {
    let mut tc_pr = Element::new("w:tcPr");
    tc_pr.set_child(
        Element::new("w:tcW")
            .with_attr("w:w", width.to_string())
            .with_attr("w:type", "dxa"),
        TCPR_ORDER,
    );
    tc_pr.set_child(
        Element::new("w:tcBorders").with_child(
            Element::new("w:bottom")
                .with_attr("w:val", "double")
                .with_attr("w:sz", "6")
                .with_attr("w:space", "0")
                .with_attr("w:color", RULE_COLOR),
        ),
        TCPR_ORDER,
    );
    let mut tc = Element::new("w:tc").with_child(tc_pr);
    for para in paragraphs {
        tc.push(para.into_element());
    }
    tc
}

fn logo_drawing(logo: &Logo, rel_id: &str, id: u32) -> Element {
    let (cx, cy) = logo.extent(LOGO_WIDTH_IN);
    let extent = || {
        Element::new("a:ext")
            .with_attr("cx", cx.to_string())
            .with_attr("cy", cy.to_string())
    };
    let name = format!("logo.{}", logo.extension());

    let pic = Element::new("pic:pic")
        .with_child(
            Element::new("pic:nvPicPr")
                .with_child(
                    Element::new("pic:cNvPr")
                        .with_attr("id", "0")
                        .with_attr("name", name.as_str()),
                )
                .with_child(Element::new("pic:cNvPicPr")),
        )
        .with_child(
            Element::new("pic:blipFill")
                .with_child(Element::new("a:blip").with_attr("r:embed", rel_id))
                .with_child(Element::new("a:stretch").with_child(Element::new("a:fillRect"))),
        )
        .with_child(
            Element::new("pic:spPr")
                .with_child(
                    Element::new("a:xfrm")
                        .with_child(Element::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                        .with_child(extent()),
                )
                .with_child(
                    Element::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(Element::new("a:avLst")),
                ),
        );

    let inline = Element::new("wp:inline")
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(
            Element::new("wp:extent")
                .with_attr("cx", cx.to_string())
                .with_attr("cy", cy.to_string()),
        )
        .with_child(
            Element::new("wp:docPr")
                .with_attr("id", id.to_string())
                .with_attr("name", format!("Logo {id}")),
        )
        .with_child(
            Element::new("wp:cNvGraphicFramePr").with_child(
                Element::new("a:graphicFrameLocks").with_attr("noChangeAspect", "1"),
            ),
        )
        .with_child(
            Element::new("a:graphic").with_child(
                Element::new("a:graphicData")
                    .with_attr("uri", PIC_NS)
                    .with_child(pic),
            ),
        );

    Element::new("w:drawing").with_child(inline)
}

/// Run contents of a PAGE field with a cached value of 1.
fn page_field() -> [Element; 5] {
    let fld_char = |kind: &str| Element::new("w:fldChar").with_attr("w:fldCharType", kind);
    [
        fld_char("begin"),
        Element::new("w:instrText")
            .with_attr("xml:space", "preserve")
            .with_text(" PAGE "),
        fld_char("separate"),
        Element::new("w:t").with_text("1"),
        fld_char("end"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::DocxParser;
    use crate::test_support::{docx_bytes, paragraph_xml, png_logo};

    fn config() -> JournalConfig {
        JournalConfig {
            copyright_year: Some(2025),
            ..Default::default()
        }
    }

    #[test]
    fn footer_text_includes_doi_only_when_present() {
        let mut config = config();
        assert_eq!(
            footer_text(&config),
            "© 2025 EPRA IJMR | http://eprajournals.com/ | Journal DOI URL: https://doi.org/10.36713/epra2013 | Page "
        );
        config.doi_url = None;
        assert_eq!(
            footer_text(&config),
            "© 2025 EPRA IJMR | http://eprajournals.com/ | Page "
        );
    }

    #[test]
    fn logo_extent_keeps_aspect_ratio() {
        let logo = Logo::decode(&png_logo()).unwrap();
        assert_eq!(logo.dimensions(), (4, 2));
        assert_eq!(logo.extent(0.4), (365_760, 182_880));
    }

    #[test]
    fn undecodable_logo_is_an_input_error() {
        assert!(matches!(Logo::decode(b"GIF89a-not-really"), Err(Error::Input(_))));
        assert!(matches!(Logo::decode(&[]), Err(Error::Input(_))));
    }

    #[test]
    fn every_section_gets_its_own_masthead() {
        let body = format!(
            "{}{}{}",
            paragraph_xml("One"),
            r#"<w:p><w:pPr><w:sectPr><w:pgSz w:w="12240"/><w:pgMar w:left="1440" w:right="1440"/></w:sectPr></w:pPr></w:p>"#,
            paragraph_xml("Two"),
        );
        let mut doc = DocxParser::new().parse_bytes(&docx_bytes(&body)).unwrap();
        let logo = Logo::decode(&png_logo()).unwrap();
        let config = config();

        let count = MastheadInjector::new(&config).apply(&mut doc, &logo).unwrap();
        assert_eq!(count, 2);

        let mut refs = Vec::new();
        for section in doc.sections_mut() {
            let header = section.reference(HeaderFooterKind::Header).unwrap().to_string();
            let footer = section.reference(HeaderFooterKind::Footer).unwrap().to_string();
            refs.push((header, footer));
        }
        assert_ne!(refs[0].0, refs[1].0);
        assert_eq!(doc.sections_mut()[0].page_number_start(), Some(3));
        assert_eq!(doc.sections_mut()[1].page_number_start(), None);

        let header = doc.part_root(&refs[1].0).unwrap();
        let texts: Vec<_> = header
            .descendants()
            .into_iter()
            .filter(|el| el.is("w:t"))
            .map(|el| el.text_content())
            .collect();
        assert_eq!(texts, [config.line1.clone(), config.line2.clone(), config.line3.clone()]);
        let bottoms = header
            .descendants()
            .into_iter()
            .filter(|el| el.is("w:bottom") && el.attr("w:val") == Some("double"))
            .count();
        assert_eq!(bottoms, 2);

        let footer = doc.part_root(&refs[0].1).unwrap();
        let footer_para = Paragraph::from_element(footer.child("w:p").unwrap().clone());
        assert!(footer_para.text().starts_with("© 2025 EPRA IJMR"));
        assert!(footer_para.text().ends_with("Page 1"));
        let instr = footer
            .descendants()
            .into_iter()
            .find(|el| el.is("w:instrText"))
            .unwrap()
            .text_content();
        assert_eq!(instr.trim(), "PAGE");
    }

    #[test]
    fn header_links_the_logo_once_stored() {
        let mut doc = DocxParser::new()
            .parse_bytes(&docx_bytes(&paragraph_xml("x")))
            .unwrap();
        let logo = Logo::decode(&png_logo()).unwrap();
        MastheadInjector::new(&config()).apply(&mut doc, &logo).unwrap();

        let part = doc
            .owned_parts
            .iter()
            .find(|p| p.name.starts_with("word/header"))
            .unwrap();
        let image = part.rels.first_of_type(REL_IMAGE).unwrap();
        assert_eq!(image.target, "media/image1.png");
        assert!(doc.package().contains("word/media/image1.png"));
        assert!(doc.content_types.defaults.iter().any(|(ext, _)| ext == "png"));
    }

    #[test]
    fn logo_drawing_ids_follow_existing_drawings() {
        let body = format!(
            "{}{}",
            r#"<w:p><w:r><w:drawing><wp:inline><wp:extent cx="100" cy="100"/><wp:docPr id="1005" name="Picture 1005"/></wp:inline></w:drawing></w:r></w:p>"#,
            paragraph_xml("Text"),
        );
        let mut doc = DocxParser::new().parse_bytes(&docx_bytes(&body)).unwrap();
        assert_eq!(doc.max_drawing_id(), 1005);
        let logo = Logo::decode(&png_logo()).unwrap();
        MastheadInjector::new(&config()).apply(&mut doc, &logo).unwrap();

        let header = doc
            .owned_parts
            .iter()
            .find(|p| p.name.starts_with("word/header"))
            .unwrap();
        let ids: Vec<_> = header
            .root
            .descendants()
            .into_iter()
            .filter(|el| el.is("wp:docPr"))
            .filter_map(|el| el.attr("id"))
            .collect();
        assert_eq!(ids, ["1006"]);
        assert_eq!(doc.max_drawing_id(), 1006);
    }
}
