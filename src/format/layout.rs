//! Column layout, table centering and image rescaling.
use crate::config::LayoutMode;
use crate::core::document::{Block, Document};
use crate::core::paragraph::Alignment;
use crate::core::schema::inches_to_emu;
use crate::core::section::Section;
use crate::core::xml::Element;
use crate::error::{Error, Result};
use crate::format::classifier::ABSTRACT;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Widest inline picture allowed under the two-column layout.
pub const MAX_IMAGE_WIDTH_IN: f32 = 6.0;

/// Paragraphs between the ABSTRACT heading and the column break.
const BREAK_OFFSET: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutStats {
    pub mode: String,
    /// Block index of the paragraph closing the single-column part.
    pub column_break_at: Option<usize>,
    pub two_column_sections: usize,
    pub tables_centered: usize,
    pub tables_relaxed: usize,
    pub images_rescaled: usize,
}

pub struct LayoutEngine {
    mode: LayoutMode,
}

impl LayoutEngine {
    pub fn new(mode: LayoutMode) -> Self {
        Self { mode }
    }

    pub fn apply(&self, doc: &mut Document) -> Result<LayoutStats> {
        let mut stats = LayoutStats {
            mode: self.mode.to_string(),
            ..Default::default()
        };
        match self.mode {
            LayoutMode::FullPage => {}
            LayoutMode::ColumnsAfterAbstract => {
                stats.column_break_at = columns_after_abstract(doc);
            }
            LayoutMode::TwoColumn => {
                stats.two_column_sections = two_column_sections(doc);
                let (centered, relaxed) = center_tables(doc)?;
                stats.tables_centered = centered;
                stats.tables_relaxed = relaxed;
                stats.images_rescaled = rescale_images(doc, inches_to_emu(MAX_IMAGE_WIDTH_IN));
            }
        }
        info!("layout {}: {stats:?}", self.mode);
        Ok(stats)
    }
}

/// Ends a single-column section two paragraphs after the ABSTRACT heading
/// and switches the rest of that section to two columns. Returns the block
/// index of the paragraph carrying the new break.
pub fn columns_after_abstract(doc: &mut Document) -> Option<usize> {
    let paragraph_blocks: Vec<usize> = doc
        .blocks()
        .iter()
        .enumerate()
        .filter_map(|(index, block)| block.as_paragraph().map(|_| index))
        .collect();
    let Some(abstract_at) = paragraph_blocks.iter().position(|&index| {
        doc.blocks()[index]
            .as_paragraph()
            .map_or(false, |p| p.text().trim().to_uppercase() == ABSTRACT)
    }) else {
        warn!("no ABSTRACT heading, column break skipped");
        return None;
    };
    let target = paragraph_blocks[(abstract_at + BREAK_OFFSET).min(paragraph_blocks.len() - 1)];

    let section_index = doc.block_sections()[target];
    let already_break = doc.blocks()[target]
        .as_paragraph()
        .map_or(false, |p| p.section_properties().is_some());

    if !already_break {
        let mut single = doc.sections_mut()[section_index].properties().clone();
        {
            let mut section = Section::new(&mut single);
            section.set_columns(1);
        }
        if let Some(para) = doc.blocks_mut()[target].as_paragraph_mut() {
            para.set_section_properties(single);
        }
    }

    let mut sections = doc.sections_mut();
    if let Some(following) = sections.get_mut(section_index + 1) {
        following.set_columns(2);
        following.set_start_type("continuous");
        // Numbering restarts once, at the first section.
        following.clear_page_number_start();
    }
    debug!("column break after block {target}");
    Some(target)
}

/// Two columns in every section. Returns the number of sections.
pub fn two_column_sections(doc: &mut Document) -> usize {
    let mut sections = doc.sections_mut();
    for section in sections.iter_mut() {
        section.set_columns(2);
    }
    sections.len()
}

/// Centers every body table; tables wider than their section's usable width
/// lose explicit run sizes. Returns (centered, relaxed).
pub fn center_tables(doc: &mut Document) -> Result<(usize, usize)> {
    let usable: Vec<Option<u32>> = doc
        .sections_mut()
        .iter()
        .map(|s| s.usable_width().ok())
        .collect();
    let owners = doc.block_sections();

    let mut centered = 0;
    let mut relaxed = 0;
    for (block, section) in doc.blocks_mut().iter_mut().zip(owners) {
        let Block::Table(table) = block else {
            continue;
        };
        table.set_alignment(Alignment::Center);
        centered += 1;

        let width = table.first_row_width();
        if width == 0 {
            continue;
        }
        let limit = usable.get(section).copied().flatten().ok_or_else(|| {
            Error::structure(format!("section {} has no page geometry", section + 1))
        })?;
        if width > limit {
            let runs = table.clear_run_sizes();
            relaxed += 1;
            debug!("table {width} twips wide exceeds {limit}, cleared {runs} run size(s)");
        }
    }
    Ok((centered, relaxed))
}

/// Shrinks inline pictures wider than `max_cx` EMU, keeping their aspect
/// ratio. Returns the number of pictures changed.
pub fn rescale_images(doc: &mut Document, max_cx: u64) -> usize {
    let mut changed = 0;
    for block in doc.blocks_mut().iter_mut() {
        let mut inlines = Vec::new();
        block.element_mut().find_all_mut("wp:inline", &mut inlines);
        for inline in inlines {
            if rescale_inline(inline, max_cx) {
                changed += 1;
            }
        }
    }
    changed
}

fn extent_of(el: &Element) -> Option<(u64, u64)> {
    Some((el.attr("cx")?.parse().ok()?, el.attr("cy")?.parse().ok()?))
}

fn rescale_inline(inline: &mut Element, max_cx: u64) -> bool {
    let Some((cx, cy)) = inline.child("wp:extent").and_then(extent_of) else {
        return false;
    };
    if cx <= max_cx {
        return false;
    }
    let new_cy = ((cy as u128 * max_cx as u128 + cx as u128 / 2) / cx as u128) as u64;

    let resize = |el: &mut Element| {
        el.set_attr("cx", max_cx.to_string());
        el.set_attr("cy", new_cy.to_string());
    };
    if let Some(extent) = inline.child_mut("wp:extent") {
        resize(extent);
    }
    let mut shape_extents = Vec::new();
    inline.find_all_mut("a:ext", &mut shape_extents);
    // a:extLst entries are also named a:ext but carry no size.
    for extent in shape_extents.into_iter().filter(|el| el.attr("cx").is_some()) {
        resize(extent);
    }
    debug!("picture rescaled from {cx}x{cy} to {max_cx}x{new_cy} EMU");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parser::DocxParser;
    use crate::core::section::HeaderFooterKind;
    use crate::test_support::{docx_bytes, paragraph_xml};

    fn table_xml(widths: &[u32]) -> String {
        let cells: String = widths
            .iter()
            .map(|w| {
                format!(
                    r#"<w:tc><w:tcPr><w:tcW w:w="{w}" w:type="dxa"/></w:tcPr><w:p><w:r><w:rPr><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr><w:t>cell</w:t></w:r></w:p></w:tc>"#
                )
            })
            .collect();
        format!("<w:tbl><w:tblPr/><w:tr>{cells}</w:tr></w:tbl>")
    }

    fn picture_xml(cx: u64, cy: u64) -> String {
        format!(
            r#"<w:p><w:r><w:drawing><wp:inline><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="1" name="Picture 1"/><a:graphic><a:graphicData><pic:pic><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
        )
    }

    fn load(body: &str) -> Document {
        DocxParser::new().parse_bytes(&docx_bytes(body)).unwrap()
    }

    #[test]
    fn full_page_changes_nothing() {
        let mut doc = load(&paragraph_xml("ABSTRACT"));
        let before = doc.blocks().to_vec();
        let stats = LayoutEngine::new(LayoutMode::FullPage).apply(&mut doc).unwrap();
        assert_eq!(doc.blocks(), before.as_slice());
        assert_eq!(stats.mode, "full_page");
    }

    #[test]
    fn wide_table_loses_run_sizes_and_narrow_one_keeps_them() {
        let body = format!("{}{}", table_xml(&[6000, 6000]), table_xml(&[3000, 3000]));
        let mut doc = load(&body);
        let stats = LayoutEngine::new(LayoutMode::TwoColumn).apply(&mut doc).unwrap();
        assert_eq!(stats.tables_centered, 2);
        assert_eq!(stats.tables_relaxed, 1);

        let tables: Vec<_> = doc.tables().collect();
        assert!(!tables[0].element().to_xml().contains("w:sz "));
        assert!(!tables[0].element().to_xml().contains("w:szCs"));
        assert!(tables[1].element().to_xml().contains(r#"<w:sz w:val="24"/>"#));
        assert!(tables.iter().all(|t| t.alignment() == Some(Alignment::Center)));
    }

    #[test]
    fn table_width_is_checked_against_its_own_section() {
        // First section is wide (landscape-ish), the trailing one is letter.
        let body = format!(
            "{}{}{}",
            table_xml(&[10000]),
            r#"<w:p><w:pPr><w:sectPr><w:pgSz w:w="15840"/><w:pgMar w:left="720" w:right="720"/></w:sectPr></w:pPr></w:p>"#,
            table_xml(&[10000]),
        );
        let mut doc = load(&body);
        let (_, relaxed) = center_tables(&mut doc).unwrap();
        assert_eq!(relaxed, 1);
        let tables: Vec<_> = doc.tables().collect();
        assert!(tables[0].element().to_xml().contains("w:sz "));
        assert!(!tables[1].element().to_xml().contains("w:sz "));
    }

    #[test]
    fn missing_geometry_is_a_structure_error_only_when_needed() {
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            table_xml(&[4000])
        );
        let mut doc = DocxParser::new()
            .parse_bytes(&crate::test_support::docx_from_document_xml(&xml))
            .unwrap();
        assert!(matches!(center_tables(&mut doc), Err(Error::Structure(_))));

        let mut doc = load(&paragraph_xml("no tables"));
        assert_eq!(center_tables(&mut doc).unwrap(), (0, 0));
    }

    #[test]
    fn eight_by_four_inch_picture_becomes_six_by_three() {
        let inch = 914_400;
        let mut doc = load(&format!(
            "{}{}",
            picture_xml(8 * inch, 4 * inch),
            picture_xml(2 * inch, inch)
        ));
        assert_eq!(rescale_images(&mut doc, inches_to_emu(6.0)), 1);

        let xml = doc.blocks()[0].clone().into_element().to_xml();
        assert!(xml.contains(r#"<wp:extent cx="5486400" cy="2743200"/>"#));
        assert!(xml.contains(r#"<a:ext cx="5486400" cy="2743200"/>"#));
        let small = doc.blocks()[1].clone().into_element().to_xml();
        assert!(small.contains(r#"<wp:extent cx="1828800" cy="914400"/>"#));
    }

    #[test]
    fn two_column_reuses_existing_cols_node() {
        let mut doc = load(&paragraph_xml("x"));
        assert_eq!(two_column_sections(&mut doc), 1);
        let sections = doc.sections_mut();
        let cols: Vec<_> = sections[0]
            .properties()
            .elements()
            .filter(|el| el.is("w:cols"))
            .collect();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0].attr("w:num"), Some("2"));
        assert_eq!(cols[0].attr("w:space"), Some("720"));
    }

    #[test]
    fn column_break_lands_two_paragraphs_after_abstract() {
        let body: String = ["Title", "ABSTRACT", "Abstract text", "Keywords", "INTRODUCTION"]
            .iter()
            .map(|line| paragraph_xml(line))
            .collect();
        let mut doc = load(&body);
        doc.sections_mut()[0].set_page_number_start(3);
        doc.sections_mut()[0].set_reference(HeaderFooterKind::Header, "rId7");

        assert_eq!(columns_after_abstract(&mut doc), Some(3));
        assert_eq!(doc.section_count(), 2);
        let sections = doc.sections_mut();
        assert_eq!(sections[0].columns(), 1);
        assert_eq!(sections[0].page_number_start(), Some(3));
        assert_eq!(sections[0].reference(HeaderFooterKind::Header), Some("rId7"));
        assert_eq!(sections[1].columns(), 2);
        assert_eq!(sections[1].page_number_start(), None);
        let start = sections[1].properties().child("w:type").unwrap().attr("w:val");
        assert_eq!(start, Some("continuous"));
        assert_eq!(sections[1].usable_width().unwrap(), 9360);
    }

    #[test]
    fn column_break_is_clamped_to_last_paragraph() {
        let body = format!("{}{}", paragraph_xml("x"), paragraph_xml("Abstract"));
        let mut doc = load(&body);
        assert_eq!(columns_after_abstract(&mut doc), Some(1));
    }

    #[test]
    fn no_abstract_means_no_break() {
        let mut doc = load(&paragraph_xml("Just text"));
        assert_eq!(columns_after_abstract(&mut doc), None);
        assert_eq!(doc.section_count(), 1);
    }
}
