//! Title, author and affiliation lines ahead of the abstract.
use crate::core::document::{Block, Document};
use crate::core::paragraph::{Alignment, Paragraph};
use crate::BlockRole;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const CORRESPONDING_MARKER: &str = "corresponding author";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleAuthorBlock {
    pub title: String,
    pub authors: String,
    pub affiliations: Vec<String>,
    pub corresponding: String,
}

impl TitleAuthorBlock {
    /// Assigns roles to the non-empty lines found before the abstract:
    /// first the title, then the authors, then affiliations, with any line
    /// mentioning the corresponding author taken out (last one wins).
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut block = TitleAuthorBlock::default();
        for (index, line) in lines.into_iter().enumerate() {
            let line = line.into();
            match index {
                0 => block.title = line,
                1 => block.authors = line,
                _ if line.to_lowercase().contains(CORRESPONDING_MARKER) => {
                    block.corresponding = line
                }
                _ => block.affiliations.push(line),
            }
        }
        block
    }

    /// Reads the block from the top of the body, stopping at the first
    /// paragraph that starts with "abstract".
    pub fn extract(doc: &Document) -> Self {
        let lines: Vec<String> = doc
            .paragraphs()
            .map(|p| p.text().trim().to_string())
            .filter(|text| !text.is_empty())
            .take_while(|text| !text.to_lowercase().starts_with("abstract"))
            .collect();
        if lines.is_empty() {
            warn!("no title or author lines found before the abstract");
        }
        Self::from_lines(lines)
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.authors.is_empty()
            && self.affiliations.is_empty()
            && self.corresponding.is_empty()
    }

    /// Role of a paragraph whose trimmed text is `text`, if it belongs to the
    /// block. Matching is exact, so an empty field matches blank paragraphs.
    pub fn role_of(&self, text: &str) -> Option<BlockRole> {
        if text == self.title {
            Some(BlockRole::Title)
        } else if text == self.authors {
            Some(BlockRole::Author)
        } else if text == self.corresponding {
            Some(BlockRole::Corresponding)
        } else if self.affiliations.iter().any(|a| a == text) {
            Some(BlockRole::Affiliation)
        } else {
            None
        }
    }

    /// Paragraphs that open the rebuilt body.
    fn styled_paragraphs(&self) -> Vec<Paragraph> {
        let mut paragraphs = vec![
            styled(&self.title, "Georgia", 16.0, true),
            styled(&self.authors, "Times New Roman", 14.0, false),
            styled(&self.affiliations.join(" "), "Antiqua", 11.0, false),
        ];
        if !self.corresponding.is_empty() {
            paragraphs.push(styled(&self.corresponding, "Times New Roman", 10.0, true));
        }
        paragraphs
    }

    /// Drops every paragraph that repeats a line of the block and puts the
    /// restyled block at the top. Returns the number of paragraphs dropped.
    pub fn rebuild(&self, doc: &mut Document) -> usize {
        let mut kept: Vec<Block> = Vec::with_capacity(doc.blocks().len() + 4);
        kept.extend(self.styled_paragraphs().into_iter().map(Block::Paragraph));

        let mut removed = 0;
        for block in doc.blocks().iter() {
            let Block::Paragraph(para) = block else {
                kept.push(block.clone());
                continue;
            };
            let text = para.text();
            match self.role_of(text.trim()) {
                Some(role) => {
                    removed += 1;
                    debug!("dropping {role:?} line: {}", text.trim());
                    // Keep the section count stable.
                    if let Some(section_break) = para.section_break_only() {
                        kept.push(Block::Paragraph(section_break));
                    }
                }
                None => kept.push(block.clone()),
            }
        }

        doc.replace_blocks(kept);
        info!(
            "title block rebuilt: title={:?}, {} affiliation(s), {} paragraph(s) replaced",
            self.title,
            self.affiliations.len(),
            removed
        );
        removed
    }
}

fn styled(text: &str, font: &str, size: f32, bold: bool) -> Paragraph {
    let mut para = Paragraph::new();
    para.set_alignment(Alignment::Center);
    para.add_run(text)
        .set_font_name(font)
        .set_font_size(size)
        .set_bold(bold);
    para
}
