//! Heading/body classification of the rebuilt body.
//!
//! Classification is a pure function of [`ParagraphFeatures`] and the
//! [`BodyPass`] state accumulated over the paragraphs seen so far; styling is
//! applied afterwards from the resulting [`Verdict`].

use crate::config::StyleOptions;
use crate::core::document::Document;
use crate::core::paragraph::{Alignment, Paragraph};
use crate::BlockRole;
use log::{debug, info};
use serde::{Deserialize, Serialize};

pub const ABSTRACT: &str = "ABSTRACT";
pub const REFERENCES: &str = "REFERENCES";

const MAX_HEADING_WORDS: usize = 6;
const MAX_EMPHASIS_WORDS: usize = 10;
const SECTION_HEADING_SIZE: f32 = 11.0;
const SUB_HEADING_SIZE: f32 = 10.0;

/// What the classifiers look at.
#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphFeatures {
    /// Trimmed paragraph text.
    pub text: String,
    pub alignment: Option<Alignment>,
    pub run_count: usize,
}

impl ParagraphFeatures {
    pub fn of(para: &Paragraph) -> Self {
        Self {
            text: para.text().trim().to_string(),
            alignment: para.alignment(),
            run_count: para.runs().count(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    fn upper(&self) -> String {
        self.text.to_uppercase()
    }
}

/// All cased characters uppercase, with at least one of them.
fn is_all_caps(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        cased |= c.is_uppercase();
    }
    cased
}

/// The all-caps heading test: non-empty, fully uppercase, at most six words.
pub fn is_heading(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && is_all_caps(text) && text.split_whitespace().count() <= MAX_HEADING_WORDS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    AbstractMarker,
    ReferencesMarker,
    Heading,
    /// Bibliography entry with its number.
    Reference(u32),
    Body,
    Unclassified,
}

impl Verdict {
    pub fn role(self) -> BlockRole {
        match self {
            Verdict::AbstractMarker | Verdict::ReferencesMarker | Verdict::Heading => {
                BlockRole::SectionHeading
            }
            Verdict::Reference(_) => BlockRole::Reference,
            Verdict::Body => BlockRole::Body,
            Verdict::Unclassified => BlockRole::Unclassified,
        }
    }
}

/// Accumulated state of the top-to-bottom pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyPass {
    pub found_abstract: bool,
    pub found_references: bool,
    pub next_reference: u32,
}

impl Default for BodyPass {
    fn default() -> Self {
        Self {
            found_abstract: false,
            found_references: false,
            next_reference: 1,
        }
    }
}

impl BodyPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// First matching rule wins.
    pub fn classify(&self, features: &ParagraphFeatures) -> Verdict {
        let upper = features.upper();
        let non_empty = !features.text.is_empty();
        if upper == ABSTRACT {
            Verdict::AbstractMarker
        } else if upper == REFERENCES {
            Verdict::ReferencesMarker
        } else if self.found_references && non_empty {
            Verdict::Reference(self.next_reference)
        } else if is_heading(&features.text) {
            Verdict::Heading
        } else if self.found_abstract && non_empty {
            Verdict::Body
        } else {
            Verdict::Unclassified
        }
    }

    /// State after a paragraph with `verdict` has been seen.
    pub fn advance(self, verdict: Verdict) -> Self {
        match verdict {
            Verdict::AbstractMarker => Self {
                found_abstract: true,
                ..self
            },
            Verdict::ReferencesMarker => Self {
                found_references: true,
                next_reference: 1,
                ..self
            },
            Verdict::Reference(n) => Self {
                next_reference: n + 1,
                ..self
            },
            _ => self,
        }
    }
}

/// Counts reported by one classification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationStats {
    pub abstract_markers: usize,
    pub references_markers: usize,
    pub headings: usize,
    pub references: usize,
    pub body: usize,
    pub unclassified: usize,
    /// Headings found by the emphasis pass, when it runs.
    pub section_headings: usize,
    pub sub_headings: usize,
}

pub struct BodyClassifier<'a> {
    style: &'a StyleOptions,
}

impl<'a> BodyClassifier<'a> {
    pub fn new(style: &'a StyleOptions) -> Self {
        Self { style }
    }

    /// Classifies and styles every body-level paragraph in reading order.
    pub fn apply(&self, doc: &mut Document) -> ClassificationStats {
        let mut stats = ClassificationStats::default();
        let mut pass = BodyPass::new();
        for para in doc.paragraphs_mut() {
            let features = ParagraphFeatures::of(para);
            let verdict = pass.classify(&features);
            debug!("{verdict:?}: {:?}", features.text);
            match verdict {
                Verdict::AbstractMarker => {
                    para.set_text(ABSTRACT);
                    self.heading_style(para, true);
                    stats.abstract_markers += 1;
                }
                Verdict::ReferencesMarker => {
                    para.set_text(REFERENCES);
                    self.heading_style(para, false);
                    stats.references_markers += 1;
                }
                Verdict::Heading => {
                    self.heading_style(para, false);
                    stats.headings += 1;
                }
                Verdict::Reference(n) => {
                    para.set_text(&format!("[{n}] {}", features.text));
                    self.body_style(para);
                    stats.references += 1;
                }
                Verdict::Body => {
                    self.body_style(para);
                    stats.body += 1;
                }
                Verdict::Unclassified => stats.unclassified += 1,
            }
            pass = pass.advance(verdict);
        }
        info!(
            "classified body: {} heading(s), {} reference(s), {} body paragraph(s)",
            stats.headings + stats.abstract_markers + stats.references_markers,
            stats.references,
            stats.body
        );
        stats
    }

    fn heading_style(&self, para: &mut Paragraph, shaded: bool) {
        para.set_alignment(Alignment::Center);
        if !para.has_runs() {
            para.add_run("");
        }
        for mut run in para.runs_mut() {
            run.set_font_name(&self.style.font_name)
                .set_font_size(self.style.heading_font_size)
                .set_bold(true)
                .set_color(&self.style.heading_color);
        }
        para.set_shading(shaded.then_some(self.style.heading_bg_color.as_str()));
    }

    fn body_style(&self, para: &mut Paragraph) {
        para.set_alignment(Alignment::Justify);
        for mut run in para.runs_mut() {
            run.set_font_name(&self.style.font_name)
                .set_font_size(self.style.font_size);
        }
    }

    /// Emphasis-based heading pass. Short emphasized paragraphs become
    /// section headings when centered and sub-headings otherwise; only the
    /// first run is restyled.
    pub fn refine_headings(&self, doc: &mut Document, stats: &mut ClassificationStats) {
        for para in doc.paragraphs_mut() {
            let features = ParagraphFeatures::of(para);
            let Some(role) = classify_emphasis(&features) else {
                continue;
            };
            let (alignment, size) = match role {
                BlockRole::SectionHeading => {
                    stats.section_headings += 1;
                    (Alignment::Center, SECTION_HEADING_SIZE)
                }
                _ => {
                    stats.sub_headings += 1;
                    (Alignment::Left, SUB_HEADING_SIZE)
                }
            };
            debug!("{role:?}: {:?}", features.text);
            para.set_alignment(alignment);
            para.first_run_mut()
                .set_font_name(&self.style.font_name)
                .set_font_size(size)
                .set_bold(true)
                .set_color(&self.style.heading_color);
        }
        info!(
            "emphasis pass: {} section heading(s), {} sub-heading(s)",
            stats.section_headings, stats.sub_headings
        );
    }
}

/// Secondary heading test used by the emphasis pass. Run boldness is not
/// consulted: every short paragraph counts as emphasized.
pub fn classify_emphasis(features: &ParagraphFeatures) -> Option<BlockRole> {
    if features.text.is_empty() || features.run_count == 0 {
        return None;
    }
    if features.text.to_lowercase().contains("corresponding author") {
        return None;
    }
    if !(1..=MAX_EMPHASIS_WORDS).contains(&features.word_count()) {
        return None;
    }
    match features.alignment {
        Some(Alignment::Center) => Some(BlockRole::SectionHeading),
        _ => Some(BlockRole::SubHeading),
    }
}
