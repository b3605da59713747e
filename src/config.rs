//! Journal configuration: masthead strings, layout choice and house style.

use crate::error::{Error, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "http://eprajournals.com/";

/// How the body is laid out after styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Single column throughout.
    #[default]
    FullPage,
    /// Single column up to shortly after the abstract, two columns after.
    ColumnsAfterAbstract,
    /// Every section in two columns, tables centered, wide images shrunk.
    TwoColumn,
}

impl LayoutMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LayoutMode::FullPage => "full_page",
            LayoutMode::ColumnsAfterAbstract => "columns_after_abstract",
            LayoutMode::TwoColumn => "two_column",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "full_page" => Ok(LayoutMode::FullPage),
            "columns_after_abstract" => Ok(LayoutMode::ColumnsAfterAbstract),
            "two_column" => Ok(LayoutMode::TwoColumn),
            other => Err(Error::input(format!("unknown layout mode '{other}'"))),
        }
    }
}

/// Fonts, sizes and colors used for body text and headings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleOptions {
    pub font_name: String,
    /// Body size in points.
    pub font_size: f32,
    pub heading_font_size: f32,
    /// Hex RGB, no leading '#'.
    pub heading_color: String,
    pub heading_bg_color: String,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            font_name: "Times New Roman".to_string(),
            font_size: 10.0,
            heading_font_size: 11.0,
            heading_color: "000000".to_string(),
            heading_bg_color: "D9D9D9".to_string(),
        }
    }
}

/// Per-field overrides applied on top of the house preset for `Custom`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleOverrides {
    pub font_name: Option<String>,
    pub font_size: Option<f32>,
    pub heading_font_size: Option<f32>,
    pub heading_color: Option<String>,
    pub heading_bg_color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JournalCode {
    #[default]
    #[serde(rename = "IJMR")]
    Ijmr,
    #[serde(rename = "EPRA")]
    Epra,
    Custom,
}

impl JournalCode {
    /// The preset a journal code starts from. IJMR and EPRA share the house style.
    pub fn style(self) -> StyleOptions {
        StyleOptions::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JournalConfig {
    pub line1: String,
    pub line2: String,
    pub line3: String,
    pub start_page_number: u32,
    pub doi_url: Option<String>,
    pub footer_journal: String,
    pub journal_code: JournalCode,
    pub base_url: String,
    /// Year printed in the footer; the current year when unset.
    pub copyright_year: Option<i32>,
    pub layout: LayoutMode,
    /// Run the emphasis-based heading pass after the main classification.
    pub refine_headings: bool,
    pub style: StyleOverrides,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            line1: "ISSN (Online): 2455-3662".to_string(),
            line2: "EPRA International Journal of Multidisciplinary Research (IJMR) - Peer Reviewed Journal".to_string(),
            line3: "Volume:11 | Issue:6 | June 2025 || Journal DOI: 10.36713/epra2013 || SJIF Impact Factor 2025: 8.691 || ISI Value: 1.188".to_string(),
            start_page_number: 3,
            doi_url: Some("https://doi.org/10.36713/epra2013".to_string()),
            footer_journal: "EPRA IJMR".to_string(),
            journal_code: JournalCode::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            copyright_year: None,
            layout: LayoutMode::default(),
            refine_headings: false,
            style: StyleOverrides::default(),
        }
    }
}

impl JournalConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: JournalConfig = toml::from_str(contents)
            .map_err(|e| Error::input(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start_page_number < 1 {
            return Err(Error::input("start_page_number must be at least 1"));
        }
        let style = self.style_options();
        if !(style.font_size > 0.0 && style.heading_font_size > 0.0) {
            return Err(Error::input("font sizes must be positive"));
        }
        for color in [&style.heading_color, &style.heading_bg_color] {
            if color.len() != 6 || !color.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::input(format!(
                    "color '{color}' is not a six digit hex value"
                )));
            }
        }
        Ok(())
    }

    /// Effective style for this journal.
    pub fn style_options(&self) -> StyleOptions {
        let mut style = self.journal_code.style();
        if self.journal_code != JournalCode::Custom {
            return style;
        }
        let o = &self.style;
        if let Some(v) = &o.font_name {
            style.font_name = v.clone();
        }
        if let Some(v) = o.font_size {
            style.font_size = v;
        }
        if let Some(v) = o.heading_font_size {
            style.heading_font_size = v;
        }
        if let Some(v) = &o.heading_color {
            style.heading_color = v.trim_start_matches('#').to_ascii_uppercase();
        }
        if let Some(v) = &o.heading_bg_color {
            style.heading_bg_color = v.trim_start_matches('#').to_ascii_uppercase();
        }
        style
    }

    /// DOI for the footer; blank values count as absent.
    pub fn doi(&self) -> Option<&str> {
        self.doi_url
            .as_deref()
            .map(str::trim)
            .filter(|doi| !doi.is_empty())
    }

    pub fn year(&self) -> i32 {
        self.copyright_year
            .unwrap_or_else(|| chrono::Local::now().year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_house_masthead() {
        let config = JournalConfig::default();
        assert_eq!(config.start_page_number, 3);
        assert_eq!(config.footer_journal, "EPRA IJMR");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.layout, LayoutMode::FullPage);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = JournalConfig::from_toml_str(
            r#"
            footer_journal = "EPRA IJRD"
            layout = "two_column"
            copyright_year = 2024
            "#,
        )
        .unwrap();
        assert_eq!(config.footer_journal, "EPRA IJRD");
        assert_eq!(config.layout, LayoutMode::TwoColumn);
        assert_eq!(config.year(), 2024);
        assert_eq!(config.line1, "ISSN (Online): 2455-3662");
    }

    #[test]
    fn test_zero_start_page_is_rejected() {
        let err = JournalConfig::from_toml_str("start_page_number = 0").unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(JournalConfig::from_toml_str("colour = \"red\"").is_err());
    }

    #[test]
    fn test_custom_overrides_only_apply_to_custom() {
        let toml = r##"
            journal_code = "Custom"
            [style]
            font_name = "Cambria"
            heading_bg_color = "#e6e6e6"
        "##;
        let config = JournalConfig::from_toml_str(toml).unwrap();
        let style = config.style_options();
        assert_eq!(style.font_name, "Cambria");
        assert_eq!(style.heading_bg_color, "E6E6E6");
        assert_eq!(style.font_size, 10.0);

        let ijmr = JournalConfig {
            journal_code: JournalCode::Ijmr,
            ..config
        };
        assert_eq!(ijmr.style_options(), StyleOptions::default());
    }

    #[test]
    fn test_blank_doi_is_absent() {
        let config = JournalConfig {
            doi_url: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.doi(), None);
    }

    #[test]
    fn test_layout_mode_parsing() {
        assert_eq!("two-column".parse::<LayoutMode>().unwrap(), LayoutMode::TwoColumn);
        assert_eq!(
            "columns_after_abstract".parse::<LayoutMode>().unwrap(),
            LayoutMode::ColumnsAfterAbstract
        );
        assert!("three".parse::<LayoutMode>().is_err());
    }
}
