use crate::config::{JournalConfig, StyleOptions};
use crate::core::document::Document;
use crate::error::{Error, Result};
use crate::format::classifier::{BodyClassifier, ClassificationStats};
use crate::format::layout::{LayoutEngine, LayoutStats};
use crate::format::masthead::{Logo, MastheadInjector};
use crate::format::title_block::TitleAuthorBlock;
use crate::render::{Renderer, SofficeRenderer};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Summary of one formatting run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatReport {
    pub title_block: TitleAuthorBlock,
    pub sections_mastheaded: usize,
    pub title_lines_replaced: usize,
    pub classification: ClassificationStats,
    pub layout: LayoutStats,
}

/// A formatted document still in memory.
#[derive(Debug, Clone)]
pub struct FormattedDocument {
    pub document: Document,
    pub report: FormatReport,
}

impl FormattedDocument {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.document.to_bytes()
    }
}

/// Where the results of [`DocumentProcessor::process`] ended up.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub document: PathBuf,
    /// Present only when rendering succeeded.
    pub pdf: Option<PathBuf>,
    pub report: FormatReport,
}

pub struct DocumentProcessor {
    config: JournalConfig,
    style: StyleOptions,
    renderer: Option<Box<dyn Renderer + Send + Sync>>,
}

impl DocumentProcessor {
    pub fn new(config: JournalConfig) -> Result<Self> {
        config.validate()?;
        let style = config.style_options();
        Ok(Self {
            config,
            style,
            renderer: Some(Box::new(SofficeRenderer::new())),
        })
    }

    pub fn with_renderer<R>(mut self, renderer: R) -> Self
    where
        R: Renderer + Send + Sync + 'static,
    {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// Skip the PDF step entirely.
    pub fn without_renderer(mut self) -> Self {
        self.renderer = None;
        self
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    /// Runs every formatting pass in memory.
    pub fn format(&self, document: &[u8], logo: &[u8]) -> Result<FormattedDocument> {
        if document.is_empty() {
            return Err(Error::input("document is empty"));
        }
        if logo.is_empty() {
            return Err(Error::input("logo image is empty"));
        }
        let logo = Logo::decode(logo)?;
        let mut doc = Document::from_bytes(document)?;
        info!(
            "loaded document: {} block(s), {} section(s)",
            doc.blocks().len(),
            doc.section_count()
        );

        let mut report = FormatReport::default();
        report.sections_mastheaded = MastheadInjector::new(&self.config).apply(&mut doc, &logo)?;

        let block = TitleAuthorBlock::extract(&doc);
        report.title_lines_replaced = block.rebuild(&mut doc);
        report.title_block = block;

        let classifier = BodyClassifier::new(&self.style);
        report.classification = classifier.apply(&mut doc);
        if self.config.refine_headings {
            classifier.refine_headings(&mut doc, &mut report.classification);
        }

        report.layout = LayoutEngine::new(self.config.layout).apply(&mut doc)?;
        Ok(FormattedDocument {
            document: doc,
            report,
        })
    }

    /// Formats, renders from a scratch directory and writes the result to
    /// `output`. A PDF, when rendering succeeds, lands next to it.
    pub fn process<P: AsRef<Path>>(&self, document: &[u8], logo: &[u8], output: P) -> Result<Outcome> {
        let output = output.as_ref();
        let formatted = self.format(document, logo)?;
        let bytes = formatted.to_bytes()?;

        let scratch = tempfile::Builder::new()
            .prefix("journal-format-")
            .tempdir()?;
        let file_name = output
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("formatted.docx"));
        let scratch_doc = scratch.path().join(file_name);
        fs::write(&scratch_doc, &bytes)?;
        debug!("scratch copy at {}", scratch_doc.display());

        let rendered = match &self.renderer {
            Some(renderer) => match renderer.render(&scratch_doc, scratch.path()) {
                Ok(pdf) => Some(pdf),
                Err(e) => {
                    warn!("rendering skipped: {e}");
                    None
                }
            },
            None => None,
        };

        persist(&bytes, output)?;
        let pdf = rendered.and_then(|rendered| {
            let target = output.with_extension("pdf");
            match fs::copy(&rendered, &target) {
                Ok(_) => Some(target),
                Err(e) => {
                    warn!("rendered PDF not copied to {}: {e}", target.display());
                    None
                }
            }
        });
        info!("formatted document written to {}", output.display());

        Ok(Outcome {
            document: output.to_path_buf(),
            pdf,
            report: formatted.report,
        })
    }

    pub fn process_file<P1, P2, P3>(&self, document: P1, logo: P2, output: P3) -> Result<Outcome>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let document = fs::read(document.as_ref())?;
        let logo = fs::read(logo.as_ref())?;
        self.process(&document, &logo, output)
    }
}

/// Writes `bytes` to `target` through a temporary file in the same directory.
fn persist(bytes: &[u8], target: &Path) -> Result<()> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = NamedTempFile::new_in(&dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
