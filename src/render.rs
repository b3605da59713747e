//! PDF rendering through an external office suite.
use crate::error::{Error, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Produces a fixed-page artifact for a saved document.
pub trait Renderer {
    /// Renders `document` into `out_dir` and returns the artifact path.
    fn render(&self, document: &Path, out_dir: &Path) -> Result<PathBuf>;
}

/// Runs `soffice --headless --convert-to pdf`.
#[derive(Debug, Clone)]
pub struct SofficeRenderer {
    program: PathBuf,
}

impl Default for SofficeRenderer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("soffice"),
        }
    }
}

impl SofficeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Renderer for SofficeRenderer {
    fn render(&self, document: &Path, out_dir: &Path) -> Result<PathBuf> {
        debug!("running {} on {}", self.program.display(), document.display());
        let output = Command::new(&self.program)
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(out_dir)
            .arg(document)
            .output()
            .map_err(|e| Error::Render(format!("cannot start {}: {e}", self.program.display())))?;

        if !output.status.success() {
            return Err(Error::Render(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stem = document
            .file_stem()
            .ok_or_else(|| Error::Render(format!("{} has no file name", document.display())))?;
        let pdf = out_dir.join(stem).with_extension("pdf");
        if !pdf.is_file() {
            return Err(Error::Render(format!(
                "renderer reported success but {} is missing",
                pdf.display()
            )));
        }
        info!("rendered {}", pdf.display());
        Ok(pdf)
    }
}
