use crate::core::document::Document;
use crate::error::Result;
use log::debug;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writer is responsible for serializing a [`Document`] back into a .docx container.
pub trait Writer {
    /// Serialize `document` and write the package to `out_path`.
    fn write<P: AsRef<Path>>(&self, document: &Document, out_path: P) -> Result<()>;
}

/// DocxWriter: writes every package part back, replacing the main document,
/// relationships, content types and the parts created during formatting.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxWriter;

impl DocxWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn to_bytes(&self, document: &Document) -> Result<Vec<u8>> {
        let mut package = document.package.clone();

        package.set(
            &document.main_part,
            document.document_element().to_xml().into_bytes(),
        );
        document.rels.store(&mut package);
        for part in &document.owned_parts {
            package.set(&part.name, part.root.to_xml().into_bytes());
            if !part.rels.items.is_empty() {
                part.rels.store(&mut package);
            }
        }
        document.content_types.store(&mut package);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        // Consumers expect the content types entry first.
        let mut names: Vec<&str> = package.parts().map(|(name, _)| name).collect();
        names.sort_by_key(|name| *name != crate::core::package::CONTENT_TYPES_PART);
        for name in names {
            let data = package.get(name).unwrap_or_default();
            zip.start_file(name, options)?;
            zip.write_all(data)?;
        }
        let cursor = zip.finish()?;
        debug!("wrote package with {} parts", package.parts().count());
        Ok(cursor.into_inner())
    }
}

impl Writer for DocxWriter {
    fn write<P: AsRef<Path>>(&self, document: &Document, out_path: P) -> Result<()> {
        let bytes = self.to_bytes(document)?;
        std::fs::write(out_path.as_ref(), bytes)?;
        Ok(())
    }
}

impl Document {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        DocxWriter::new().to_bytes(self)
    }
}
