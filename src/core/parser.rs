use crate::core::document::{Block, Document};
use crate::core::package::{resolve_target, ContentTypes, Package, Relationships, REL_OFFICE_DOCUMENT};
use crate::core::xml::{Element, Node};
use crate::error::{Error, Result};
use log::debug;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

const DEFAULT_MAIN_PART: &str = "word/document.xml";

pub trait Parser {
    /// Load a .docx from disk into a mutable [`Document`].
    fn parse<P: AsRef<Path>>(&self, path: P) -> Result<Document>;
}

/// DocxParser: unpacks the zip container and splits `word/document.xml`
/// into typed body blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Document> {
        if bytes.is_empty() {
            return Err(Error::input("document is empty"));
        }
        let package = self.read_package(bytes)?;
        self.build_document(package)
    }

    fn read_package(&self, bytes: &[u8]) -> Result<Package> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut package = Package::new();
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            package.set(file.name(), data);
        }
        debug!("read {} parts from package", archive.len());
        Ok(package)
    }

    fn build_document(&self, package: Package) -> Result<Document> {
        let content_types = ContentTypes::load(&package)?;
        let package_rels = Relationships::load(&package, "")?;
        let main_part = package_rels
            .first_of_type(REL_OFFICE_DOCUMENT)
            .map(|rel| resolve_target("", &rel.target))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());
        debug!("main document part: {main_part}");

        let xml = package
            .get_str(&main_part)?
            .ok_or_else(|| Error::input(format!("package has no {main_part}")))?;
        let mut root = Element::parse(&xml)?;
        if !root.is("w:document") {
            return Err(Error::structure(format!(
                "main part root is <{}>, expected <w:document>",
                root.name
            )));
        }

        let body_index = root
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(el) if el.is("w:body")))
            .ok_or_else(|| Error::structure("document has no w:body"))?;
        let Node::Element(mut body) = root.children.remove(body_index) else {
            return Err(Error::structure("document has no w:body"));
        };

        let mut final_section = None;
        let mut blocks = Vec::new();
        for node in std::mem::take(&mut body.children) {
            match node {
                Node::Element(el) if el.is("w:sectPr") => final_section = Some(el),
                Node::Element(el) => blocks.push(Block::from_element(el)),
                // Inter-element whitespace carries no content.
                _ => {}
            }
        }

        let rels = Relationships::load(&package, &main_part)?;
        Ok(Document {
            package,
            main_part,
            root,
            body_index,
            body_shell: body,
            blocks,
            final_section: final_section.unwrap_or_else(|| Element::new("w:sectPr")),
            rels,
            content_types,
            owned_parts: Vec::new(),
        })
    }
}

impl Parser for DocxParser {
    fn parse<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let bytes = std::fs::read(path.as_ref())?;
        self.parse_bytes(&bytes)
    }
}

impl Document {
    pub fn from_bytes(bytes: &[u8]) -> Result<Document> {
        DocxParser::new().parse_bytes(bytes)
    }
}
