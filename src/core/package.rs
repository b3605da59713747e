// Open Packaging Conventions plumbing: raw parts, relationships and
// content types of a .docx container.
use crate::core::xml::Element;
use crate::error::{Error, Result};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const CT_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const PR_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_HEADER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
pub const REL_FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub const CT_HEADER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
pub const CT_FOOTER: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml";

/// Every part of the zip container, in archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<(String, Vec<u8>)>,
}

impl Package {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn get_str(&self, name: &str) -> Result<Option<String>> {
        match self.get(name) {
            Some(bytes) => Ok(Some(String::from_utf8(strip_bom(bytes).to_vec())?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn set(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.parts.retain(|(n, _)| n != name);
    }

    pub fn parts(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts.iter().map(|(n, d)| (n.as_str(), d.as_slice()))
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Location of the relationships part that belongs to `part`.
pub fn rels_part_name(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolves a relationship target relative to the part that owns it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Relative target from `source_part` to a part living in the same directory.
fn relative_target(source_part: &str, part: &str) -> String {
    match source_part.rsplit_once('/') {
        Some((dir, _)) => part
            .strip_prefix(&format!("{dir}/"))
            .map(str::to_string)
            .unwrap_or_else(|| format!("/{part}")),
        None => part.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// The relationships of a single source part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    pub source_part: String,
    pub items: Vec<Relationship>,
}

impl Relationships {
    pub fn load(package: &Package, source_part: &str) -> Result<Self> {
        let mut rels = Relationships {
            source_part: source_part.to_string(),
            items: Vec::new(),
        };
        let Some(xml) = package.get_str(&rels_part_name(source_part))? else {
            return Ok(rels);
        };
        let doc = roxmltree::Document::parse(&xml)?;
        for node in doc
            .root_element()
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
        {
            let (Some(id), Some(rel_type), Some(target)) = (
                node.attribute("Id"),
                node.attribute("Type"),
                node.attribute("Target"),
            ) else {
                continue;
            };
            rels.items.push(Relationship {
                id: id.to_string(),
                rel_type: rel_type.to_string(),
                target: target.to_string(),
                external: node.attribute("TargetMode") == Some("External"),
            });
        }
        Ok(rels)
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|rel| rel.id == id)
    }

    /// Package part name a relationship points at (None for external targets).
    pub fn target_part(&self, id: &str) -> Option<String> {
        self.get(id)
            .filter(|rel| !rel.external)
            .map(|rel| resolve_target(&self.source_part, &rel.target))
    }

    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|rel| rel.rel_type == rel_type)
    }

    /// Adds an internal relationship to `part` and returns its fresh id.
    pub fn add(&mut self, rel_type: &str, part: &str) -> String {
        let id = (1..)
            .map(|n| format!("rId{n}"))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or_default();
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: relative_target(&self.source_part, part),
            external: false,
        });
        id
    }

    pub fn remove(&mut self, id: &str) {
        self.items.retain(|rel| rel.id != id);
    }

    pub fn store(&self, package: &mut Package) {
        let mut root = Element::new("Relationships").with_attr("xmlns", PR_NS);
        for rel in &self.items {
            let mut el = Element::new("Relationship")
                .with_attr("Id", rel.id.as_str())
                .with_attr("Type", rel.rel_type.as_str())
                .with_attr("Target", rel.target.as_str());
            if rel.external {
                el.set_attr("TargetMode", "External");
            }
            root.push(el);
        }
        package.set(&rels_part_name(&self.source_part), root.to_xml().into_bytes());
    }
}

/// `[Content_Types].xml`: extension defaults and per-part overrides.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    pub defaults: Vec<(String, String)>,
    pub overrides: Vec<(String, String)>,
}

impl ContentTypes {
    pub fn load(package: &Package) -> Result<Self> {
        let xml = package
            .get_str(CONTENT_TYPES_PART)?
            .ok_or_else(|| Error::input("package has no [Content_Types].xml"))?;
        let doc = roxmltree::Document::parse(&xml)?;
        let mut types = ContentTypes::default();
        for node in doc.root_element().children().filter(|n| n.is_element()) {
            match node.tag_name().name() {
                "Default" => {
                    if let (Some(ext), Some(ct)) =
                        (node.attribute("Extension"), node.attribute("ContentType"))
                    {
                        types.defaults.push((ext.to_ascii_lowercase(), ct.to_string()));
                    }
                }
                "Override" => {
                    if let (Some(part), Some(ct)) =
                        (node.attribute("PartName"), node.attribute("ContentType"))
                    {
                        let part = part.trim_start_matches('/').to_string();
                        types.overrides.push((part, ct.to_string()));
                    }
                }
                _ => {}
            }
        }
        Ok(types)
    }

    pub fn ensure_default(&mut self, extension: &str, content_type: &str) {
        let extension = extension.to_ascii_lowercase();
        if !self.defaults.iter().any(|(ext, _)| *ext == extension) {
            self.defaults.push((extension, content_type.to_string()));
        }
    }

    pub fn set_override(&mut self, part: &str, content_type: &str) {
        self.remove_override(part);
        self.overrides
            .push((part.to_string(), content_type.to_string()));
    }

    pub fn remove_override(&mut self, part: &str) {
        self.overrides.retain(|(p, _)| p != part);
    }

    pub fn store(&self, package: &mut Package) {
        let mut root = Element::new("Types").with_attr("xmlns", CT_NS);
        for (ext, ct) in &self.defaults {
            root.push(
                Element::new("Default")
                    .with_attr("Extension", ext.as_str())
                    .with_attr("ContentType", ct.as_str()),
            );
        }
        for (part, ct) in &self.overrides {
            root.push(
                Element::new("Override")
                    .with_attr("PartName", format!("/{part}"))
                    .with_attr("ContentType", ct.as_str()),
            );
        }
        package.set(CONTENT_TYPES_PART, root.to_xml().into_bytes());
    }
}
