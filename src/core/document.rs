use crate::core::package::{
    rels_part_name, ContentTypes, Package, Relationships, CT_FOOTER, CT_HEADER, REL_FOOTER,
    REL_HEADER,
};
use crate::core::paragraph::Paragraph;
use crate::core::schema::{R_NS, W_NS};
use crate::core::section::{HeaderFooterKind, Section};
use crate::core::table::Table;
use crate::core::xml::{Element, Node};
use log::debug;

/// A top-level body node, in reading order.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Anything else found directly in `w:body` (content controls,
    /// bookmarks, ...). Carried through untouched.
    Other(Element),
}

impl Block {
    pub fn from_element(element: Element) -> Self {
        match element.name.as_str() {
            "w:p" => Block::Paragraph(Paragraph::from_element(element)),
            "w:tbl" => Block::Table(Table::from_element(element)),
            _ => Block::Other(element),
        }
    }

    pub fn into_element(self) -> Element {
        match self {
            Block::Paragraph(p) => p.into_element(),
            Block::Table(t) => t.into_element(),
            Block::Other(el) => el,
        }
    }

    pub fn element(&self) -> &Element {
        match self {
            Block::Paragraph(p) => p.element(),
            Block::Table(t) => t.element(),
            Block::Other(el) => el,
        }
    }

    pub fn element_mut(&mut self) -> &mut Element {
        match self {
            Block::Paragraph(p) => p.element_mut(),
            Block::Table(t) => t.element_mut(),
            Block::Other(el) => el,
        }
    }

    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(t) => Some(t),
            _ => None,
        }
    }
}

/// An XML part created while formatting (headers, footers) together with
/// its own relationships.
#[derive(Debug, Clone)]
pub(crate) struct OwnedPart {
    pub(crate) name: String,
    pub(crate) root: Element,
    pub(crate) rels: Relationships,
}

/// A loaded .docx: the main document tree split into body blocks and
/// sections, plus the surrounding package.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) package: Package,
    pub(crate) main_part: String,
    /// `w:document` with its `w:body` child taken out.
    pub(crate) root: Element,
    pub(crate) body_index: usize,
    /// `w:body` attributes, without children.
    pub(crate) body_shell: Element,
    pub(crate) blocks: Vec<Block>,
    /// Trailing body-level `w:sectPr`; always present after loading.
    pub(crate) final_section: Element,
    pub(crate) rels: Relationships,
    pub(crate) content_types: ContentTypes,
    pub(crate) owned_parts: Vec<OwnedPart>,
}

impl Document {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    /// Swaps in a complete new block list, returning the previous one.
    pub fn replace_blocks(&mut self, blocks: Vec<Block>) -> Vec<Block> {
        std::mem::replace(&mut self.blocks, blocks)
    }

    /// Body-level paragraphs (not those inside tables).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.blocks.iter_mut().filter_map(Block::as_paragraph_mut)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(Block::as_table)
    }

    pub fn section_count(&self) -> usize {
        self.paragraphs()
            .filter(|p| p.section_properties().is_some())
            .count()
            + 1
    }

    /// Sections in document order: one per paragraph-level section break,
    /// then the trailing body section.
    pub fn sections_mut(&mut self) -> Vec<Section<'_>> {
        let mut sections: Vec<Section<'_>> = self
            .blocks
            .iter_mut()
            .filter_map(|block| block.as_paragraph_mut()?.section_properties_mut())
            .map(Section::new)
            .collect();
        sections.push(Section::new(&mut self.final_section));
        sections
    }

    /// Index of the section each block belongs to.
    pub fn block_sections(&self) -> Vec<usize> {
        let mut section = 0;
        self.blocks
            .iter()
            .map(|block| {
                let current = section;
                let closes_section = block
                    .as_paragraph()
                    .map_or(false, |p| p.section_properties().is_some());
                if closes_section {
                    section += 1;
                }
                current
            })
            .collect()
    }

    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn relationships(&self) -> &Relationships {
        &self.rels
    }

    /// Root element of a header/footer part, whether it was loaded from the
    /// package or created during this run.
    pub fn part_root(&self, rel_id: &str) -> Option<Element> {
        let part = self.rels.target_part(rel_id)?;
        if let Some(owned) = self.owned_parts.iter().find(|p| p.name == part) {
            return Some(owned.root.clone());
        }
        let xml = self.package.get_str(&part).ok()??;
        Element::parse(&xml).ok()
    }

    /// Adds a fresh header or footer part and returns the relationship id
    /// the main document uses for it. `build` receives the new part's
    /// relationships so the content can reference images.
    pub fn add_header_footer_part<F>(&mut self, kind: HeaderFooterKind, build: F) -> String
    where
        F: FnOnce(&mut Relationships) -> Element,
    {
        let (prefix, rel_type, content_type) = match kind {
            HeaderFooterKind::Header => ("word/header", REL_HEADER, CT_HEADER),
            HeaderFooterKind::Footer => ("word/footer", REL_FOOTER, CT_FOOTER),
        };
        let name = self.free_part_name(prefix, "xml");
        let mut rels = Relationships {
            source_part: name.clone(),
            items: Vec::new(),
        };
        let root = build(&mut rels);
        self.content_types.set_override(&name, content_type);
        let rel_id = self.rels.add(rel_type, &name);
        debug!("added part {name} as {rel_id}");
        self.owned_parts.push(OwnedPart { name, root, rels });
        rel_id
    }

    /// Stores a binary part (e.g. an image) and registers the default
    /// content type for its extension.
    pub fn add_media(&mut self, data: Vec<u8>, extension: &str, content_type: &str) -> String {
        let name = self.free_part_name("word/media/image", extension);
        self.content_types.ensure_default(extension, content_type);
        self.package.set(&name, data);
        name
    }

    /// Largest `wp:docPr/@id` in the body, the parts created during this run
    /// and the other XML parts of the package; 0 when there are no drawings.
    pub fn max_drawing_id(&self) -> u32 {
        let in_tree = self
            .blocks
            .iter()
            .map(Block::element)
            .chain(self.owned_parts.iter().map(|p| &p.root))
            .flat_map(|el| el.descendants())
            .filter(|el| el.is("wp:docPr"))
            .filter_map(|el| el.attr("id")?.parse::<u32>().ok());

        let in_package = self
            .package
            .parts()
            .map(|(name, _)| name)
            .filter(|name| name.ends_with(".xml") && *name != self.main_part)
            .filter_map(|name| self.package.get_str(name).ok().flatten())
            .flat_map(|xml| drawing_ids(&xml));

        in_tree.chain(in_package).max().unwrap_or(0)
    }

    /// Part names are unique across the loaded package and the parts
    /// created during this run.
    fn free_part_name(&self, prefix: &str, ext: &str) -> String {
        (1..)
            .map(|n| format!("{prefix}{n}.{ext}"))
            .find(|candidate| {
                !self.package.contains(candidate)
                    && !self.owned_parts.iter().any(|p| p.name == *candidate)
            })
            .unwrap_or_default()
    }

    /// Drops a header/footer relationship, and its part, when no section
    /// refers to it anymore.
    pub fn remove_unreferenced_part(&mut self, rel_id: &str) -> bool {
        let still_used = self
            .sections_mut()
            .iter()
            .any(|s| s.all_references().iter().any(|id| id == rel_id));
        if still_used {
            return false;
        }
        let Some(part) = self.rels.target_part(rel_id) else {
            return false;
        };
        self.rels.remove(rel_id);
        self.owned_parts.retain(|p| p.name != part);
        self.package.remove(&part);
        self.package.remove(&rels_part_name(&part));
        self.content_types.remove_override(&part);
        debug!("removed orphaned part {part} ({rel_id})");
        true
    }

    /// Reassembles `w:document` with the current blocks and sections.
    pub(crate) fn document_element(&self) -> Element {
        let mut body = self.body_shell.clone();
        body.children = self
            .blocks
            .iter()
            .cloned()
            .map(|block| Node::Element(block.into_element()))
            .collect();
        body.push(self.final_section.clone());

        let mut root = self.root.clone();
        if root.attr("xmlns:w").is_none() {
            root.set_attr("xmlns:w", W_NS);
        }
        if root.attr("xmlns:r").is_none() {
            root.set_attr("xmlns:r", R_NS);
        }
        let index = self.body_index.min(root.children.len());
        root.children.insert(index, Node::Element(body));
        root
    }
}

fn drawing_ids(xml: &str) -> Vec<u32> {
    let Ok(doc) = roxmltree::Document::parse(xml) else {
        return Vec::new();
    };
    doc.descendants()
        .filter(|n| n.tag_name().name() == "docPr")
        .filter_map(|n| n.attribute("id")?.parse::<u32>().ok())
        .collect()
}
