// `w:sectPr` view: page geometry, columns, header/footer references.
use crate::core::schema::SECTPR_ORDER;
use crate::core::xml::{Element, Node};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFooterKind {
    Header,
    Footer,
}

impl HeaderFooterKind {
    fn reference_name(self) -> &'static str {
        match self {
            HeaderFooterKind::Header => "w:headerReference",
            HeaderFooterKind::Footer => "w:footerReference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: u32,
    pub left_margin: u32,
    pub right_margin: u32,
}

impl PageGeometry {
    /// Page width minus left and right margins, in twips.
    pub fn usable_width(&self) -> u32 {
        self.width
            .saturating_sub(self.left_margin)
            .saturating_sub(self.right_margin)
    }
}

fn twips_attr(el: &Element, key: &str) -> Option<u32> {
    // Some producers write fractional or signed measures.
    el.attr(key)?.parse::<f64>().ok().map(|v| v.max(0.0) as u32)
}

pub struct Section<'a> {
    props: &'a mut Element,
}

impl<'a> Section<'a> {
    pub fn new(props: &'a mut Element) -> Self {
        Self { props }
    }

    pub fn properties(&self) -> &Element {
        &*self.props
    }

    pub fn geometry(&self) -> Result<PageGeometry> {
        let width = self
            .props
            .child("w:pgSz")
            .and_then(|sz| twips_attr(sz, "w:w"))
            .ok_or_else(|| Error::structure("section has no page width (w:pgSz)"))?;
        let margins = self
            .props
            .child("w:pgMar")
            .ok_or_else(|| Error::structure("section has no page margins (w:pgMar)"))?;
        let left_margin = twips_attr(margins, "w:left")
            .or_else(|| twips_attr(margins, "w:start"))
            .ok_or_else(|| Error::structure("section has no left margin"))?;
        let right_margin = twips_attr(margins, "w:right")
            .or_else(|| twips_attr(margins, "w:end"))
            .ok_or_else(|| Error::structure("section has no right margin"))?;
        Ok(PageGeometry {
            width,
            left_margin,
            right_margin,
        })
    }

    pub fn usable_width(&self) -> Result<u32> {
        self.geometry().map(|g| g.usable_width())
    }

    pub fn columns(&self) -> u32 {
        self.props
            .child("w:cols")
            .and_then(|cols| cols.attr("w:num"))
            .and_then(|num| num.parse().ok())
            .unwrap_or(1)
    }

    pub fn set_columns(&mut self, count: u32) {
        self.props
            .ensure_child("w:cols", SECTPR_ORDER)
            .set_attr("w:num", count.to_string());
    }

    /// How the section starts relative to the previous one, e.g. `continuous`.
    pub fn set_start_type(&mut self, start: &str) {
        self.props
            .ensure_child("w:type", SECTPR_ORDER)
            .set_attr("w:val", start);
    }

    pub fn page_number_start(&self) -> Option<u32> {
        self.props
            .child("w:pgNumType")?
            .attr("w:start")?
            .parse()
            .ok()
    }

    pub fn set_page_number_start(&mut self, start: u32) {
        self.props
            .ensure_child("w:pgNumType", SECTPR_ORDER)
            .set_attr("w:start", start.to_string());
    }

    pub fn clear_page_number_start(&mut self) {
        if let Some(pg_num) = self.props.child_mut("w:pgNumType") {
            pg_num.remove_attr("w:start");
        }
    }

    /// Relationship id of the default header or footer; None means the
    /// section is linked to the previous one.
    pub fn reference(&self, kind: HeaderFooterKind) -> Option<&str> {
        self.props
            .elements()
            .filter(|el| el.is(kind.reference_name()))
            .find(|el| el.attr("w:type").unwrap_or("default") == "default")
            .and_then(|el| el.attr("r:id"))
    }

    /// Points the default header or footer at `rel_id`, unlinking the
    /// section from its predecessor.
    pub fn set_reference(&mut self, kind: HeaderFooterKind, rel_id: &str) {
        let name = kind.reference_name();
        self.props.children.retain(|node| {
            !matches!(node, Node::Element(el)
                if el.is(name) && el.attr("w:type").unwrap_or("default") == "default")
        });
        let reference = Element::new(name)
            .with_attr("w:type", "default")
            .with_attr("r:id", rel_id);
        // References go ahead of everything else; headers before footers.
        let index = self
            .props
            .children
            .iter()
            .position(|node| match node {
                Node::Element(el) => match kind {
                    HeaderFooterKind::Header => true,
                    HeaderFooterKind::Footer => !el.is("w:headerReference"),
                },
                _ => false,
            })
            .unwrap_or(self.props.children.len());
        self.props.children.insert(index, Node::Element(reference));
    }

    /// Relationship ids of every header/footer reference, any type.
    pub fn all_references(&self) -> Vec<String> {
        self.props
            .elements()
            .filter(|el| el.is("w:headerReference") || el.is("w:footerReference"))
            .filter_map(|el| el.attr("r:id").map(str::to_string))
            .collect()
    }
}
