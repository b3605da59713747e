// Owned, mutable XML element tree for WordprocessingML parts.
//
// Parts are read with quick-xml into `Element`s and written back verbatim,
// so nodes the formatter does not understand survive a round trip.
use crate::error::{Error, Result};
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Qualified name as written in the part, e.g. `w:p`.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attributes.retain(|(k, _)| k != key);
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.is(name))
    }

    /// Depth-first, document-order walk over every descendant element.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_descendants(self, &mut out);
        out
    }

    /// Mutable counterpart of [`Element::descendants`] restricted to one name.
    /// Matching elements are not searched further.
    pub fn find_all_mut<'a>(&'a mut self, name: &str, out: &mut Vec<&'a mut Element>) {
        for node in self.children.iter_mut() {
            if let Node::Element(el) = node {
                if el.name == name {
                    out.push(el);
                } else {
                    el.find_all_mut(name, out);
                }
            }
        }
    }

    pub fn remove_children(&mut self, name: &str) {
        self.children
            .retain(|node| !matches!(node, Node::Element(el) if el.name == name));
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Returns the named child, inserting an empty one at the position the
    /// schema sequence `order` dictates when it is missing.
    pub fn ensure_child(&mut self, name: &str, order: &[&str]) -> &mut Element {
        let position = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(el) if el.name == name));
        let index = match position {
            Some(index) => index,
            None => {
                let index = self.insertion_index(name, order);
                self.children.insert(index, Node::Element(Element::new(name)));
                index
            }
        };
        match &mut self.children[index] {
            Node::Element(el) => el,
            _ => unreachable!("index points at an element"),
        }
    }

    /// Replaces (or inserts, in schema order) the named child.
    pub fn set_child(&mut self, child: Element, order: &[&str]) {
        let name = child.name.clone();
        *self.ensure_child(&name, order) = child;
    }

    fn insertion_index(&self, name: &str, order: &[&str]) -> usize {
        let Some(rank) = order.iter().position(|n| *n == name) else {
            return self.children.len();
        };
        self.children
            .iter()
            .position(|node| match node {
                Node::Element(el) => order
                    .iter()
                    .position(|n| *n == el.name)
                    .map_or(false, |other| other > rank),
                _ => false,
            })
            .unwrap_or(self.children.len())
    }

    /// Concatenated character data of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        for node in &self.children {
            match node {
                Node::Text(t) | Node::CData(t) => text.push_str(t),
                Node::Element(el) => text.push_str(&el.text_content()),
                Node::Comment(_) => {}
            }
        }
        text
    }

    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(false);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => stack.push(start_element(&e)?),
                Event::Empty(e) => {
                    let el = start_element(&e)?;
                    attach(&mut stack, &mut root, Node::Element(el));
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| Error::Input("unbalanced closing tag".to_string()))?;
                    attach(&mut stack, &mut root, Node::Element(el));
                }
                Event::Text(e) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(Node::Text(e.unescape()?.into_owned()));
                    }
                }
                Event::CData(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        parent.children.push(Node::CData(text));
                    }
                }
                Event::Comment(e) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        parent.children.push(Node::Comment(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::Input(format!(
                "unclosed element <{}>",
                stack.last().map(|el| el.name.as_str()).unwrap_or_default()
            )));
        }
        root.ok_or_else(|| Error::Input("XML part has no root element".to_string()))
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        write_element(self, &mut out);
        out
    }
}

fn collect_descendants<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    for child in el.elements() {
        out.push(child);
        collect_descendants(child, out);
    }
}

fn start_element(e: &quick_xml::events::BytesStart) -> Result<Element> {
    let mut el = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::Input(format!("bad attribute: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => {
            if let Node::Element(el) = node {
                *root = Some(el);
            }
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (key, value) in &el.attributes {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    if el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            Node::Element(c) => write_element(c, out),
            Node::Text(t) => out.push_str(&escape(t.as_str())),
            Node::CData(t) => {
                out.push_str("<![CDATA[");
                out.push_str(t);
                out.push_str("]]>");
            }
            Node::Comment(t) => {
                out.push_str("<!--");
                out.push_str(t);
                out.push_str("-->");
            }
        }
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_writes_back_unknown_markup() {
        let xml = r#"<w:body xmlns:w="urn:w"><w:p><w:r><w:t xml:space="preserve"> a &amp; b </w:t></w:r></w:p><w:bookmarkStart w:id="0"/></w:body>"#;
        let el = Element::parse(xml).unwrap();
        assert_eq!(el.name, "w:body");
        assert_eq!(el.text_content(), " a & b ");

        let written = el.to_xml();
        assert!(written.contains(r#"<w:bookmarkStart w:id="0"/>"#));
        assert!(written.contains(" a &amp; b "));
        assert_eq!(Element::parse(&written).unwrap(), el);
    }

    #[test]
    fn ensure_child_respects_schema_order() {
        let order = ["w:rFonts", "w:b", "w:color", "w:sz"];
        let mut rpr = Element::new("w:rPr").with_child(Element::new("w:sz"));
        rpr.ensure_child("w:b", &order);
        rpr.ensure_child("w:rFonts", &order);
        rpr.ensure_child("w:color", &order);
        let names: Vec<_> = rpr.elements().map(|el| el.name.as_str()).collect();
        assert_eq!(names, ["w:rFonts", "w:b", "w:color", "w:sz"]);
    }

    #[test]
    fn rejects_truncated_xml() {
        assert!(matches!(
            Element::parse("<w:document><w:body>"),
            Err(Error::Input(_))
        ));
    }
}
