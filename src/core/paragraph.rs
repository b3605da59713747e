// Typed views over `w:p` and `w:r` elements.
use crate::core::schema::{points_to_half_points, PPR_ORDER, RPR_ORDER, RUN_CONTAINERS};
use crate::core::xml::{Element, Node};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    fn from_val(val: &str) -> Option<Self> {
        match val {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "both" | "distribute" => Some(Alignment::Justify),
            _ => None,
        }
    }

    pub(crate) fn as_val(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Interprets an on/off property such as `<w:b/>` or `<w:b w:val="0"/>`.
fn toggle(el: &Element) -> bool {
    !matches!(el.attr("w:val"), Some("0" | "false" | "off"))
}

/// A body, cell, header or footer paragraph. Owns its `w:p` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    element: Element,
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Paragraph {
    pub fn new() -> Self {
        Self {
            element: Element::new("w:p"),
        }
    }

    pub fn from_element(element: Element) -> Self {
        Self { element }
    }

    /// Builds a paragraph holding a single run of `text`.
    pub fn with_text(text: &str) -> Self {
        let mut para = Self::new();
        para.add_run(text);
        para
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut Element {
        &mut self.element
    }

    pub fn into_element(self) -> Element {
        self.element
    }

    pub fn text(&self) -> String {
        self.runs().map(|run| run.text()).collect()
    }

    pub fn runs(&self) -> impl Iterator<Item = Run<'_>> {
        let mut out = Vec::new();
        collect_runs(&self.element, &mut out);
        out.into_iter().map(|element| Run { element })
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = RunMut<'_>> {
        let mut out = Vec::new();
        collect_runs_mut(&mut self.element, &mut out);
        out.into_iter().map(|element| RunMut { element })
    }

    pub fn has_runs(&self) -> bool {
        self.runs().next().is_some()
    }

    pub fn add_run(&mut self, text: &str) -> RunMut<'_> {
        let mut run = Element::new("w:r");
        if !text.is_empty() {
            run.push(text_element(text));
        }
        self.element.push(run);
        let Some(Node::Element(element)) = self.element.children.last_mut() else {
            unreachable!("run was just pushed");
        };
        RunMut { element }
    }

    /// First run of the paragraph, adding an empty one when there is none.
    pub fn first_run_mut(&mut self) -> RunMut<'_> {
        if !self.has_runs() {
            return self.add_run("");
        }
        self.runs_mut()
            .next()
            .unwrap_or_else(|| unreachable!("paragraph has runs"))
    }

    /// Replaces all content except paragraph properties with one plain run.
    pub fn set_text(&mut self, text: &str) {
        self.element
            .children
            .retain(|node| matches!(node, Node::Element(el) if el.is("w:pPr")));
        self.add_run(text);
    }

    pub fn alignment(&self) -> Option<Alignment> {
        self.element
            .child("w:pPr")?
            .child("w:jc")?
            .attr("w:val")
            .and_then(Alignment::from_val)
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.properties_mut()
            .ensure_child("w:jc", PPR_ORDER)
            .set_attr("w:val", alignment.as_val());
    }

    /// Paragraph shading; `fill` None leaves a clear, unfilled shade.
    pub fn set_shading(&mut self, fill: Option<&str>) {
        let mut shd = Element::new("w:shd")
            .with_attr("w:val", "clear")
            .with_attr("w:color", "auto");
        if let Some(fill) = fill {
            shd.set_attr("w:fill", fill);
        }
        self.properties_mut().set_child(shd, PPR_ORDER);
    }

    pub fn shading_fill(&self) -> Option<&str> {
        self.element.child("w:pPr")?.child("w:shd")?.attr("w:fill")
    }

    /// The section break this paragraph closes, if any.
    pub fn section_properties(&self) -> Option<&Element> {
        self.element.child("w:pPr")?.child("w:sectPr")
    }

    pub fn section_properties_mut(&mut self) -> Option<&mut Element> {
        self.element.child_mut("w:pPr")?.child_mut("w:sectPr")
    }

    pub fn set_section_properties(&mut self, sect_pr: Element) {
        self.properties_mut().set_child(sect_pr, PPR_ORDER);
    }

    /// Empty paragraph that only keeps this paragraph's section break.
    pub fn section_break_only(&self) -> Option<Paragraph> {
        let sect_pr = self.section_properties()?.clone();
        let mut para = Paragraph::new();
        para.set_section_properties(sect_pr);
        Some(para)
    }

    fn properties_mut(&mut self) -> &mut Element {
        let has_ppr = self.element.child("w:pPr").is_some();
        if !has_ppr {
            self.element
                .children
                .insert(0, Node::Element(Element::new("w:pPr")));
        }
        self.element
            .child_mut("w:pPr")
            .unwrap_or_else(|| unreachable!("w:pPr was just ensured"))
    }
}

fn text_element(text: &str) -> Element {
    Element::new("w:t")
        .with_attr("xml:space", "preserve")
        .with_text(text)
}

fn collect_runs<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
    for child in el.elements() {
        if child.is("w:r") {
            out.push(child);
        } else if RUN_CONTAINERS.contains(&child.name.as_str()) {
            collect_runs(child, out);
        }
    }
}

fn collect_runs_mut<'a>(el: &'a mut Element, out: &mut Vec<&'a mut Element>) {
    for node in el.children.iter_mut() {
        if let Node::Element(child) = node {
            if child.is("w:r") {
                out.push(child);
            } else if RUN_CONTAINERS.contains(&child.name.as_str()) {
                collect_runs_mut(child, out);
            }
        }
    }
}

/// Read-only view of a `w:r`.
#[derive(Debug, Clone, Copy)]
pub struct Run<'a> {
    element: &'a Element,
}

impl<'a> Run<'a> {
    pub fn text(&self) -> String {
        let mut text = String::new();
        for child in self.element.elements() {
            match child.name.as_str() {
                "w:t" => text.push_str(&child.text_content()),
                "w:tab" | "w:ptab" => text.push('\t'),
                "w:br" | "w:cr" => text.push('\n'),
                "w:noBreakHyphen" => text.push('-'),
                _ => {}
            }
        }
        text
    }

    fn property(&self, name: &str) -> Option<&'a Element> {
        self.element.child("w:rPr")?.child(name)
    }

    /// Explicit boldness; None when the run inherits it.
    pub fn bold(&self) -> Option<bool> {
        self.property("w:b").map(toggle)
    }

    /// Explicit size in points.
    pub fn font_size(&self) -> Option<f32> {
        self.property("w:sz")?
            .attr("w:val")?
            .parse::<f32>()
            .ok()
            .map(|half_points| half_points / 2.0)
    }

    pub fn font_name(&self) -> Option<&'a str> {
        self.property("w:rFonts")?.attr("w:ascii")
    }

    pub fn color(&self) -> Option<&'a str> {
        self.property("w:color")?.attr("w:val")
    }
}

/// Mutable view of a `w:r`.
#[derive(Debug)]
pub struct RunMut<'a> {
    element: &'a mut Element,
}

impl<'a> RunMut<'a> {
    fn properties(&mut self) -> &mut Element {
        if self.element.child("w:rPr").is_none() {
            self.element
                .children
                .insert(0, Node::Element(Element::new("w:rPr")));
        }
        self.element
            .child_mut("w:rPr")
            .unwrap_or_else(|| unreachable!("w:rPr was just ensured"))
    }

    pub fn set_bold(&mut self, bold: bool) -> &mut Self {
        let b = self.properties().ensure_child("w:b", RPR_ORDER);
        if bold {
            b.remove_attr("w:val");
        } else {
            b.set_attr("w:val", "0");
        }
        self
    }

    pub fn set_font_name(&mut self, name: &str) -> &mut Self {
        let fonts = self.properties().ensure_child("w:rFonts", RPR_ORDER);
        fonts.set_attr("w:ascii", name);
        fonts.set_attr("w:hAnsi", name);
        self
    }

    pub fn set_font_size(&mut self, points: f32) -> &mut Self {
        self.properties()
            .ensure_child("w:sz", RPR_ORDER)
            .set_attr("w:val", points_to_half_points(points).to_string());
        self
    }

    /// Drops the explicit size so the run falls back to its style.
    pub fn clear_font_size(&mut self) -> &mut Self {
        if let Some(rpr) = self.element.child_mut("w:rPr") {
            rpr.remove_children("w:sz");
            rpr.remove_children("w:szCs");
        }
        self
    }

    pub fn set_color(&mut self, hex: &str) -> &mut Self {
        self.properties()
            .ensure_child("w:color", RPR_ORDER)
            .set_attr("w:val", hex);
        self
    }

    pub fn append(&mut self, child: Element) -> &mut Self {
        self.element.push(child);
        self
    }
}
