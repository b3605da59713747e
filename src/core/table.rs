// `w:tbl` view: alignment, first-row geometry and cell paragraphs.
use crate::core::paragraph::{Alignment, Paragraph};
use crate::core::schema::TBLPR_ORDER;
use crate::core::xml::{Element, Node};

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    element: Element,
}

impl Table {
    pub fn from_element(element: Element) -> Self {
        Self { element }
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

    pub fn alignment(&self) -> Option<Alignment> {
        match self.element.child("w:tblPr")?.child("w:jc")?.attr("w:val")? {
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "left" | "start" => Some(Alignment::Left),
            _ => None,
        }
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        if self.element.child("w:tblPr").is_none() {
            self.element
                .children
                .insert(0, Node::Element(Element::new("w:tblPr")));
        }
        if let Some(tbl_pr) = self.element.child_mut("w:tblPr") {
            tbl_pr
                .ensure_child("w:jc", TBLPR_ORDER)
                .set_attr("w:val", alignment.as_val());
        }
    }

    /// Widths of the first row's cells in twips; cells whose width is not
    /// an absolute measure report None.
    pub fn first_row_widths(&self) -> Vec<Option<u32>> {
        let Some(row) = self.element.child("w:tr") else {
            return Vec::new();
        };
        row.elements()
            .filter(|el| el.is("w:tc"))
            .map(|cell| {
                let width = cell.child("w:tcPr")?.child("w:tcW")?;
                match width.attr("w:type") {
                    None | Some("dxa") => width.attr("w:w")?.parse().ok(),
                    _ => None,
                }
            })
            .collect()
    }

    /// Sum of the known first-row widths, treating unknown widths as zero.
    pub fn first_row_width(&self) -> u32 {
        self.first_row_widths().into_iter().flatten().sum()
    }

    /// Plain text of every cell, rows separated by newlines.
    pub fn text(&self) -> String {
        self.element
            .elements()
            .filter(|el| el.is("w:tr"))
            .map(|row| {
                row.elements()
                    .filter(|el| el.is("w:tc"))
                    .map(|cell| {
                        cell.elements()
                            .filter(|el| el.is("w:p"))
                            .map(|p| Paragraph::from_element(p.clone()).text())
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Removes explicit run sizes from every paragraph in every cell,
    /// nested tables included. Returns the number of runs touched.
    pub fn clear_run_sizes(&mut self) -> usize {
        let mut paragraphs = Vec::new();
        self.element.find_all_mut("w:p", &mut paragraphs);
        let mut touched = 0;
        for p in paragraphs {
            let mut para = Paragraph::from_element(std::mem::take(p));
            for mut run in para.runs_mut() {
                run.clear_font_size();
                touched += 1;
            }
            *p = para.into_element();
        }
        touched
    }
}
