//! Shopping list document: page layout and PDF output.
//!
//! Layout is computed in PDF points without touching `printpdf`, so page
//! breaks can be checked directly. [`render_pdf`] then writes the laid out
//! pages.

use crate::error::DocumentError;
use crate::shopping_list::ShoppingList;
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, Point,
};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const TITLE_FONT_SIZE: f32 = 16.0;
pub const BODY_FONT_SIZE: f32 = 12.0;

/// Recipe names longer than this are cut and end in [`ELLIPSIS`].
pub const RECIPE_NAME_LIMIT: usize = 40;
pub const ELLIPSIS: &str = "...";

pub const DOCUMENT_TITLE: &str = "Shopping list";

/// Page dimensions and vertical budget, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub left_margin: f32,
    pub top: f32,
    pub bottom_margin: f32,
    pub line_height: f32,
    pub divider_end: f32,
}

impl Default for PageGeometry {
    /// A4 portrait.
    fn default() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
            left_margin: 50.0,
            top: 750.0,
            bottom_margin: 50.0,
            line_height: 20.0,
            divider_end: 550.0,
        }
    }
}

impl PageGeometry {
    /// How many lines fit between the top and the bottom margin.
    pub fn lines_per_page(&self) -> usize {
        ((self.top - self.bottom_margin) / self.line_height) as usize + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// Drawn once, in the title font, at the top of the first page.
    Title(String),
    Text(String),
    Divider,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub y: f32,
    pub element: Element,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Placed>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All text lines in drawing order, across pages.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|page| page.elements.iter())
            .filter_map(|placed| match &placed.element {
                Element::Title(text) | Element::Text(text) => Some(text.as_str()),
                Element::Divider => None,
            })
    }
}

struct Cursor {
    geometry: PageGeometry,
    pages: Vec<Page>,
    y: f32,
}

impl Cursor {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            y: geometry.top,
        }
    }

    fn place(&mut self, element: Element) {
        if self.y < self.geometry.bottom_margin {
            self.pages.push(Page::default());
            self.y = self.geometry.top;
        }
        let y = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(Placed { y, element });
        }
        self.y -= self.geometry.line_height;
    }

    fn skip_line(&mut self) {
        self.y -= self.geometry.line_height;
    }

    fn finish(self) -> Layout {
        Layout {
            geometry: self.geometry,
            pages: self.pages,
        }
    }
}

pub fn truncate_name(name: &str, limit: usize) -> String {
    if name.chars().count() <= limit {
        return name.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut truncated: String = name.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Lay out a shopping list: title, numbered recipes, divider, bulleted
/// ingredients, divider, summary.
pub fn layout_shopping_list(title: &str, list: &ShoppingList, geometry: PageGeometry) -> Layout {
    let mut cursor = Cursor::new(geometry);

    cursor.place(Element::Title(title.to_string()));
    cursor.skip_line();

    cursor.place(Element::Text("Recipes:".to_string()));
    for (index, name) in list.recipes.iter().enumerate() {
        cursor.place(Element::Text(format!(
            "{}. {}",
            index + 1,
            truncate_name(name, RECIPE_NAME_LIMIT)
        )));
    }

    cursor.place(Element::Divider);
    cursor.place(Element::Text("Ingredients:".to_string()));
    for item in &list.items {
        cursor.place(Element::Text(format!(
            "- {} - {} {}",
            item.name, item.amount, item.unit
        )));
    }

    cursor.place(Element::Divider);
    cursor.place(Element::Text(format!("Total items: {}", list.item_count())));
    cursor.skip_line();
    cursor.place(Element::Text("Happy shopping!".to_string()));

    cursor.finish()
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// Load the TTF at `path`, falling back to built-in Helvetica on any failure.
fn load_font(
    doc: &PdfDocumentReference,
    path: Option<&Path>,
) -> Result<IndirectFontRef, DocumentError> {
    if let Some(path) = path {
        let loaded = File::open(path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                doc.add_external_font(BufReader::new(file))
                    .map_err(|e| format!("{e:?}"))
            });
        match loaded {
            Ok(font) => return Ok(font),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to load document font, falling back to Helvetica"
            ),
        }
    }

    doc.add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| DocumentError::Pdf(format!("{e:?}")))
}

/// Write a laid out document as PDF bytes.
pub fn render_pdf(
    layout: &Layout,
    title: &str,
    font_path: Option<&Path>,
) -> Result<Vec<u8>, DocumentError> {
    if layout.pages.is_empty() {
        return Err(DocumentError::Empty);
    }

    let geometry = layout.geometry;
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        mm(geometry.width),
        mm(geometry.height),
        "Layer 1",
    );
    let font = load_font(&doc, font_path)?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(mm(geometry.width), mm(geometry.height), "Layer 1");
            doc.get_page(page_index).get_layer(layer_index)
        };

        for placed in &page.elements {
            match &placed.element {
                Element::Title(text) => layer.use_text(
                    text.as_str(),
                    TITLE_FONT_SIZE,
                    mm(geometry.left_margin),
                    mm(placed.y),
                    &font,
                ),
                Element::Text(text) => layer.use_text(
                    text.as_str(),
                    BODY_FONT_SIZE,
                    mm(geometry.left_margin),
                    mm(placed.y),
                    &font,
                ),
                Element::Divider => layer.add_line(Line {
                    points: vec![
                        (Point::new(mm(geometry.left_margin), mm(placed.y)), false),
                        (Point::new(mm(geometry.divider_end), mm(placed.y)), false),
                    ],
                    is_closed: false,
                }),
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| DocumentError::Pdf(format!("{e:?}")))
}

/// Lay out and render a shopping list in one go.
pub fn render_shopping_list(
    list: &ShoppingList,
    font_path: Option<&Path>,
) -> Result<Vec<u8>, DocumentError> {
    let layout = layout_shopping_list(DOCUMENT_TITLE, list, PageGeometry::default());
    render_pdf(&layout, DOCUMENT_TITLE, font_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_name_untouched() {
        assert_eq!(truncate_name("Borscht", 10), "Borscht");
        assert_eq!(truncate_name("0123456789", 10), "0123456789");
    }

    #[test]
    fn test_truncate_long_name() {
        let truncated = truncate_name("Slow-roasted pork shoulder", 10);
        assert_eq!(truncated, "Slow-ro...");
        assert_eq!(truncated.chars().count(), 10);
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_name("щщщщщ", 5), "щщщщщ");
        assert_eq!(truncate_name("щщщщщщ", 5), "щщ...");
    }

    #[test]
    fn test_default_divider_spans_to_550() {
        let geometry = PageGeometry::default();
        assert_eq!(geometry.left_margin, 50.0);
        assert_eq!(geometry.divider_end, 550.0);
    }

    #[test]
    fn test_lines_per_page_default() {
        // 750 down to 50 in steps of 20
        assert_eq!(PageGeometry::default().lines_per_page(), 36);
    }

    #[test]
    fn test_title_only_on_first_page() {
        let list = ShoppingList {
            recipes: (0..100).map(|i| format!("Recipe {i}")).collect(),
            items: Vec::new(),
        };
        let layout = layout_shopping_list("List", &list, PageGeometry::default());

        let titles: Vec<usize> = layout
            .pages
            .iter()
            .enumerate()
            .filter(|(_, page)| {
                page.elements
                    .iter()
                    .any(|p| matches!(p.element, Element::Title(_)))
            })
            .map(|(i, _)| i)
            .collect();
        assert_eq!(titles, vec![0]);
    }

    #[test]
    fn test_new_page_starts_at_top() {
        let geometry = PageGeometry::default();
        let list = ShoppingList {
            recipes: (0..60).map(|i| format!("Recipe {i}")).collect(),
            items: Vec::new(),
        };
        let layout = layout_shopping_list("List", &list, geometry);

        for page in &layout.pages[1..] {
            assert_eq!(page.elements[0].y, geometry.top);
        }
        for placed in layout.pages.iter().flat_map(|p| p.elements.iter()) {
            assert!(placed.y >= geometry.bottom_margin);
        }
    }

    #[test]
    fn test_render_empty_layout_fails() {
        let layout = Layout {
            geometry: PageGeometry::default(),
            pages: Vec::new(),
        };
        assert!(matches!(
            render_pdf(&layout, "x", None),
            Err(DocumentError::Empty)
        ));
    }
}
