//! HTML lookups over provider notification layouts.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("static selector"));
static STYLED_PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p[style]").expect("static selector"));
static PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("static selector"));
static STRONG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong").expect("static selector"));
static CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("static selector"));
static SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("static selector"));

/// Style marker of the large headline paragraph ("X sent you 10,00 EUR").
const HEADER_STYLE_MARKER: &str = "font-size:32px";

/// Text nodes trimmed and joined with single spaces.
pub fn flatten_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text nodes concatenated as-is, then trimmed.
pub fn raw_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// `href` values of every anchor, in document order.
pub fn anchor_hrefs(document: &Html) -> impl Iterator<Item = &str> {
    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
}

/// The large-styled headline paragraph.
pub fn header_paragraph(document: &Html) -> Option<ElementRef<'_>> {
    document.select(&STYLED_PARAGRAPH).find(|p| {
        p.value().attr("style").is_some_and(|style| {
            let compact: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            compact.contains(HEADER_STYLE_MARKER)
        })
    })
}

/// First paragraph whose lowercased text satisfies `predicate`.
pub fn find_paragraph<'a>(
    document: &'a Html,
    predicate: impl Fn(&str) -> bool,
) -> Option<ElementRef<'a>> {
    document
        .select(&PARAGRAPH)
        .find(|p| predicate(&raw_text(*p).to_lowercase()))
}

/// First `<strong>` whose text matches `label`.
pub fn find_strong_label<'a>(document: &'a Html, label: &Regex) -> Option<ElementRef<'a>> {
    document
        .select(&STRONG)
        .find(|s| label.is_match(&raw_text(*s)))
}

/// First following sibling of `element` with tag `name`.
pub fn next_sibling_named<'a>(element: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == name)
}

/// First element with tag `name` after `element` in document order
/// (its own descendants included).
pub fn next_in_document<'a>(
    document: &'a Html,
    element: ElementRef<'a>,
    name: &str,
) -> Option<ElementRef<'a>> {
    let target = (*element).id();
    document
        .root_element()
        .descendants()
        .skip_while(|node| node.id() != target)
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == name)
}

/// Value cell of a two-column label/value table row.
///
/// Finds the innermost `<td>` whose text matches `label`, then returns the
/// first `<span>` inside the next `<td>` (or that cell itself when it has
/// no span).
pub fn labeled_cell_value<'a>(document: &'a Html, label: &Regex) -> Option<ElementRef<'a>> {
    let label_cell = document
        .select(&CELL)
        .filter(|td| td.select(&CELL).next().is_none())
        .find(|td| label.is_match(&raw_text(*td)))?;
    let value_cell = next_sibling_named(label_cell, "td")?;
    Some(value_cell.select(&SPAN).next().unwrap_or(value_cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_paragraph_tolerates_spacing_and_case() {
        let doc = Html::parse_document(
            r#"<p style="color:#000">small</p><p style="Font-Size: 32PX; line-height:40px">Big</p>"#,
        );
        assert_eq!(raw_text(header_paragraph(&doc).unwrap()), "Big");
    }

    #[test]
    fn flatten_text_joins_nodes() {
        let doc = Html::parse_document("<p> Acme <b>Corp</b>\n vous a envoyé </p>");
        let p = doc.select(&PARAGRAPH).next().unwrap();
        assert_eq!(flatten_text(p), "Acme Corp vous a envoyé");
    }

    #[test]
    fn labeled_cell_skips_layout_cells() {
        let doc = Html::parse_document(
            r#"<table><tr><td><table><tr>
                <td><span>Argent reçu</span></td><td><span>100,00 EUR</span></td>
            </tr></table></td></tr></table>"#,
        );
        let label = Regex::new("(?i)Argent re(ç|c)u").unwrap();
        let value = labeled_cell_value(&doc, &label).unwrap();
        assert_eq!(raw_text(value), "100,00 EUR");
    }

    #[test]
    fn next_in_document_finds_following_anchor() {
        let doc = Html::parse_document(
            r#"<a href="/first">first</a><div><strong>Transaction ID</strong></div><p><a href="/x">ABC123</a></p>"#,
        );
        let label = Regex::new("Transaction ID").unwrap();
        let strong = find_strong_label(&doc, &label).unwrap();
        let next = next_in_document(&doc, strong, "a").unwrap();
        assert_eq!(raw_text(next), "ABC123");
    }
}
