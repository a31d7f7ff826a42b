pub mod fields;
pub mod repos;

use scraper::{ElementRef, Html, Selector};

/// Selectors are compiled from static strings; a bad one is a bug, not data.
fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Raw text of the first element matching `css`, if any.
fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = selector(css);
    doc.select(&sel).next().map(element_text)
}

/// Raw text of the first `inner` element under the first `outer` match.
/// Any missing link in the chain yields None.
fn nested_text(doc: &Html, outer: &str, inner: &str) -> Option<String> {
    let outer_sel = selector(outer);
    let inner_sel = selector(inner);
    doc.select(&outer_sel)
        .next()
        .and_then(|el| el.select(&inner_sel).next())
        .map(element_text)
}
