//! Visible-text helpers over a parsed document.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text never renders.
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Collapse every whitespace run (including non-breaking spaces) to one space
/// and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text a reader would see under `root`, whitespace-normalized.
///
/// Adjacent text nodes are separated by a space, so `<td>Rate :</td><td>4024</td>`
/// reads as `Rate : 4024`.
pub fn visible_text(root: ElementRef<'_>) -> String {
    let mut buf = String::new();
    collect_text(root, &mut buf);
    collapse_whitespace(&buf)
}

fn collect_text(element: ElementRef<'_>, buf: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                buf.push_str(text);
                buf.push(' ');
            }
            Node::Element(el) if !HIDDEN_ELEMENTS.contains(&el.name()) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, buf);
                }
            }
            _ => {}
        }
    }
}

/// Resolve the extraction scope: the first element matching `selector`,
/// else `<body>`, else the document root.
///
/// An unparseable selector is treated as absent.
pub fn scope<'a>(document: &'a Html, selector: &str) -> ElementRef<'a> {
    let by_selector = Selector::parse(selector)
        .ok()
        .and_then(|sel| document.select(&sel).next());
    if let Some(el) = by_selector {
        return el;
    }

    let body = Selector::parse("body").expect("body selector is valid");
    document
        .select(&body)
        .next()
        .unwrap_or_else(|| document.root_element())
}
