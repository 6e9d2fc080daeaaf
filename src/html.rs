use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use crate::fs_access::SiteFs;

/// Outcome of a selector probe against a parsed page.
///
/// `Unsupported` means the selector text itself was rejected by the CSS
/// engine (e.g. cheerio-style `:contains(...)`); callers treat it as
/// no-match, but it is logged so selector bugs do not hide as false
/// negatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Match(usize),
    NoMatch,
    Unsupported,
}

impl Probe {
    pub fn matched(&self) -> bool {
        matches!(self, Probe::Match(_))
    }

    pub fn count(&self) -> usize {
        match self {
            Probe::Match(n) => *n,
            _ => 0,
        }
    }
}

static REPORTED_SELECTORS: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn report_unsupported(selector: &str) {
    let mut seen = REPORTED_SELECTORS.lock().unwrap();
    if seen.insert(selector.to_string()) {
        tracing::warn!("unsupported selector treated as no-match: {}", selector);
    }
}

/// One parsed HTML page plus its raw markup.
///
/// The detectors mix DOM queries with substring checks on the source text,
/// so both views are kept together.
pub struct PageDoc {
    pub doc: Html,
    pub raw: String,
    pub raw_lower: String,
}

impl PageDoc {
    pub fn parse(raw: String) -> Self {
        let doc = Html::parse_document(&raw);
        let raw_lower = raw.to_lowercase();
        PageDoc { doc, raw, raw_lower }
    }

    /// Probe a selector, degrading a malformed selector to `Unsupported`.
    pub fn probe(&self, selector: &str) -> Probe {
        match Selector::parse(selector) {
            Ok(sel) => {
                let n = self.doc.select(&sel).count();
                if n > 0 {
                    Probe::Match(n)
                } else {
                    Probe::NoMatch
                }
            }
            Err(_) => {
                report_unsupported(selector);
                Probe::Unsupported
            }
        }
    }

    pub fn count(&self, selector: &str) -> usize {
        self.probe(selector).count()
    }

    pub fn matches(&self, selector: &str) -> bool {
        self.probe(selector).matched()
    }

    /// True if any selector in the list matches.
    pub fn matches_any(&self, selectors: &[&str]) -> bool {
        selectors.iter().any(|s| self.matches(s))
    }

    /// First element matching the selector.
    pub fn first(&self, selector: &str) -> Option<ElementRef<'_>> {
        let sel = Selector::parse(selector).ok()?;
        self.doc.select(&sel).next()
    }

    /// `attr` of the first element matching `selector`.
    pub fn first_attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.first(selector)
            .and_then(|el| el.value().attr(attr).map(|v| v.to_string()))
    }

    /// Attribute values of every element matching `selector`.
    pub fn all_attrs(&self, selector: &str, attr: &str) -> Vec<String> {
        let sel = match Selector::parse(selector) {
            Ok(sel) => sel,
            Err(_) => {
                report_unsupported(selector);
                return Vec::new();
            }
        };
        self.doc
            .select(&sel)
            .filter_map(|el| el.value().attr(attr).map(|v| v.to_string()))
            .collect()
    }

    /// Concatenated text of every element matching `selector`, lowercased.
    pub fn text_of_all(&self, selector: &str) -> String {
        let sel = match Selector::parse(selector) {
            Ok(sel) => sel,
            Err(_) => {
                report_unsupported(selector);
                return String::new();
            }
        };
        let mut out = String::new();
        for el in self.doc.select(&sel) {
            for chunk in el.text() {
                out.push_str(chunk);
            }
        }
        out.to_lowercase()
    }

    /// Full text of the page body, lowercased.
    pub fn body_text(&self) -> String {
        self.text_of_all("body")
    }
}

/// Concatenated text of one element subtree, as the source order gives it.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for chunk in el.text() {
        out.push_str(chunk);
    }
    out
}

/// Read and parse an HTML file. Any read failure yields `None`; callers
/// treat a missing document as "feature absent".
pub fn read_html_file(fs: &dyn SiteFs, path: &Path) -> Option<PageDoc> {
    match fs.read_to_string(path) {
        Ok(content) => Some(PageDoc::parse(content)),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_counts_matches() {
        let doc = PageDoc::parse("<ul><li>a</li><li>b</li></ul>".to_string());
        assert_eq!(doc.probe("li"), Probe::Match(2));
        assert_eq!(doc.probe("table"), Probe::NoMatch);
    }

    #[test]
    fn test_probe_unsupported_selector() {
        let doc = PageDoc::parse("<h3>Adres</h3>".to_string());
        assert_eq!(doc.probe("h3:contains(\"Adres\")"), Probe::Unsupported);
        assert!(!doc.matches("h3:contains(\"Adres\")"));
    }

    #[test]
    fn test_body_text_lowercased() {
        let doc = PageDoc::parse("<body><p>Thank You</p></body>".to_string());
        assert!(doc.body_text().contains("thank you"));
    }

    #[test]
    fn test_first_attr() {
        let doc =
            PageDoc::parse("<link rel=\"icon\" href=\"img/fav.png\"><link rel=\"icon\" href=\"x\">".to_string());
        assert_eq!(
            doc.first_attr("link[rel=\"icon\"]", "href").as_deref(),
            Some("img/fav.png")
        );
    }
}
