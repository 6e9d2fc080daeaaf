use std::collections::BTreeSet;
use std::path::Path;

use crate::fs_access::SiteFs;
use crate::html::read_html_file;

/// Navigation containers searched for `.html` links.
const NAV_SELECTORS: &[&str] = &[
    "nav a[href$=\".html\"]",
    "header nav a[href$=\".html\"]",
    ".nav-menu a[href$=\".html\"]",
    ".nav-links a[href$=\".html\"]",
    ".navbar a[href$=\".html\"]",
    ".menu a[href$=\".html\"]",
    "ul.nav a[href$=\".html\"]",
    ".mobile-menu a[href$=\".html\"]",
    ".mobile-menu-links a[href$=\".html\"]",
];

/// Bare filenames linked from the homepage navigation and footer.
pub fn parse_navigation_pages(fs: &dyn SiteFs, main_page: Option<&Path>) -> Vec<String> {
    let mut pages = BTreeSet::new();

    let main_page = match main_page {
        Some(path) => path,
        None => return Vec::new(),
    };
    let doc = match read_html_file(fs, main_page) {
        Some(doc) => doc,
        None => return Vec::new(),
    };

    for selector in NAV_SELECTORS {
        for href in doc.all_attrs(selector, "href") {
            if let Some(name) = page_file_name(&href) {
                pages.insert(name);
            }
        }
    }

    for href in doc.all_attrs("footer a[href$=\".html\"]", "href") {
        if let Some(name) = page_file_name(&href) {
            pages.insert(name);
        }
    }

    pages.into_iter().collect()
}

/// Last path segment of an href, fragment and query stripped.
fn page_file_name(href: &str) -> Option<String> {
    if !href.ends_with(".html") {
        return None;
    }
    let name = href.rsplit('/').next().unwrap_or(href);
    let name = name.split('#').next().unwrap_or(name);
    let name = name.split('?').next().unwrap_or(name);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_access::LocalFs;
    use std::fs;

    #[test]
    fn test_collects_nav_and_footer_links() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("index.html"),
            r##"<html><body>
                <nav>
                    <a href="services.html">Services</a>
                    <a href="pages/equipe.html">Equipe</a>
                    <a href="#contact">Contact</a>
                </nav>
                <footer><a href="privacy.html">Privacy</a></footer>
            </body></html>"##,
        )
        .unwrap();
        let pages = parse_navigation_pages(&LocalFs, Some(&dir.path().join("index.html")));
        assert_eq!(pages, vec!["equipe.html", "privacy.html", "services.html"]);
    }

    #[test]
    fn test_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("index.html"),
            r#"<html><body>
                <nav><a href="about.html">A</a></nav>
                <footer><a href="about.html">A</a></footer>
            </body></html>"#,
        )
        .unwrap();
        let pages = parse_navigation_pages(&LocalFs, Some(&dir.path().join("index.html")));
        assert_eq!(pages, vec!["about.html"]);
    }

    #[test]
    fn test_no_main_page() {
        assert!(parse_navigation_pages(&LocalFs, None).is_empty());
    }
}
