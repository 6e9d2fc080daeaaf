use std::path::Path;

use crate::fs_access::{resolve_relative, strip_query_fragment, SiteFs};
use crate::html::read_html_file;

/// Favicon lookup result. `path` is the resolved on-disk path when the file
/// exists, otherwise the declared href; the declaration alone counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaviconCheck {
    pub found: bool,
    pub path: Option<String>,
    pub relative_path: Option<String>,
}

const FAVICON_SELECTORS: &[&str] = &[
    "link[rel=\"icon\"]",
    "link[rel=\"shortcut icon\"]",
    "link[rel=\"apple-touch-icon\"]",
    "link[rel=\"apple-touch-icon-precomposed\"]",
    "link[rel*=\"icon\"]",
];

const FAVICON_FILENAMES: &[&str] = &[
    "favicon.ico",
    "favicon.png",
    "favicon.jpg",
    "favicon.jpeg",
    "favicon.svg",
];

/// Look for a favicon declared on the homepage, then for conventional
/// filenames in the site root.
pub fn locate_favicon(fs: &dyn SiteFs, site_path: &Path, main_page: Option<&Path>) -> FaviconCheck {
    if let Some(main) = main_page {
        if let Some(doc) = read_html_file(fs, main) {
            let mut favicon_href = None;
            for selector in FAVICON_SELECTORS {
                if let Some(href) = doc.first_attr(selector, "href") {
                    if !href.is_empty() {
                        favicon_href = Some(href);
                        break;
                    }
                }
            }

            if let Some(href) = favicon_href {
                let href = strip_query_fragment(&href).to_string();
                // External and data URIs are never existence-checked; the
                // declaration alone is the signal being graded.
                if href.starts_with("http://")
                    || href.starts_with("https://")
                    || href.starts_with("data:")
                {
                    return FaviconCheck {
                        found: true,
                        path: Some(href.clone()),
                        relative_path: Some(href),
                    };
                }
                let main_dir = main.parent().unwrap_or(site_path);
                let full_path = resolve_relative(main_dir, &href);
                if fs.is_file(&full_path) {
                    return FaviconCheck {
                        found: true,
                        path: Some(full_path.to_string_lossy().to_string()),
                        relative_path: Some(href),
                    };
                }
                // Declared but missing on disk still counts.
                return FaviconCheck {
                    found: true,
                    path: Some(href.clone()),
                    relative_path: Some(href),
                };
            }
        }
    }

    for name in FAVICON_FILENAMES {
        let favicon_path = site_path.join(name);
        if fs.is_file(&favicon_path) {
            return FaviconCheck {
                found: true,
                path: Some(favicon_path.to_string_lossy().to_string()),
                relative_path: Some((*name).to_string()),
            };
        }
    }

    FaviconCheck::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_access::LocalFs;
    use std::fs;

    #[test]
    fn test_declared_and_existing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/fav.png"), b"png").unwrap();
        fs::write(
            dir.path().join("index.html"),
            "<html><head><link rel=\"icon\" href=\"img/fav.png?v=3\"></head></html>",
        )
        .unwrap();
        let check = locate_favicon(&LocalFs, dir.path(), Some(&dir.path().join("index.html")));
        assert!(check.found);
        assert_eq!(check.relative_path.as_deref(), Some("img/fav.png"));
    }

    #[test]
    fn test_declared_but_missing_still_counts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("index.html"),
            "<html><head><link rel=\"shortcut icon\" href=\"gone.ico\"></head></html>",
        )
        .unwrap();
        let check = locate_favicon(&LocalFs, dir.path(), Some(&dir.path().join("index.html")));
        assert!(check.found);
        assert_eq!(check.path.as_deref(), Some("gone.ico"));
    }

    #[test]
    fn test_external_href_counts_as_declared() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("index.html"),
            "<html><head><link rel=\"icon\" href=\"https://cdn.example.com/f.ico\"></head></html>",
        )
        .unwrap();
        let check = locate_favicon(&LocalFs, dir.path(), Some(&dir.path().join("index.html")));
        assert!(check.found);
        assert_eq!(check.path.as_deref(), Some("https://cdn.example.com/f.ico"));
    }

    #[test]
    fn test_fallback_to_root_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("favicon.ico"), b"ico").unwrap();
        let check = locate_favicon(&LocalFs, dir.path(), Some(&dir.path().join("index.html")));
        assert!(check.found);
        assert_eq!(check.relative_path.as_deref(), Some("favicon.ico"));
    }

    #[test]
    fn test_absent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        let check = locate_favicon(&LocalFs, dir.path(), Some(&dir.path().join("index.html")));
        assert!(!check.found);
    }
}
