use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use crate::fs_access::{resolve_relative, SiteFs};
use crate::html::read_html_file;

/// Conventional image folder names checked for the site-wide count.
pub const IMAGE_DIRS: &[&str] = &["images", "image", "img"];

static IMAGE_EXT: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|webp|gif|svg)$").ok());

static BG_IMAGE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"(?i)background[-\s]?image:\s*url\(['"]?([^'")]+)"#).ok());

fn is_local_src(src: &str) -> bool {
    !src.is_empty()
        && !src.starts_with("data:")
        && !src.starts_with('#')
        && !src.starts_with("http://")
        && !src.starts_with("https://")
}

/// Unique local image sources referenced by a page, kept only when the
/// resolved file exists on disk. Background images never count favicons;
/// `exclude_favicon_imgs` extends that to `<img>` tags (homepage-only rule).
fn collect_page_images(
    fs: &dyn SiteFs,
    page_path: &Path,
    exclude_favicon_imgs: bool,
) -> HashSet<String> {
    let mut unique = HashSet::new();
    let doc = match read_html_file(fs, page_path) {
        Some(doc) => doc,
        None => return unique,
    };
    let page_dir = page_path.parent().unwrap_or(Path::new("."));

    for src in doc.all_attrs("img", "src") {
        if !is_local_src(&src) {
            continue;
        }
        if exclude_favicon_imgs && src.contains("favicon") {
            continue;
        }
        let resolved = resolve_relative(page_dir, &src);
        if fs.is_file(&resolved) {
            unique.insert(src);
        }
    }

    if let Some(re) = BG_IMAGE.as_ref() {
        for cap in re.captures_iter(&doc.raw) {
            let bg_url = cap[1].trim().to_string();
            if !is_local_src(&bg_url) || bg_url.to_lowercase().contains("favicon") {
                continue;
            }
            let resolved = resolve_relative(page_dir, &bg_url);
            if fs.is_file(&resolved) {
                unique.insert(bg_url);
            }
        }
    }

    unique
}

/// Site-wide image count: files in the conventional image folders
/// (recursive), or the homepage references when those are more numerous.
pub fn count_site_images(fs: &dyn SiteFs, site_path: &Path, main_page: Option<&Path>) -> usize {
    let mut image_count = 0;
    for dir_name in IMAGE_DIRS {
        let img_dir = site_path.join(dir_name);
        if !fs.is_dir(&img_dir) {
            continue;
        }
        if let Ok(files) = fs.read_dir_recursive(&img_dir) {
            image_count += files
                .iter()
                .filter(|f| IMAGE_EXT.as_ref().map_or(false, |re| re.is_match(&f.name)))
                .count();
        }
    }

    if let Some(main) = main_page {
        let referenced = collect_page_images(fs, main, false).len();
        image_count = image_count.max(referenced);
    }

    image_count
}

/// Image count of the homepage only (favicon references excluded).
pub fn count_main_page_images(fs: &dyn SiteFs, main_page: &Path) -> usize {
    collect_page_images(fs, main_page, true).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_access::LocalFs;
    use std::fs;

    fn site_with_images(img_tags: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        for name in ["a.png", "b.jpg", "c.webp"] {
            fs::write(dir.path().join("img").join(name), b"x").unwrap();
        }
        fs::write(
            dir.path().join("index.html"),
            format!("<html><body>{}</body></html>", img_tags),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_folder_count() {
        let dir = site_with_images("");
        assert_eq!(count_site_images(&LocalFs, dir.path(), None), 3);
    }

    #[test]
    fn test_remote_and_data_sources_excluded() {
        let dir = site_with_images(
            r#"<img src="img/a.png"><img src="https://cdn.example.com/x.png">
               <img src="data:image/png;base64,AAAA"><img src="img/missing.png">"#,
        );
        let main = dir.path().join("index.html");
        assert_eq!(count_main_page_images(&LocalFs, &main), 1);
    }

    #[test]
    fn test_page_references_deduplicated() {
        let dir = site_with_images(r#"<img src="img/a.png"><img src="img/a.png">"#);
        let main = dir.path().join("index.html");
        assert_eq!(count_main_page_images(&LocalFs, &main), 1);
    }

    #[test]
    fn test_background_image_counted_but_not_favicon() {
        let dir = site_with_images(
            r#"<div style="background-image: url('img/b.jpg')"></div>
               <div style="background-image: url('img/favicon.png')"></div>"#,
        );
        fs::write(dir.path().join("img/favicon.png"), b"x").unwrap();
        let main = dir.path().join("index.html");
        assert_eq!(count_main_page_images(&LocalFs, &main), 1);
    }

    #[test]
    fn test_site_count_takes_max_of_folder_and_page() {
        // Three files in img/, five distinct references (two outside img/).
        let dir = site_with_images("");
        for name in ["extra1.png", "extra2.png"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::write(
            dir.path().join("index.html"),
            r#"<html><body>
                <img src="img/a.png"><img src="img/b.jpg"><img src="img/c.webp">
                <img src="extra1.png"><img src="extra2.png">
            </body></html>"#,
        )
        .unwrap();
        let main = dir.path().join("index.html");
        assert_eq!(count_site_images(&LocalFs, dir.path(), Some(&main)), 5);
    }
}
