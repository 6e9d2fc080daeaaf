use std::path::{Path, PathBuf};

use crate::fs_access::SiteFs;
use crate::html::{read_html_file, PageDoc};

/// Conventional homepage filenames, in lookup order.
pub const MAIN_PAGE_NAMES: &[&str] = &[
    "light.html",
    "index.html",
    "home.html",
    "main.html",
    "default.html",
];

/// Names accepted even when the content score stays under the threshold.
const FALLBACK_MAIN_NAMES: &[&str] = &["index.html", "home.html", "main.html"];

const HERO_SELECTORS: &[&str] = &[
    ".hero",
    "#hero",
    "[class*=\"hero\"]",
    "[id*=\"hero\"]",
    ".banner",
    "#banner",
    "[class*=\"banner\"]",
    ".welcome",
    "#welcome",
    "[class*=\"welcome\"]",
    "section.hero",
    "section#hero",
    "section[class*=\"hero\"]",
];

/// Section tokens typical for a homepage, several languages.
const MAIN_PAGE_SECTIONS: &[&str] = &[
    "about",
    "services",
    "portfolio",
    "contact",
    "hakkımızda",
    "hizmetler",
    "hizmet",
    "iletisim",
    "chi siamo",
    "servizi",
    "contatti",
];

/// Filename tokens of pages that are clearly not the homepage.
const NOT_MAIN_INDICATORS: &[&str] = &[
    "thank", "spasibo", "tesekkur", "merci", "grazie", "privacy", "cookie", "terms", "gizlilik",
    "cerez", "contact", "contatti", "iletisim",
];

pub const MAIN_PAGE_SCORE_THRESHOLD: i32 = 8;

const HERO_WEIGHT: i32 = 10;
const NAV_LINKS_WEIGHT: i32 = 5;
const SECTION_KEYWORD_WEIGHT: i32 = 3;
const MANY_SECTIONS_WEIGHT: i32 = 5;
const MANY_IMAGES_WEIGHT: i32 = 3;
const NOT_MAIN_PENALTY: i32 = -20;
const DOCUMENT_PENALTY: i32 = -10;

/// Content score of one homepage candidate.
///
/// The hero signal can fire twice (selector probe and raw markup token),
/// matching the historical behavior of the checker.
pub fn score_page(doc: &PageDoc, file_name: &str) -> i32 {
    let mut score = 0;

    if doc.matches_any(HERO_SELECTORS) {
        score += HERO_WEIGHT;
    }
    let raw = &doc.raw_lower;
    if raw.contains("class=\"hero")
        || raw.contains("class='hero")
        || raw.contains("id=\"hero")
        || raw.contains("id='hero")
    {
        score += HERO_WEIGHT;
    }

    if doc.count("nav a, header a, .nav a, .navigation a") >= 3 {
        score += NAV_LINKS_WEIGHT;
    }

    for section in MAIN_PAGE_SECTIONS {
        if raw.contains(&format!("id=\"{}\"", section))
            || raw.contains(&format!("class=\"{}\"", section))
            || raw.contains(&format!("#{}", section))
            || raw.contains(&format!(".{}", section))
        {
            score += SECTION_KEYWORD_WEIGHT;
        }
    }

    let sections = doc.count("section");
    if sections >= 3 {
        score += MANY_SECTIONS_WEIGHT;
    }
    if doc.count("img") >= 3 {
        score += MANY_IMAGES_WEIGHT;
    }

    let file_name_lower = file_name.to_lowercase();
    for indicator in NOT_MAIN_INDICATORS {
        if file_name_lower.contains(indicator) {
            score += NOT_MAIN_PENALTY;
            break;
        }
    }

    // Long text with almost no sections reads like a legal document.
    let text_length = doc.body_text().chars().count();
    if text_length > 5000 && sections < 2 {
        score += DOCUMENT_PENALTY;
    }

    score
}

/// Best-guess path of a site's homepage.
pub fn locate_main_page(fs: &dyn SiteFs, site_path: &Path) -> Option<PathBuf> {
    // Conventional names first.
    for name in MAIN_PAGE_NAMES {
        let page_path = site_path.join(name);
        if fs.is_file(&page_path) {
            return Some(page_path);
        }
    }

    // Case-insensitive index.html.
    if let Ok(entries) = fs.read_dir(site_path) {
        for entry in &entries {
            if entry.name.to_lowercase() == "index.html" && entry.name.ends_with(".html") {
                return Some(entry.path.clone());
            }
        }

        // Score every HTML file; first file reaching the best score wins.
        let mut best_match: Option<(PathBuf, String)> = None;
        let mut best_score = 0;
        for entry in &entries {
            if !entry.name.ends_with(".html") {
                continue;
            }
            let doc = match read_html_file(fs, &entry.path) {
                Some(doc) => doc,
                None => continue,
            };
            let score = score_page(&doc, &entry.name);
            if score > best_score {
                best_score = score;
                best_match = Some((entry.path.clone(), entry.name.clone()));
            }
        }

        if let Some((path, name)) = best_match {
            if best_score >= MAIN_PAGE_SCORE_THRESHOLD {
                return Some(path);
            }
            // Low score, but a conventional name is trusted anyway.
            if FALLBACK_MAIN_NAMES.contains(&name.to_lowercase().as_str()) {
                return Some(path);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_access::LocalFs;
    use std::fs;

    fn page(hero: bool, nav_links: usize, images: usize) -> String {
        let mut html = String::from("<html><body>");
        if hero {
            html.push_str("<div class=\"top-hero\">Bienvenue</div>");
        }
        html.push_str("<nav>");
        for i in 0..nav_links {
            html.push_str(&format!("<a href=\"p{}.html\">p{}</a>", i, i));
        }
        html.push_str("</nav>");
        for i in 0..images {
            html.push_str(&format!("<img src=\"img/{}.png\">", i));
        }
        html.push_str("</body></html>");
        html
    }

    #[test]
    fn test_score_hero_nav_images() {
        // Hero selector (+10), 4 nav links (+5), 3 images (+3).
        let doc = PageDoc::parse(page(true, 4, 3));
        assert_eq!(score_page(&doc, "promo.html"), 18);
    }

    #[test]
    fn test_score_not_main_penalty() {
        let doc = PageDoc::parse(page(true, 4, 3));
        assert_eq!(score_page(&doc, "contact-promo.html"), -2);
    }

    #[test]
    fn test_conventional_name_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        fs::write(dir.path().join("promo.html"), page(true, 4, 3)).unwrap();
        let found = locate_main_page(&LocalFs, dir.path()).unwrap();
        assert_eq!(found, dir.path().join("index.html"));
    }

    #[test]
    fn test_scored_candidate_beats_empty_page() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("about.html"), "<html><body></body></html>").unwrap();
        fs::write(dir.path().join("promo.html"), page(true, 4, 3)).unwrap();
        let found = locate_main_page(&LocalFs, dir.path()).unwrap();
        assert_eq!(found, dir.path().join("promo.html"));
    }

    #[test]
    fn test_low_score_rejected_without_conventional_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("promo.html"), page(false, 0, 0)).unwrap();
        assert!(locate_main_page(&LocalFs, dir.path()).is_none());
    }

    #[test]
    fn test_case_insensitive_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Index.html"), "<html></html>").unwrap();
        let found = locate_main_page(&LocalFs, dir.path()).unwrap();
        assert_eq!(found, dir.path().join("Index.html"));
    }
}
