use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::contact::{check_contact_page, has_basic_contact_page};
use crate::data_elements::{count_data_elements, DataElementSummary};
use crate::favicon::locate_favicon;
use crate::fs_access::SiteFs;
use crate::html::read_html_file;
use crate::images::{count_main_page_images, count_site_images};
use crate::main_page::locate_main_page;
use crate::navigation::parse_navigation_pages;
use crate::thank_you::{locate_thank_you, ThankYouKind};

/// Folders never treated as sites.
const EXCLUDED_FOLDERS: &[&str] = &["node_modules", "css", "js", "images", "image", "img"];

/// Legal-document filename pattern.
static DOCUMENT_FILE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)(privacy|gizlilik|cerez|cookie|terms|kullanim|feragat)").ok());

/// Document keywords searched in footer links.
const FOOTER_DOC_KEYWORDS: &[&str] = &[
    "privacy", "gizlilik", "cerez", "cookie", "terms", "kullanim", "feragat", "disclaimer",
    "legal", "yasal", "policy", "politik",
];

/// Pages excluded from the per-page content-element counts.
const CONTENT_PAGE_EXCLUDED_KEYWORDS: &[&str] = &[
    "index", "light", "home", "contact", "iletisim", "contatti", "tesekkurler", "thank", "thanks",
    "grazie", "merci", "spasibo", "privacy", "cookie", "terms", "gizlilik", "cerez", "kullanim",
    "disclaimer", "feragat", "legal", "yasal", "policy", "politik",
];

/// Minimum image count graded as a pass.
pub const IMAGES_MIN: usize = 5;

/// Scan record of one site folder. Field names on the wire match the
/// original report generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteResult {
    pub site: String,
    pub site_path: PathBuf,
    pub main_page_path: Option<PathBuf>,
    pub favicon_path: Option<String>,
    pub favicon_relative_path: Option<String>,
    pub exists: bool,
    pub main_page: bool,
    pub contact_page: bool,
    pub documents: usize,
    pub images: usize,
    pub images_min5: bool,
    pub main_page_images: usize,
    pub main_page_images_min5: bool,
    pub favicon: bool,
    pub contact_map: bool,
    pub contact_address: bool,
    pub contact_phone: bool,
    pub contact_email: bool,
    pub contact_form: bool,
    pub thank_you_page: bool,
    pub thank_you_page_type: Option<ThankYouKind>,
    pub pages_data_elements: BTreeMap<String, DataElementSummary>,
    pub footer_documents: bool,
}

impl SiteResult {
    fn new(site: &str, site_path: PathBuf) -> Self {
        SiteResult {
            site: site.to_string(),
            site_path,
            ..SiteResult::default()
        }
    }
}

/// Case-insensitive, numeric-aware ordering (site2 before site10).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let mut na = String::new();
                    while let Some(c) = ai.peek().copied() {
                        if c.is_ascii_digit() {
                            na.push(c);
                            ai.next();
                        } else {
                            break;
                        }
                    }
                    let mut nb = String::new();
                    while let Some(c) = bi.peek().copied() {
                        if c.is_ascii_digit() {
                            nb.push(c);
                            bi.next();
                        } else {
                            break;
                        }
                    }
                    let ta = na.trim_start_matches('0');
                    let tb = nb.trim_start_matches('0');
                    let ord = ta.len().cmp(&tb.len()).then_with(|| ta.cmp(tb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                } else {
                    let ord = ca.cmp(&cb);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    ai.next();
                    bi.next();
                }
            }
        }
    }
}

/// Candidate site folders under a root, asset folders excluded.
pub fn find_site_folders(fs: &dyn SiteFs, base_path: &Path) -> Vec<String> {
    let entries = match fs.read_dir(base_path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("failed to read scan root: {}", e);
            return Vec::new();
        }
    };
    let mut folders: Vec<String> = entries
        .into_iter()
        .filter(|e| e.is_dir)
        .map(|e| e.name)
        .filter(|name| {
            let lower = name.to_lowercase();
            !lower.starts_with('.') && !EXCLUDED_FOLDERS.contains(&lower.as_str())
        })
        .collect();
    folders.sort_by(|a, b| natural_cmp(a, b));
    folders
}

/// Scan one site folder. Every detector failure degrades to "absent";
/// a missing folder short-circuits with `exists = false`.
pub fn scan_site(fs: &dyn SiteFs, base_path: &Path, site: &str) -> SiteResult {
    let site_path = base_path.join(site);
    let mut result = SiteResult::new(site, site_path.clone());

    if !fs.is_dir(&site_path) {
        return result;
    }
    result.exists = true;

    // Main page.
    let main_page = locate_main_page(fs, &site_path);
    if let Some(main) = &main_page {
        result.main_page = true;
        result.main_page_path = Some(main.clone());
    }

    // Basic contact-page flag.
    result.contact_page = has_basic_contact_page(fs, &site_path, main_page.as_deref()).is_some();

    // Legal documents.
    if let Ok(entries) = fs.read_dir(&site_path) {
        result.documents = entries
            .iter()
            .filter(|e| {
                DOCUMENT_FILE
                    .as_ref()
                    .map_or(false, |re| re.is_match(&e.name))
            })
            .count();
    }

    // Document links in the footer.
    if let Some(main) = &main_page {
        if let Some(doc) = read_html_file(fs, main) {
            if let Ok(footer_sel) = scraper::Selector::parse("footer a") {
                result.footer_documents = doc.doc.select(&footer_sel).any(|a| {
                    let href = a.value().attr("href").unwrap_or("").to_lowercase();
                    let text = crate::html::element_text(a).to_lowercase();
                    FOOTER_DOC_KEYWORDS
                        .iter()
                        .any(|kw| href.contains(kw) || text.contains(kw))
                });
            }
        }
    }

    // Images.
    result.images = count_site_images(fs, &site_path, main_page.as_deref());
    result.images_min5 = result.images >= IMAGES_MIN;
    if let Some(main) = &main_page {
        result.main_page_images = count_main_page_images(fs, main);
    }
    result.main_page_images_min5 = result.main_page_images >= IMAGES_MIN;

    // Favicon.
    let favicon = locate_favicon(fs, &site_path, main_page.as_deref());
    result.favicon = favicon.found;
    result.favicon_path = favicon.path;
    result.favicon_relative_path = favicon.relative_path;

    // Contact content.
    let contact = check_contact_page(fs, &site_path, None);
    if contact.found {
        result.contact_map = contact.map;
        result.contact_address = contact.address;
        result.contact_phone = contact.phone;
        result.contact_email = contact.email;
        result.contact_form = contact.form;
    }

    // Thank-you flow.
    let thank_you = locate_thank_you(fs, &site_path);
    result.thank_you_page = thank_you.is_some();
    result.thank_you_page_type = thank_you;

    // Content pages reached from the navigation.
    if main_page.is_some() {
        let nav_pages = parse_navigation_pages(fs, main_page.as_deref());
        for page in nav_pages {
            let page_lower = page.to_lowercase();
            if CONTENT_PAGE_EXCLUDED_KEYWORDS
                .iter()
                .any(|kw| page_lower.contains(kw))
            {
                continue;
            }
            let page_path = site_path.join(&page);
            if !fs.is_file(&page_path) {
                continue;
            }
            let summary = count_data_elements(fs, &page_path);
            if summary.total > 0 {
                result.pages_data_elements.insert(page, summary);
            }
        }
    }

    result
}

/// Run the scan over every site folder of a root, sequentially.
pub fn check_sites(fs: &dyn SiteFs, base_path: &Path) -> Vec<SiteResult> {
    println!("Recherche des dossiers de sites...");
    let sites = find_site_folders(fs, base_path);
    println!("Dossiers trouves: {}", sites.len());
    println!("Verification des sites...\n");

    let mut results = Vec::with_capacity(sites.len());
    for site in &sites {
        let result = scan_site(fs, base_path, site);
        if result.exists {
            println!("OK: {}", site);
        } else {
            println!("NOT FOUND: {}", site);
        }
        results.push(result);
    }

    results.sort_by(|a, b| natural_cmp(&a.site, &b.site));
    results
}
