use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::fs_access::SiteFs;
use crate::html::{read_html_file, PageDoc};

/// Result of analyzing one candidate contact page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContactAnalysis {
    pub found: bool,
    pub map: bool,
    pub address: bool,
    pub phone: bool,
    pub email: bool,
    pub form: bool,
}

/// Conventional contact filenames, several languages.
pub const CONTACT_PAGE_NAMES: &[&str] = &[
    "iletisim.html",
    "contact.html",
    "contacts.html",
    "contatti.html",
    "اتصل.html",
    "تواصل.html",
    "contact-ar.html",
];

/// The short list used by the basic contact-page flag.
pub const CONTACT_PAGE_NAMES_BASIC: &[&str] = &[
    "iletisim.html",
    "contact.html",
    "contacts.html",
    "contatti.html",
];

/// Filename tokens of legal documents and acknowledgment pages, excluded
/// from the content-based contact search.
pub const EXCLUDED_DOCUMENT_KEYWORDS: &[&str] = &[
    "privacy", "cookie", "terms", "gizlilik", "cerez", "kullanim", "disclaimer", "legal", "yasal",
    "policy", "politik", "thank", "thanks", "grazie", "merci", "spasibo", "tesekkur",
];

const CONTACT_SELECTORS: &[&str] = &[
    "[id*=\"contact\"], [class*=\"contact\"]",
    "[id*=\"contatti\"], [class*=\"contatti\"]",
    "[id*=\"iletisim\"], [class*=\"iletisim\"]",
    "[id*=\"اتصل\"], [class*=\"اتصل\"]",
    "[id*=\"تواصل\"], [class*=\"تواصل\"]",
    "section#contact, section.contact",
    "#contatti, .contatti",
];

const CONTACT_KEYWORDS: &[&str] = &[
    "contact",
    "contacts",
    "contatti",
    "iletisim",
    "اتصل",
    "تواصل",
    "address",
    "adres",
    "indirizzo",
    "عنوان",
    "phone",
    "telefon",
    "telefono",
    "هاتف",
    "email",
    "e-mail",
    "e-posta",
    "posta elettronica",
    "بريد إلكتروني",
];

const MAP_SELECTORS: &[&str] = &[
    "iframe[src*=\"google\"]",
    "iframe[src*=\"maps\"]",
    "iframe[src*=\"yandex\"]",
    "iframe[src*=\"openstreetmap\"]",
    "iframe[src*=\"map\"]",
    "#map",
    ".map",
    "[class*=\"map\"]",
    "[id*=\"map\"]",
    "[class*=\"google-map\"]",
    "[id*=\"google-map\"]",
    "[class*=\"yandex-map\"]",
    "[class*=\"map-container\"]",
    "[class*=\"contact-map\"]",
    "[data-map]",
    "[data-google-map]",
];

const MAP_HTML_TOKENS: &[&str] = &[
    "google.com/maps",
    "maps.google",
    "yandex.ru/maps",
    "openstreetmap",
];

const ADDRESS_SELECTORS: &[&str] = &[
    "[class*=\"address\"]",
    "[id*=\"address\"]",
    "[class*=\"adres\"]",
    "[class*=\"indirizzo\"]",
    "[id*=\"indirizzo\"]",
    "[class*=\"contact\"] [class*=\"address\"]",
    "[class*=\"contact-info\"]",
    "[class*=\"iletisim\"]",
    "[class*=\"contatti\"]",
    "[id*=\"contatti\"]",
    "address",
    "[itemprop=\"address\"]",
    "[itemprop=\"streetAddress\"]",
    // cheerio-style text selectors, resolved as Unsupported by the probe
    "h3:contains(\"Adres\")",
    "h3:contains(\"Address\")",
    "h3:contains(\"Адрес\")",
    "h4:contains(\"Indirizzo\")",
    "h4:contains(\"Adres\")",
];

const ADDRESS_KEYWORDS: &[&str] = &[
    "адрес", "address", "adres", "adresse", "адреса", "adresi", "indirizzo", "indirizzi", "via",
    "viale", "corso", "piazza", "улица", "street", "sokak", "cadde", "rue", "strasse", "ул.",
    "пр.", "проспект", "avenue", "bulvar", "boulevard", "istanbul", "ankara", "izmir", "roma",
    "milano", "napoli", "türkiye", "turkey", "italia", "italy",
];

static ADDRESS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\d{5}",                      // postal code
        r"\d+[\s\-]?[a-zа-яё]+\s+\d+", // house number and street
        r"[a-zа-яё]+\s+\d+[\s\-]?\d*", // street and number
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const PHONE_SELECTORS: &[&str] = &[
    "a[href^=\"tel:\"]",
    "[class*=\"phone\"]",
    "[id*=\"phone\"]",
    "[class*=\"tel\"]",
    "[id*=\"tel\"]",
    "[class*=\"telefon\"]",
    "[class*=\"telefono\"]",
    "[id*=\"telefono\"]",
    "[class*=\"contact-info\"]",
    "[class*=\"contatti\"]",
    "[itemprop=\"telephone\"]",
    "[itemprop=\"phoneNumber\"]",
    "h3:contains(\"Telefon\")",
    "h3:contains(\"Phone\")",
    "h3:contains(\"Телефон\")",
    "h4:contains(\"Telefono\")",
    "h4:contains(\"Telefon\")",
];

const PHONE_KEYWORDS: &[&str] = &[
    "телефон",
    "phone",
    "tel",
    "telefon",
    "téléphone",
    "телефона",
    "telefono",
    "telefone",
    "телефону",
    "telephone",
    "telefoni",
];

static PHONE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\+?\d{1,3}[\s\-]?\(?\d{1,4}\)?[\s\-]?\d{1,4}[\s\-]?\d{1,9}",
        r"\+\d{1,3}[\s\-]?\(?\d{1,4}\)?[\s\-]?\d{1,4}[\s\-]?\d{1,9}",
        r"\+\d{1,3}[\s\-]?\d{2,4}[\s\-]?\d{3,4}[\s\-]?\d{3,6}",
        r"\d{3}[\s\-]?\d{3}[\s\-]?\d{2}[\s\-]?\d{2}",
        r"\(\d{3}\)[\s\-]?\d{3}[\s\-]?\d{4}",
        r"\+?\d{1,3}[\s\-]?\d{1,4}[\s\-]?\d{1,4}[\s\-]?\d{1,9}",
        r"\+\d{1,3}\s*\(\d{1,4}\)\s*\d{1,4}[\s\-]?\d{1,9}",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

const EMAIL_SELECTORS: &[&str] = &[
    "a[href^=\"mailto:\"]",
    "[class*=\"email\"]",
    "[id*=\"email\"]",
    "[class*=\"mail\"]",
    "[id*=\"mail\"]",
    "[class*=\"e-mail\"]",
    "[class*=\"e-posta\"]",
    "[class*=\"contact-info\"]",
    "[class*=\"contatti\"]",
    "[itemprop=\"email\"]",
    "h3:contains(\"E-posta\")",
    "h3:contains(\"Email\")",
    "h4:contains(\"Email\")",
    "h4:contains(\"E-posta\")",
];

const EMAIL_KEYWORDS: &[&str] = &[
    "email",
    "e-mail",
    "почта",
    "mail",
    "e-posta",
    "courriel",
    "correo",
    "eletrônico",
    "электронная почта",
    "eposta",
    "posta elettronica",
    "indirizzo email",
];

static EMAIL_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").ok());

const FORM_SELECTORS: &[&str] = &[
    "form",
    "[class*=\"form\"]",
    "[id*=\"form\"]",
    "[class*=\"contact-form\"]",
    "[id*=\"contact-form\"]",
    "[class*=\"contact-form-wrapper\"]",
    "[id*=\"contactForm\"]",
    "[id*=\"contactform\"]",
];

/// Signals of the content-based contact-page search, one weighted point
/// list. Kept as data so the threshold and weights stay testable.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContactSignals {
    pub map: bool,
    pub form: bool,
    pub contact_info: bool,
    pub contact_selector: bool,
    pub contact_keywords: bool,
}

pub const CONTACT_SCORE_THRESHOLD: i32 = 2;

const CONTACT_SIGNAL_WEIGHTS: &[(&str, i32)] = &[
    ("map", 2),
    ("form", 2),
    ("contact_info", 1),
    ("contact_selector", 1),
    ("contact_keywords", 1),
];

pub fn contact_score(signals: &ContactSignals) -> i32 {
    CONTACT_SIGNAL_WEIGHTS
        .iter()
        .map(|(name, weight)| {
            let fired = match *name {
                "map" => signals.map,
                "form" => signals.form,
                "contact_info" => signals.contact_info,
                "contact_selector" => signals.contact_selector,
                "contact_keywords" => signals.contact_keywords,
                _ => false,
            };
            if fired {
                *weight
            } else {
                0
            }
        })
        .sum()
}

/// Evaluate the search signals against one page.
pub fn candidate_signals(doc: &PageDoc) -> ContactSignals {
    let raw = &doc.raw_lower;
    let body_text = doc.body_text();

    let map = MAP_HTML_TOKENS.iter().any(|t| raw.contains(t))
        || doc.matches("iframe[src*=\"maps\"], iframe[src*=\"map\"]")
        || doc.matches("[class*=\"map\"], [id*=\"map\"], [data-map]");

    let form = doc.matches("form")
        && (doc.count(
            "form input[type=\"text\"], form input[type=\"email\"], form input[type=\"tel\"]",
        ) >= 2
            || doc.matches("[class*=\"contact-form\"], [id*=\"contact-form\"], [class*=\"form\"]"));

    let contact_info = doc.matches(
        "[class*=\"address\"], [id*=\"address\"], [class*=\"adres\"], [class*=\"indirizzo\"]",
    ) || ADDRESS_PATTERNS.get(1).map_or(false, |p| p.is_match(&body_text))
        || doc.matches(
            "a[href^=\"tel:\"], [class*=\"phone\"], [class*=\"tel\"], [class*=\"telefon\"], [class*=\"telefono\"]",
        )
        || PHONE_PATTERNS.first().map_or(false, |p| p.is_match(&body_text))
        || doc.matches("a[href^=\"mailto:\"], [class*=\"email\"], [class*=\"mail\"], [class*=\"e-posta\"]")
        || EMAIL_PATTERN.as_ref().map_or(false, |p| p.is_match(&body_text));

    let contact_selector = doc.matches_any(CONTACT_SELECTORS);

    let contact_keywords = CONTACT_KEYWORDS
        .iter()
        .any(|kw| body_text.contains(kw) || raw.contains(kw));

    ContactSignals {
        map,
        form,
        contact_info,
        contact_selector,
        contact_keywords,
    }
}

/// Full content analysis of one contact page.
pub fn analyze_contact_content(doc: &PageDoc) -> ContactAnalysis {
    let raw = &doc.raw_lower;
    let body_text = doc.body_text();

    let map = doc.matches_any(MAP_SELECTORS) || MAP_HTML_TOKENS.iter().any(|t| raw.contains(t));

    let address = doc.matches_any(ADDRESS_SELECTORS)
        || ADDRESS_KEYWORDS
            .iter()
            .any(|kw| body_text.contains(kw) || raw.contains(kw))
        || ADDRESS_PATTERNS.iter().any(|p| p.is_match(&body_text));

    let phone = doc.matches_any(PHONE_SELECTORS)
        || PHONE_KEYWORDS
            .iter()
            .any(|kw| body_text.contains(kw) || raw.contains(kw))
        || PHONE_PATTERNS
            .iter()
            .any(|p| p.is_match(&body_text) || p.is_match(raw))
        || doc.matches("a[href^=\"tel:\"]");

    let email = doc.matches_any(EMAIL_SELECTORS)
        || EMAIL_KEYWORDS
            .iter()
            .any(|kw| body_text.contains(kw) || raw.contains(kw))
        || EMAIL_PATTERN
            .as_ref()
            .map_or(false, |p| p.is_match(&body_text) || p.is_match(raw))
        || doc.matches("a[href^=\"mailto:\"]");

    let mut form = false;
    let has_form_element = doc.matches_any(FORM_SELECTORS);
    let has_form_in_html = raw.contains("<form") || raw.contains("contact-form");
    if has_form_element || has_form_in_html {
        let form_fields = doc.count(
            "form input[type=\"text\"], form input[type=\"email\"], form input[type=\"tel\"], \
             form textarea, form select, \
             form input:not([type=\"submit\"]):not([type=\"button\"]):not([type=\"hidden\"])",
        );
        let submit_buttons = doc.count(
            "form button[type=\"submit\"], form input[type=\"submit\"], form button[type=\"button\"]",
        );
        let field_like = doc.count(
            "[class*=\"form-input\"], [class*=\"form-field\"], [id*=\"name\"], [id*=\"email\"], [id*=\"message\"]",
        );
        form = (form_fields >= 2 || field_like >= 2) && (submit_buttons > 0 || has_form_in_html);
    }

    ContactAnalysis {
        found: true,
        map,
        address,
        phone,
        email,
        form,
    }
}

/// Locate the contact page of a site and analyze its content.
///
/// Search order: explicit candidate, conventional filenames, content-scored
/// scan of every HTML file, then a contact section on the homepage.
pub fn check_contact_page(
    fs: &dyn SiteFs,
    site_path: &Path,
    specific_page: Option<&Path>,
) -> ContactAnalysis {
    if let Some(page) = specific_page {
        if let Some(doc) = read_html_file(fs, page) {
            return analyze_contact_content(&doc);
        }
    }

    for name in CONTACT_PAGE_NAMES {
        let page_path = site_path.join(name);
        if fs.is_file(&page_path) {
            if let Some(doc) = read_html_file(fs, &page_path) {
                return analyze_contact_content(&doc);
            }
        }
    }

    // Content-based scan over every HTML file.
    if let Ok(entries) = fs.read_dir(site_path) {
        for entry in &entries {
            if !(entry.name.ends_with(".html") || entry.name.ends_with(".htm")) {
                continue;
            }
            let name_lower = entry.name.to_lowercase();
            if EXCLUDED_DOCUMENT_KEYWORDS
                .iter()
                .any(|kw| name_lower.contains(kw))
            {
                continue;
            }
            let doc = match read_html_file(fs, &entry.path) {
                Some(doc) => doc,
                None => continue,
            };
            let signals = candidate_signals(&doc);
            if contact_score(&signals) >= CONTACT_SCORE_THRESHOLD {
                return analyze_contact_content(&doc);
            }
        }
    }

    // No standalone page: a contact section on the homepage still counts.
    if specific_page.is_none() {
        for name in ["index.html", "index.htm", "home.html", "light.html"] {
            let page_path = site_path.join(name);
            if !fs.is_file(&page_path) {
                continue;
            }
            if let Some(doc) = read_html_file(fs, &page_path) {
                if doc.matches(
                    "#contatti, [id*=\"contact\"], [id*=\"contatti\"], section#contatti, .contatti, .contact-section",
                ) {
                    return analyze_contact_content(&doc);
                }
            }
        }
    }

    ContactAnalysis::default()
}

/// Basic contact-page flag: conventional filename, or a contact section or
/// anchor on the homepage. Kept alongside the scored search; the two rules
/// differ on boundary cases and both are reported.
pub fn has_basic_contact_page(
    fs: &dyn SiteFs,
    site_path: &Path,
    main_page: Option<&Path>,
) -> Option<PathBuf> {
    for name in CONTACT_PAGE_NAMES_BASIC {
        let page_path = site_path.join(name);
        if fs.is_file(&page_path) {
            return Some(page_path);
        }
    }

    if let Some(main) = main_page {
        if let Some(doc) = read_html_file(fs, main) {
            let section = doc.count(
                "#contatti, [id*=\"contact\"], [id*=\"contatti\"], section#contatti, .contatti, .contact-section",
            );
            let link = doc.count(
                "a[href*=\"#contatti\"], a[href*=\"#contact\"], a[href*=\"contact\"], a[href*=\"contatti\"]",
            );
            if section > 0 || link > 0 {
                return Some(main.to_path_buf());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP_AND_FORM: &str = r#"<html><body>
        <iframe src="https://www.google.com/maps/embed?pb=1"></iframe>
        <form action="send.php">
            <input type="text" name="name">
            <input type="email" name="email">
            <button type="submit">Envoyer</button>
        </form>
    </body></html>"#;

    #[test]
    fn test_candidate_score_map_and_form() {
        let doc = PageDoc::parse(MAP_AND_FORM.to_string());
        let signals = candidate_signals(&doc);
        assert!(signals.map);
        assert!(signals.form);
        assert!(contact_score(&signals) >= CONTACT_SCORE_THRESHOLD);
    }

    #[test]
    fn test_single_keyword_is_not_enough() {
        let doc = PageDoc::parse("<html><body><p>contact</p></body></html>".to_string());
        let signals = candidate_signals(&doc);
        // One keyword signal only: below the threshold.
        assert_eq!(contact_score(&signals), 1);
    }

    #[test]
    fn test_analyze_phone_and_email_links() {
        let doc = PageDoc::parse(
            r#"<html><body>
                <a href="tel:+15551784061">call</a>
                <a href="mailto:info@example.com">write</a>
            </body></html>"#
                .to_string(),
        );
        let analysis = analyze_contact_content(&doc);
        assert!(analysis.found);
        assert!(analysis.phone);
        assert!(analysis.email);
        assert!(!analysis.form);
    }

    #[test]
    fn test_form_needs_fields_and_submit() {
        let doc = PageDoc::parse(
            r#"<html><body><form>
                <input type="text" name="a">
                <input type="text" name="b">
                <button type="submit">Go</button>
            </form></body></html>"#
                .to_string(),
        );
        assert!(analyze_contact_content(&doc).form);

        let one_field = PageDoc::parse(
            "<html><body><div><p>no form here</p></div></body></html>".to_string(),
        );
        assert!(!analyze_contact_content(&one_field).form);
    }

    #[test]
    fn test_check_contact_page_by_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("contact.html"), MAP_AND_FORM).unwrap();
        let analysis = check_contact_page(&crate::fs_access::LocalFs, dir.path(), None);
        assert!(analysis.found);
        assert!(analysis.map);
        assert!(analysis.form);
    }

    #[test]
    fn test_check_contact_page_excludes_documents() {
        let dir = tempfile::tempdir().unwrap();
        // A privacy page with contact-like content must not be picked up.
        std::fs::write(dir.path().join("privacy.html"), MAP_AND_FORM).unwrap();
        let analysis = check_contact_page(&crate::fs_access::LocalFs, dir.path(), None);
        assert!(!analysis.found);
    }
}
