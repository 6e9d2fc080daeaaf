use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

use crate::fs_access::SiteFs;
use crate::html::{element_text, read_html_file, PageDoc};

/// How the post-submission acknowledgment is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThankYouKind {
    Page,
    Modal,
}

/// Conventional acknowledgment page filenames, several languages.
pub const THANK_YOU_PAGES: &[&str] = &[
    "tesekkurler.html",
    "tesekkur.html",
    "teşekkürler.html",
    "thank-you.html",
    "thanks.html",
    "thankyou.html",
    "thank.html",
    "merci.html",
    "spasibo.html",
    "spasiba.html",
    "blagodarya.html",
    "grazie.html",
    "success.html",
    "success-page.html",
    "thank-you-page.html",
];

pub const THANK_YOU_KEYWORDS: &[&str] = &[
    "спасибо",
    "благодарим",
    "благодарю",
    "thank you",
    "thanks",
    "thank",
    "teşekkürler",
    "teşekkür",
    "tesekkurler",
    "tesekkur",
    "merci",
    "merci beaucoup",
    "grazie",
    "grazie mille",
    "danke",
    "danke schön",
    "obrigado",
    "obrigada",
    "gracias",
    "muchas gracias",
    "شكرا",
    "شكر",
    "شكراً",
    "success",
    "successful",
    "успешно",
];

const HOME_BUTTON_KEYWORDS: &[&str] = &[
    "домой",
    "home",
    "главная",
    "на главную",
    "ana sayfa",
    "accueil",
    "torna",
    "inizio",
    "inicio",
    "start",
    "начало",
    "вернуться",
    "go home",
    "back home",
    "return home",
    "الرئيسية",
    "الصفحة الرئيسية",
];

const MODAL_SELECTORS: &[&str] = &[
    "[id*=\"thank\"], [id*=\"success\"], [id*=\"grazie\"], [id*=\"merci\"]",
    "[class*=\"thank\"], [class*=\"success\"], [class*=\"modal\"]",
    ".modal, #modal, [class*=\"popup\"], [id*=\"popup\"]",
];

static REDIRECT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"(?i)(window\.location|location\.href)\s*=\s*['"]([^'"]+)['"]"#).ok()
});

/// Signals feeding the weighted score. Kept separate from the scoring so
/// both rule paths below can reuse them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThankYouSignals {
    pub text: bool,
    pub redirect: bool,
    pub modal: bool,
    pub modal_in_html: bool,
    pub home_button: bool,
    pub success_icon: bool,
    pub short_minimal: bool,
}

pub const THANK_YOU_SCORE_THRESHOLD: i32 = 3;

const THANK_YOU_SIGNAL_WEIGHTS: &[(&str, i32)] = &[
    ("text", 3),
    ("redirect", 2),
    ("modal", 1),
    ("home_button", 2),
    ("success_icon", 1),
    ("short_minimal", 1),
];

pub fn thank_you_score(s: &ThankYouSignals) -> i32 {
    THANK_YOU_SIGNAL_WEIGHTS
        .iter()
        .map(|(name, weight)| {
            let fired = match *name {
                "text" => s.text,
                "redirect" => s.redirect,
                "modal" => s.modal || s.modal_in_html,
                "home_button" => s.home_button,
                "success_icon" => s.success_icon,
                "short_minimal" => s.short_minimal,
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

fn is_thank_you_target(target: &str) -> bool {
    let target = target.to_lowercase();
    THANK_YOU_PAGES
        .iter()
        .any(|page| target.contains(page.trim_end_matches(".html")))
        || THANK_YOU_KEYWORDS.iter().any(|kw| target.contains(kw))
}

fn has_redirect_to_thank_you(doc: &PageDoc) -> bool {
    // Form actions pointing at an acknowledgment page.
    if let Ok(form_sel) = scraper::Selector::parse("form") {
        for form in doc.doc.select(&form_sel) {
            if let Some(action) = form.value().attr("action") {
                if !action.is_empty() && is_thank_you_target(action) {
                    return true;
                }
            }

            // Submit handlers tied to this form's id or class, searched in
            // the raw markup. A pattern that does not compile is skipped.
            let mut tokens: Vec<String> = Vec::new();
            if let Some(id) = form.value().attr("id") {
                if !id.is_empty() {
                    tokens.push(id.to_string());
                }
            }
            if let Some(class) = form.value().attr("class") {
                tokens.extend(class.split_whitespace().map(|c| c.to_string()));
            }
            let pattern = if tokens.is_empty() {
                "(?i)[^}]*submit[^}]*".to_string()
            } else {
                format!("(?i)({})[^}}]*submit[^}}]*", tokens.join("|"))
            };
            if let Ok(re) = Regex::new(&pattern) {
                if let Some(redirect_re) = REDIRECT.as_ref() {
                    for m in re.find_iter(&doc.raw) {
                        if let Some(cap) = redirect_re.captures(m.as_str()) {
                            if is_thank_you_target(&cap[2]) {
                                return true;
                            }
                        }
                    }
                }
            }
        }
    }

    // Redirects and success messages in any script.
    if let Ok(script_sel) = scraper::Selector::parse("script") {
        for script in doc.doc.select(&script_sel) {
            let content = element_text(script);
            if let Some(redirect_re) = REDIRECT.as_ref() {
                for cap in redirect_re.captures_iter(&content) {
                    if is_thank_you_target(&cap[2]) {
                        return true;
                    }
                }
            }
            let content_lower = content.to_lowercase();
            if content_lower.contains("submit")
                && ["thank", "success", "спасибо", "teşekkür", "merci", "grazie"]
                    .iter()
                    .any(|kw| content_lower.contains(kw))
            {
                return true;
            }
        }
    }

    false
}

/// Evaluate every acknowledgment signal against one page.
pub fn page_signals(doc: &PageDoc) -> ThankYouSignals {
    let raw = &doc.raw_lower;
    let body_text = doc.body_text();

    let text = THANK_YOU_KEYWORDS.iter().any(|kw| body_text.contains(kw));

    let redirect = has_redirect_to_thank_you(doc);

    let mut modal = false;
    for selector in MODAL_SELECTORS {
        let element_text_lower = doc.text_of_all(selector);
        if !element_text_lower.is_empty()
            && THANK_YOU_KEYWORDS
                .iter()
                .any(|kw| element_text_lower.contains(kw))
        {
            modal = true;
            break;
        }
    }

    let modal_in_html = raw.contains("class=\"modal")
        || raw.contains("id=\"modal")
        || raw.contains("class=\"popup")
        || raw.contains("id=\"popup")
        || raw.contains("data-modal")
        || raw.contains("data-popup");

    let home_link =
        doc.matches("a[href*=\"index\"], a[href*=\"home\"], a[href*=\"/\"]");
    let link_text = doc.text_of_all("a, button");
    let home_button = home_link
        || HOME_BUTTON_KEYWORDS
            .iter()
            .any(|kw| body_text.contains(kw) || link_text.contains(kw));

    let success_icon = doc.matches(
        "[class*=\"success\"], [class*=\"check\"], [class*=\"tick\"], [class*=\"done\"]",
    ) || raw.contains("checkmark")
        || raw.contains("success-icon");

    let page_length = body_text.chars().count();
    let short_content = page_length > 50 && page_length < 2000;
    let minimal_nav = doc.count("nav a, header a") <= 3;

    ThankYouSignals {
        text,
        redirect,
        modal,
        modal_in_html,
        home_button,
        success_icon,
        short_minimal: short_content && minimal_nav,
    }
}

fn classify(signals: &ThankYouSignals) -> Option<ThankYouKind> {
    // Weighted rule.
    if thank_you_score(signals) >= THANK_YOU_SCORE_THRESHOLD {
        if signals.redirect && !signals.modal && !signals.modal_in_html {
            return Some(ThankYouKind::Page);
        }
        if signals.modal || signals.modal_in_html {
            return Some(ThankYouKind::Modal);
        }
        return Some(ThankYouKind::Page);
    }

    // Legacy rule, kept for its slightly different boundary conditions.
    if signals.redirect
        || (signals.modal && signals.text)
        || (signals.modal_in_html && signals.text && signals.home_button)
    {
        return Some(if signals.redirect && !signals.modal {
            ThankYouKind::Page
        } else {
            ThankYouKind::Modal
        });
    }
    if signals.text {
        if signals.modal || signals.modal_in_html {
            return Some(ThankYouKind::Modal);
        }
        if signals.home_button {
            return Some(ThankYouKind::Page);
        }
    }

    None
}

/// Detect the site's acknowledgment flow: a standalone page by filename,
/// else the first scanned page whose signals classify it.
pub fn locate_thank_you(fs: &dyn SiteFs, site_path: &Path) -> Option<ThankYouKind> {
    for name in THANK_YOU_PAGES {
        if fs.is_file(&site_path.join(name)) {
            return Some(ThankYouKind::Page);
        }
    }

    if let Ok(entries) = fs.read_dir(site_path) {
        for entry in &entries {
            if !(entry.name.ends_with(".html") || entry.name.ends_with(".htm")) {
                continue;
            }
            let doc = match read_html_file(fs, &entry.path) {
                Some(doc) => doc,
                None => continue,
            };
            let signals = page_signals(&doc);
            if let Some(kind) = classify(&signals) {
                return Some(kind);
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

    #[test]
    fn test_named_page_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("merci.html"), "<html></html>").unwrap();
        assert_eq!(
            locate_thank_you(&LocalFs, dir.path()),
            Some(ThankYouKind::Page)
        );
    }

    #[test]
    fn test_keyword_only_scores_as_page() {
        let doc = PageDoc::parse(
            "<html><body><p>Thank you for your order</p></body></html>".to_string(),
        );
        let signals = page_signals(&doc);
        assert!(signals.text);
        assert!(!signals.modal);
        assert_eq!(thank_you_score(&signals), 3);
        assert_eq!(classify(&signals), Some(ThankYouKind::Page));
    }

    #[test]
    fn test_modal_with_keyword_classifies_as_modal() {
        let doc = PageDoc::parse(
            r#"<html><body>
                <div class="modal" id="ok-modal"><p>Merci beaucoup !</p></div>
            </body></html>"#
                .to_string(),
        );
        let signals = page_signals(&doc);
        assert!(signals.modal);
        assert_eq!(classify(&signals), Some(ThankYouKind::Modal));
    }

    #[test]
    fn test_form_action_redirect() {
        let doc = PageDoc::parse(
            r#"<html><body><form action="merci.html">
                <input type="text" name="n"><button type="submit">Go</button>
            </form></body></html>"#
                .to_string(),
        );
        let signals = page_signals(&doc);
        assert!(signals.redirect);
    }

    #[test]
    fn test_script_redirect_legacy_rule() {
        // Redirect alone scores 2, below the threshold; the legacy rule
        // still accepts it.
        let doc = PageDoc::parse(
            r#"<html><head><script>
                function done() { window.location = 'thank-you.html'; }
            </script></head><body><p>formulaire envoye</p></body></html>"#
                .to_string(),
        );
        let signals = page_signals(&doc);
        assert!(signals.redirect);
        assert!(!signals.text);
        assert!(thank_you_score(&signals) < THANK_YOU_SCORE_THRESHOLD || signals.short_minimal);
        assert!(classify(&signals).is_some());
    }

    #[test]
    fn test_plain_page_not_classified() {
        let doc = PageDoc::parse(
            "<html><body><p>Nos services et prestations.</p></body></html>".to_string(),
        );
        assert_eq!(classify(&page_signals(&doc)), None);
    }
}
