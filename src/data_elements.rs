use scraper::{ElementRef, Selector};
use serde::Serialize;
use std::path::Path;

use crate::fs_access::SiteFs;
use crate::html::{element_text, read_html_file, PageDoc};

/// Per-kind element counts of one content page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ElementBreakdown {
    pub cards: usize,
    pub accordions: usize,
    pub faq: usize,
    pub tables: usize,
    pub lists: usize,
    pub articles: usize,
    pub testimonials: usize,
    pub statistics: usize,
    pub sections: usize,
}

impl ElementBreakdown {
    pub fn sum(&self) -> usize {
        self.cards
            + self.accordions
            + self.faq
            + self.tables
            + self.lists
            + self.articles
            + self.testimonials
            + self.statistics
            + self.sections
    }
}

/// Element counts of one page; `total` always equals the breakdown sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DataElementSummary {
    pub total: usize,
    pub breakdown: ElementBreakdown,
}

/// Ordered selector families. Within a category the first matching family
/// wins, so overlapping selectors do not double-count.
const CARD_SELECTORS: &[&str] = &[
    ".card",
    "[class*=\"card\"]",
    "[class*=\"Card\"]",
    ".game-card",
    ".article-card",
    ".testimonial-card",
    ".servizio-card",
    ".vantaggio-card",
    ".statistica-card",
    ".feature-card",
    ".product-card",
    ".service-card",
];

const ACCORDION_SELECTORS: &[&str] = &[
    ".accordion-item",
    ".accordion-content",
    "[class*=\"accordion-item\"]",
    "[class*=\"accordion-content\"]",
];

const FAQ_SELECTORS: &[&str] = &[
    "#faq",
    ".faq",
    "[class*=\"faq\"]",
    "[id*=\"faq\"]",
    ".faq-item",
    ".faq-question",
];

const ARTICLE_SELECTORS: &[&str] = &[
    "article",
    ".article",
    "[class*=\"article\"]",
    ".post",
    "[class*=\"post\"]",
    ".blog-post",
];

/// Testimonial families are cumulative (historical behavior).
const TESTIMONIAL_SELECTORS: &[&str] = &[
    ".testimonial",
    "[class*=\"testimonial\"]",
    ".review",
    "[class*=\"review\"]",
    ".testimonianza",
    "[class*=\"testimonianza\"]",
];

const STAT_SELECTORS: &[&str] = &[
    ".stat",
    "[class*=\"stat\"]",
    ".statistic",
    "[class*=\"statistic\"]",
    ".number",
    "[class*=\"counter\"]",
];

const SECTION_MIN_TEXT: usize = 200;
const LIST_MIN_ITEMS: usize = 3;

fn count_in(roots: &[ElementRef<'_>], selector: &str) -> usize {
    match Selector::parse(selector) {
        Ok(sel) => roots.iter().map(|root| root.select(&sel).count()).sum(),
        Err(_) => 0,
    }
}

fn first_family_count(roots: &[ElementRef<'_>], families: &[&str]) -> usize {
    for selector in families {
        let count = count_in(roots, selector);
        if count > 0 {
            return count;
        }
    }
    0
}

/// The "main content" region of a page: an explicit `<main>`, else the
/// siblings between `<header>` and `<footer>`, else the body children
/// without header and footer.
fn content_region<'a>(doc: &'a PageDoc) -> Vec<ElementRef<'a>> {
    if let Some(main) = doc.first("main") {
        return vec![main];
    }

    let header = doc.first("header");
    let footer = doc.first("footer");
    if let (Some(header), Some(_)) = (header, footer) {
        let mut roots = Vec::new();
        for node in header.next_siblings() {
            if let Some(el) = ElementRef::wrap(node) {
                if el.value().name() == "footer" {
                    break;
                }
                roots.push(el);
            }
        }
        if !roots.is_empty() {
            return roots;
        }
    }

    match doc.first("body") {
        Some(body) => body
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() != "header" && el.value().name() != "footer")
            .collect(),
        None => Vec::new(),
    }
}

fn in_thead(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "thead")
}

/// Count the data elements of one page, within its main content region.
pub fn count_data_elements(fs: &dyn SiteFs, page_path: &Path) -> DataElementSummary {
    let doc = match read_html_file(fs, page_path) {
        Some(doc) => doc,
        None => return DataElementSummary::default(),
    };
    summarize_page(&doc)
}

pub fn summarize_page(doc: &PageDoc) -> DataElementSummary {
    let roots = content_region(doc);
    let mut breakdown = ElementBreakdown::default();

    breakdown.cards = first_family_count(&roots, CARD_SELECTORS);

    breakdown.accordions = first_family_count(&roots, ACCORDION_SELECTORS);
    if breakdown.accordions == 0 {
        // Fall back to counting items per accordion container.
        if let (Ok(container_sel), Ok(item_sel)) = (
            Selector::parse(".accordion, [class*=\"accordion\"]"),
            Selector::parse(".accordion-item, [class*=\"accordion-item\"]"),
        ) {
            for root in &roots {
                for container in root.select(&container_sel) {
                    breakdown.accordions += container.select(&item_sel).count();
                }
            }
        }
    }

    breakdown.faq = first_family_count(&roots, FAQ_SELECTORS);

    if let Ok(table_sel) = Selector::parse("table") {
        if let Ok(tr_sel) = Selector::parse("tr") {
            for root in &roots {
                for table in root.select(&table_sel) {
                    let rows = table.select(&tr_sel).filter(|tr| !in_thead(*tr)).count();
                    if rows > 0 {
                        breakdown.tables += 1;
                    }
                }
            }
        }
    }

    if let (Ok(list_sel), Ok(li_sel)) = (Selector::parse("ul, ol"), Selector::parse("li")) {
        for root in &roots {
            for list in root.select(&list_sel) {
                if list.select(&li_sel).count() >= LIST_MIN_ITEMS {
                    breakdown.lists += 1;
                }
            }
        }
    }

    breakdown.articles = first_family_count(&roots, ARTICLE_SELECTORS);

    for selector in TESTIMONIAL_SELECTORS {
        breakdown.testimonials += count_in(&roots, selector);
    }

    breakdown.statistics = first_family_count(&roots, STAT_SELECTORS);

    if let (Ok(section_sel), Ok(nested_sel)) = (
        Selector::parse("section"),
        Selector::parse(".card, .accordion, table, ul li, article"),
    ) {
        for root in &roots {
            for section in root.select(&section_sel) {
                let text = element_text(section);
                let has_content = text.trim().chars().count() > SECTION_MIN_TEXT;
                let has_elements = section.select(&nested_sel).next().is_some();
                if has_content || has_elements {
                    breakdown.sections += 1;
                }
            }
        }
    }

    DataElementSummary {
        total: breakdown.sum(),
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> PageDoc {
        PageDoc::parse(format!("<html><body>{}</body></html>", body))
    }

    #[test]
    fn test_total_equals_breakdown_sum() {
        let doc = parse(
            r#"<main>
                <div class="card">a</div><div class="card">b</div>
                <ul><li>1</li><li>2</li><li>3</li></ul>
                <table><tr><td>x</td></tr></table>
            </main>"#,
        );
        let summary = summarize_page(&doc);
        assert_eq!(summary.total, summary.breakdown.sum());
        assert_eq!(summary.breakdown.cards, 2);
        assert_eq!(summary.breakdown.lists, 1);
        assert_eq!(summary.breakdown.tables, 1);
    }

    #[test]
    fn test_first_card_family_wins() {
        // `.card` and `[class*="card"]` overlap; only one family counts.
        let doc = parse(r#"<main><div class="card product-card">x</div></main>"#);
        assert_eq!(summarize_page(&doc).breakdown.cards, 1);
    }

    #[test]
    fn test_region_excludes_header_and_footer() {
        let doc = parse(
            r#"<header><div class="card">nav card</div></header>
               <section><div class="card">content card</div></section>
               <footer><div class="card">footer card</div></footer>"#,
        );
        assert_eq!(summarize_page(&doc).breakdown.cards, 1);
    }

    #[test]
    fn test_main_region_preferred() {
        let doc = parse(
            r#"<header></header>
               <div class="card">outside</div>
               <main><div class="card">inside</div></main>
               <footer></footer>"#,
        );
        assert_eq!(summarize_page(&doc).breakdown.cards, 1);
    }

    #[test]
    fn test_short_list_and_empty_table_ignored() {
        let doc = parse(
            r#"<main>
                <ul><li>1</li><li>2</li></ul>
                <table><thead><tr><th>h</th></tr></thead></table>
            </main>"#,
        );
        let summary = summarize_page(&doc);
        assert_eq!(summary.breakdown.lists, 0);
        assert_eq!(summary.breakdown.tables, 0);
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn test_accordion_container_fallback() {
        let doc = parse(
            r#"<main><div class="accordion">
                <div class="item-a">x</div><div class="item-b">y</div>
            </div></main>"#,
        );
        // No accordion-item classes at all: nothing to count.
        assert_eq!(summarize_page(&doc).breakdown.accordions, 0);

        let doc = parse(
            r#"<main><div class="accordion-group">
                <div class="accordion-item">x</div><div class="accordion-item">y</div>
            </div></main>"#,
        );
        assert_eq!(summarize_page(&doc).breakdown.accordions, 2);
    }

    #[test]
    fn test_content_section_threshold() {
        let long_text = "mot ".repeat(80);
        let doc = parse(&format!("<main><section>{}</section></main>", long_text));
        assert_eq!(summarize_page(&doc).breakdown.sections, 1);

        let doc = parse("<main><section>court</section></main>");
        assert_eq!(summarize_page(&doc).breakdown.sections, 0);
    }
}
