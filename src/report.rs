use serde::Serialize;
use std::path::Path;

use crate::scan::SiteResult;
use crate::thank_you::ThankYouKind;

/// Aggregate pass counts over one scan, plus the console summary text.
#[derive(Debug, Clone, Serialize)]
pub struct ScanStats {
    pub total: usize,
    pub existing: usize,
    #[serde(rename = "withMain")]
    pub with_main: usize,
    #[serde(rename = "withContact")]
    pub with_contact: usize,
    #[serde(rename = "withFavicon")]
    pub with_favicon: usize,
    #[serde(rename = "withThankYou")]
    pub with_thank_you: usize,
    #[serde(rename = "withImages5")]
    pub with_images5: usize,
    #[serde(rename = "withMainPageImages5")]
    pub with_main_page_images5: usize,
    #[serde(rename = "withMap")]
    pub with_map: usize,
    #[serde(rename = "withForm")]
    pub with_form: usize,
    #[serde(skip)]
    pub output: String,
}

impl ScanStats {
    pub fn from_results(results: &[SiteResult]) -> Self {
        let count = |f: fn(&SiteResult) -> bool| results.iter().filter(|r| f(r)).count();
        let existing = count(|r| r.exists);
        let with_main = count(|r| r.main_page);
        let with_contact = count(|r| r.contact_page);
        let with_favicon = count(|r| r.favicon);
        let with_thank_you = count(|r| r.thank_you_page);
        let with_images5 = count(|r| r.images_min5);
        let with_main_page_images5 = count(|r| r.main_page_images_min5);
        let with_map = count(|r| r.contact_map);
        let with_form = count(|r| r.contact_form);
        let output = format!(
            "Total sites: {}\nExisting: {}\nWith main page: {}\nWith contact page: {}\n\
             With favicon: {}\nWith thank you page: {}\nWith ≥5 images (total): {}\n\
             With ≥5 images on main page: {}\nWith contact map: {}\nWith contact form: {}",
            results.len(),
            existing,
            with_main,
            with_contact,
            with_favicon,
            with_thank_you,
            with_images5,
            with_main_page_images5,
            with_map,
            with_form,
        );
        ScanStats {
            total: results.len(),
            existing,
            with_main,
            with_contact,
            with_favicon,
            with_thank_you,
            with_images5,
            with_main_page_images5,
            with_map,
            with_form,
            output,
        }
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn js_escape(s: &str) -> String {
    s.replace('\\', "/").replace('\'', "\\'")
}

/// Percent-encode one URL component (space as %20).
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn mark(ok: bool) -> (&'static str, &'static str) {
    if ok {
        ("ok", "✓")
    } else {
        ("fail", "✗")
    }
}

/// Iframe target of one site row.
fn site_view_url(result: &SiteResult, base_path: &Path, server_mode: bool) -> String {
    let main_file = result
        .main_page_path
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "index.html".to_string());
    if server_mode {
        format!(
            "/sites/{}/{}?basePath={}",
            encode_component(&result.site),
            main_file,
            encode_component(&base_path.to_string_lossy())
        )
    } else {
        // The report file sits in the scan root; the site folder is a
        // sibling of it.
        format!("{}/{}", result.site, main_file)
    }
}

fn favicon_url(result: &SiteResult, base_path: &Path, server_mode: bool) -> Option<String> {
    let relative = result.favicon_relative_path.clone().or_else(|| {
        let path = result.favicon_path.as_ref()?;
        let full = Path::new(path);
        match full.strip_prefix(&result.site_path) {
            Ok(rel) => Some(rel.to_string_lossy().replace('\\', "/")),
            Err(_) => Some(path.clone()),
        }
    })?;
    // Externally hosted and inline icons are usable as-is.
    if relative.starts_with("http://")
        || relative.starts_with("https://")
        || relative.starts_with("data:")
    {
        return Some(relative);
    }
    if server_mode {
        Some(format!(
            "/sites/{}/{}?basePath={}",
            encode_component(&result.site),
            relative,
            encode_component(&base_path.to_string_lossy())
        ))
    } else {
        Some(format!("{}/{}", result.site, relative))
    }
}

/// Render the scan results into one self-contained HTML report.
///
/// `server_mode` switches the preview frames to the `/sites` proxy route;
/// otherwise relative paths are emitted so the file works opened from disk.
pub fn generate_report(
    results: &[SiteResult],
    base_path: &Path,
    server_mode: bool,
) -> (String, ScanStats) {
    let stats = ScanStats::from_results(results);
    let date = chrono::Local::now().format("%d/%m/%Y %H:%M:%S");

    let mut html = String::with_capacity(64 * 1024);
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Rapport de verification des sites</title>
<style>
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
html, body {{ width: 100%; height: 100%; overflow: hidden; }}
body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #0a0a0a;
       color: #e0e0e0; display: flex; flex-direction: column; }}
.header {{ background: #1a1a1a; padding: 15px 20px; border-bottom: 2px solid #2a2a2a;
          display: flex; justify-content: space-between; align-items: center; flex-shrink: 0; }}
.header h1 {{ color: #d4af37; font-size: 1.5em; }}
.date-info {{ color: #999; font-size: 0.9em; }}
.summary {{ background: #141414; padding: 8px 20px; color: #999; font-size: 0.85em;
           border-bottom: 1px solid #2a2a2a; flex-shrink: 0; }}
.content {{ flex: 1; overflow: auto; padding: 20px; }}
table {{ width: 100%; border-collapse: collapse; background: #1a1a1a; font-size: 0.9em; }}
th {{ background: #2a2a2a; color: #d4af37; padding: 8px 6px; text-align: center;
     font-size: 0.75em; position: sticky; top: 0; z-index: 10; line-height: 1.3; }}
td {{ padding: 10px 8px; border-bottom: 1px solid #333; white-space: nowrap; }}
tr:hover {{ background: #222; }}
.ok {{ color: #4caf50; font-weight: bold; }}
.fail {{ color: #f44336; font-weight: bold; }}
.stat {{ text-align: center; font-weight: bold; }}
.site-name {{ font-weight: bold; position: sticky; left: 0; background: #1a1a1a; z-index: 5;
             padding-left: 20px; display: flex; align-items: center; gap: 8px; }}
.site-favicon {{ width: 20px; height: 20px; object-fit: contain; }}
.pages-cell {{ text-align: left; font-size: 0.7em; max-width: 400px; white-space: normal; }}
.view-btn {{ background: linear-gradient(135deg, #2196F3, #0b7dda); color: white; border: none;
            padding: 6px 12px; border-radius: 4px; cursor: pointer; font-weight: bold; }}
.modal {{ display: none; position: fixed; inset: 0; z-index: 999999; background: #000; }}
.modal.active {{ display: flex; align-items: stretch; justify-content: center; }}
.modal-content {{ background: #1a1a1a; width: 100%; max-width: 430px; height: 100%;
                 display: flex; flex-direction: column; transition: max-width 0.3s ease; }}
.modal-content.fullscreen {{ max-width: 100%; }}
.modal-header {{ padding: 8px 12px; border-bottom: 2px solid #2a2a2a; display: flex;
                justify-content: space-between; align-items: center; }}
.modal-header h2 {{ color: #d4af37; font-size: 0.9em; font-weight: normal; }}
.modal-header button {{ color: white; border: none; padding: 6px 12px; border-radius: 4px;
                       cursor: pointer; font-size: 0.75em; margin-left: 8px; }}
.fullscreen-btn, .refresh-btn {{ background: #4CAF50; }}
.close-btn {{ background: #f44336; }}
.mobile-iframe {{ width: 100%; height: 100%; border: none; background: white; flex: 1; }}
</style>
</head>
<body>
<div class="header">
  <h1>Rapport de verification de structure des sites</h1>
  <div class="date-info">Date : {date}</div>
</div>
<div class="summary">{total} sites : {existing} existants, {main} avec page d'accueil,
 {contact} avec page contacts, {favicon} avec favicon, {thanks} avec page de remerciement,
 {images} avec ≥5 images sur l'accueil, {map} avec carte, {form} avec formulaire</div>
<div class="content"><table>
<tr>
  <th>Site</th><th>Apercu</th><th>Contacts</th><th>Documents</th><th>Images</th>
  <th>Accueil :<br>images</th><th>Favicon</th><th>Carte</th><th>Formulaire</th>
  <th>Merci</th><th>Type<br>"Merci"</th><th>Docs<br>footer</th><th>Elements<br>par page</th>
</tr>
"#,
        date = date,
        total = stats.total,
        existing = stats.existing,
        main = stats.with_main,
        contact = stats.with_contact,
        favicon = stats.with_favicon,
        thanks = stats.with_thank_you,
        images = stats.with_main_page_images5,
        map = stats.with_map,
        form = stats.with_form,
    ));

    for result in results {
        let (contact_class, contact_sym) = mark(result.contact_page);
        let (main_images_class, _) = mark(result.main_page_images_min5);
        let (favicon_class, favicon_sym) = mark(result.favicon);
        let (map_class, map_sym) = mark(result.contact_map);
        let (form_class, form_sym) = mark(result.contact_form);
        let (thanks_class, thanks_sym) = mark(result.thank_you_page);
        let (footer_class, footer_sym) = mark(result.footer_documents);
        let thanks_type = match result.thank_you_page_type {
            Some(ThankYouKind::Page) => "Page",
            Some(ThankYouKind::Modal) => "Popup",
            None => "-",
        };

        let view_url = site_view_url(result, base_path, server_mode);
        let favicon_img = favicon_url(result, base_path, server_mode)
            .map(|url| {
                format!(
                    r#"<img src="{}" alt="" class="site-favicon" onerror="this.style.display='none'">"#,
                    html_escape(&url)
                )
            })
            .unwrap_or_default();

        let pages_cell = if result.pages_data_elements.is_empty() {
            "-".to_string()
        } else {
            result
                .pages_data_elements
                .iter()
                .map(|(page, data)| {
                    format!("<strong>{}</strong> - {}", html_escape(page), data.total)
                })
                .collect::<Vec<_>>()
                .join("<br>")
        };

        html.push_str(&format!(
            r#"<tr>
  <td class="site-name">{favicon_img}{site}</td>
  <td class="stat"><button class="view-btn" onclick="openMobileView('{view_url}', '{site_js}')">Apercu</button></td>
  <td class="stat {contact_class}">{contact_sym}</td>
  <td class="stat">{documents}</td>
  <td class="stat">{images}</td>
  <td class="stat {main_images_class}">{main_images}</td>
  <td class="stat {favicon_class}">{favicon_sym}</td>
  <td class="stat {map_class}">{map_sym}</td>
  <td class="stat {form_class}">{form_sym}</td>
  <td class="stat {thanks_class}">{thanks_sym}</td>
  <td class="stat">{thanks_type}</td>
  <td class="stat {footer_class}">{footer_sym}</td>
  <td class="stat pages-cell">{pages_cell}</td>
</tr>
"#,
            favicon_img = favicon_img,
            site = html_escape(&result.site),
            view_url = js_escape(&view_url),
            site_js = js_escape(&result.site),
            contact_class = contact_class,
            contact_sym = contact_sym,
            documents = result.documents,
            images = result.images,
            main_images_class = main_images_class,
            main_images = result.main_page_images,
            favicon_class = favicon_class,
            favicon_sym = favicon_sym,
            map_class = map_class,
            map_sym = map_sym,
            form_class = form_class,
            form_sym = form_sym,
            thanks_class = thanks_class,
            thanks_sym = thanks_sym,
            thanks_type = thanks_type,
            footer_class = footer_class,
            footer_sym = footer_sym,
            pages_cell = pages_cell,
        ));
    }

    html.push_str(
        r#"</table></div>
<div id="mobileModal" class="modal">
  <div class="modal-content">
    <div class="modal-header">
      <h2 id="modalTitle"></h2>
      <div>
        <button class="refresh-btn" onclick="refreshMobileView()">Actualiser</button>
        <button class="fullscreen-btn" id="fullscreenBtn" onclick="toggleFullscreen()">Vue PC</button>
        <button class="close-btn" onclick="closeMobileView()">Fermer</button>
      </div>
    </div>
    <iframe id="mobileIframe" class="mobile-iframe" src=""></iframe>
  </div>
</div>
<script>
function openMobileView(sitePath, siteName) {
  document.getElementById('modalTitle').textContent = siteName;
  document.getElementById('mobileIframe').src = sitePath;
  document.querySelector('.modal-content').classList.remove('fullscreen');
  document.getElementById('mobileModal').classList.add('active');
}
function refreshMobileView() {
  var iframe = document.getElementById('mobileIframe');
  var src = iframe.src;
  iframe.src = '';
  setTimeout(function() { iframe.src = src; }, 100);
}
function toggleFullscreen() {
  var content = document.querySelector('.modal-content');
  var btn = document.getElementById('fullscreenBtn');
  content.classList.toggle('fullscreen');
  btn.textContent = content.classList.contains('fullscreen') ? 'Vue mobile' : 'Vue PC';
}
function closeMobileView() {
  document.getElementById('mobileModal').classList.remove('active');
  document.getElementById('mobileIframe').src = '';
}
document.getElementById('mobileModal').addEventListener('click', function(e) {
  if (e.target === this) { closeMobileView(); }
});
document.addEventListener('keydown', function(e) {
  if (e.key === 'Escape') { closeMobileView(); }
});
</script>
</body></html>
"#,
    );

    (html, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing_result(name: &str) -> SiteResult {
        SiteResult {
            site: name.to_string(),
            exists: true,
            main_page: true,
            contact_page: true,
            contact_phone: true,
            contact_email: true,
            contact_form: true,
            main_page_images: 6,
            main_page_images_min5: true,
            ..SiteResult::default()
        }
    }

    #[test]
    fn test_stats_counts() {
        let results = vec![passing_result("SiteA"), SiteResult::default()];
        let stats = ScanStats::from_results(&results);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.existing, 1);
        assert_eq!(stats.with_contact, 1);
        assert_eq!(stats.with_form, 1);
        assert!(stats.output.contains("Total sites: 2"));
    }

    #[test]
    fn test_report_contains_row_and_marks() {
        let results = vec![passing_result("SiteA")];
        let (html, _) = generate_report(&results, Path::new("/tmp/sites"), false);
        assert!(html.contains("SiteA"));
        // Contacts, favicon absent, form: check/cross marks present.
        assert!(html.contains("✓"));
        assert!(html.contains("✗"));
        assert!(html.contains("SiteA/index.html"));
    }

    #[test]
    fn test_server_mode_urls() {
        let results = vec![passing_result("Site A")];
        let (html, _) = generate_report(&results, Path::new("/tmp/sites"), true);
        assert!(html.contains("/sites/Site%20A/index.html?basePath=%2Ftmp%2Fsites"));
    }

    #[test]
    fn test_site_name_escaped() {
        let mut result = passing_result("Site<&>");
        result.site = "Site<&>".to_string();
        let (html, _) = generate_report(&[result], Path::new("/tmp"), false);
        assert!(html.contains("Site&lt;&amp;&gt;"));
    }
}
