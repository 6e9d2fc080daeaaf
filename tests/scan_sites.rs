use std::fs;
use std::path::Path;

use siteverif::fs_access::LocalFs;
use siteverif::report::generate_report;
use siteverif::scan::check_sites;

fn write_site_a(root: &Path) {
    let site = root.join("SiteA");
    fs::create_dir_all(site.join("img")).unwrap();
    for i in 1..=6 {
        fs::write(site.join("img").join(format!("photo{}.jpg", i)), b"jpg").unwrap();
    }

    let mut index = String::from(
        r#"<html><body>
        <section class="main-hero"><h1>Bienvenue</h1></section>
        <nav>
            <a href="contact.html">Contact</a>
            <a href="services.html">Services</a>
        </nav>
"#,
    );
    for i in 1..=6 {
        index.push_str(&format!("<img src=\"img/photo{}.jpg\">\n", i));
    }
    index.push_str("<footer><p>SiteA</p></footer></body></html>");
    fs::write(site.join("index.html"), index).unwrap();

    fs::write(
        site.join("contact.html"),
        r#"<html><body>
        <h1>Nous contacter</h1>
        <a href="tel:+15551784061">Appelez-nous</a>
        <a href="mailto:info@sitea.example">Ecrivez-nous</a>
        <form action="send.php">
            <input type="text" name="name">
            <input type="email" name="email">
            <textarea name="message"></textarea>
            <button type="submit">Envoyer</button>
        </form>
        </body></html>"#,
    )
    .unwrap();
}

#[test]
fn end_to_end_scan_and_report() {
    let root = tempfile::tempdir().unwrap();
    write_site_a(root.path());

    let results = check_sites(&LocalFs, root.path());
    assert_eq!(results.len(), 1);

    let site_a = &results[0];
    assert_eq!(site_a.site, "SiteA");
    assert!(site_a.exists);
    assert!(site_a.main_page);
    assert!(site_a.contact_page);
    assert!(site_a.contact_phone);
    assert!(site_a.contact_email);
    assert!(site_a.contact_form);
    assert_eq!(site_a.main_page_images, 6);
    assert!(site_a.main_page_images_min5);

    let (report, stats) = generate_report(&results, root.path(), false);
    assert!(report.contains("SiteA"));
    assert!(report.contains("✓"));
    assert!(report.contains(r#"class="stat ok">6<"#));
    assert_eq!(stats.total, 1);
    assert_eq!(stats.with_contact, 1);
    assert_eq!(stats.with_form, 1);
    assert_eq!(stats.with_main_page_images5, 1);
    assert!(stats.output.contains("With contact form: 1"));
}

#[test]
fn scan_twice_is_identical() {
    let root = tempfile::tempdir().unwrap();
    write_site_a(root.path());

    let first = check_sites(&LocalFs, root.path());
    let second = check_sites(&LocalFs, root.path());
    assert_eq!(first, second);
}

#[test]
fn asset_folders_are_not_sites() {
    let root = tempfile::tempdir().unwrap();
    write_site_a(root.path());
    fs::create_dir_all(root.path().join("css")).unwrap();
    fs::create_dir_all(root.path().join("node_modules")).unwrap();
    fs::create_dir_all(root.path().join(".cache")).unwrap();

    let results = check_sites(&LocalFs, root.path());
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].site, "SiteA");
}
