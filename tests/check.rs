//! Site validation over a freshly built tree.

use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use warta::check::{Check, CheckError, run_checks};
use warta::config::{CategoryConfig, Site, SiteConfig};
use warta::gallery::BuildMode;
use warta::pipeline::Pipeline;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A site whose shared assets and listing pages exist, so every generated
/// link resolves.
fn built_site(root: &Path) -> Site {
    let mut config = SiteConfig::default();
    config.gallery.categories.push(CategoryConfig {
        slug: "kegiatan".into(),
        title: "Kegiatan".into(),
        tag: String::new(),
        narrative: String::new(),
    });
    let site = Site::new(root, config);

    for asset in ["assets/css/main.css", "assets/js/main.js", "assets/js/partials.js"] {
        write(&root.join(asset), "");
    }
    write(&root.join("assets/img/galeri/kegiatan/kegiatan-01.jpg"), "");
    write(&root.join("berita/index.html"), r#"<h1>Berita</h1><a href="/galeri/">Galeri</a>"#);
    write(
        &root.join("berita/data/a.json"),
        &json!({"title": "Rapat Kerja", "date_iso": "2025-02-01", "body": ["Isi."]}).to_string(),
    );
    write(
        &root.join("berita/data/b.json"),
        &json!({"title": "Bakti Sosial", "body": ["Isi."]}).to_string(),
    );

    let pipeline = Pipeline::new(site.clone()).unwrap();
    let report = pipeline.build_all(BuildMode::Report).unwrap();
    assert_eq!(report.failures(), 0);
    site
}

#[test]
fn built_site_passes_every_check() {
    let tmp = TempDir::new().unwrap();
    let site = built_site(tmp.path());

    let report = run_checks(&site).unwrap();
    assert_eq!(report.passed, Check::ALL.to_vec());
    // The undated record is advisory only.
    assert_eq!(report.warnings.len(), 1);
}

#[test]
fn broken_link_fails_the_links_check() {
    let tmp = TempDir::new().unwrap();
    let site = built_site(tmp.path());
    write(&tmp.path().join("kontak.html"), r#"<a href="/tidak-ada/">?</a>"#);

    match run_checks(&site) {
        Err(CheckError::Failed {
            check,
            total,
            sample,
        }) => {
            assert_eq!(check, Check::Links);
            assert_eq!(total, 1);
            assert_eq!(sample, vec!["kontak.html -> /tidak-ada/"]);
        }
        other => panic!("expected a links failure, got {other:?}"),
    }
}

#[test]
fn hand_edited_index_order_is_caught() {
    let tmp = TempDir::new().unwrap();
    let site = built_site(tmp.path());
    write(
        &site.news_index_path(),
        r#"[{"slug": "b", "date_iso": ""}, {"slug": "a", "date_iso": "2025-02-01"}]"#,
    );

    let err = run_checks(&site).unwrap_err();
    assert!(err.to_string().starts_with("news index order failed"), "{err}");
}
