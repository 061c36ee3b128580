//! HTML rendering of the roster.
//!
//! The page is a single self-contained document: the school list, the
//! verification modal, the gate settings as embedded JSON and the gate script.

mod escape;
mod page;

use std::path::Path;

use tracing::info;

pub use escape::{escape_html, unescape_html};
pub use page::{render_page, render_school_list, scrape_download_targets, scrape_gate_settings};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::roster::{group_records, load_records, RecordSchema};

/// Load `data_path`, group it by school and render the page.
///
/// # Errors
///
/// Returns the loader's error if the data file cannot be read, parsed or
/// validated; nothing is rendered in that case.
pub fn render_data_file(data_path: impl AsRef<Path>, config: &Config) -> Result<String> {
    let schema = RecordSchema::new(config.gate.code_length);
    let records = load_records(data_path, &schema)?;
    let roster = group_records(records);
    info!(
        schools = roster.len(),
        companions = roster.companion_count(),
        "Rendering page"
    );
    render_page(&roster, config)
}

/// Write a rendered page to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or the file cannot be
/// written.
pub fn write_page(path: impl AsRef<Path>, html: &str) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    std::fs::write(path, html).map_err(|source| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), bytes = html.len(), "Wrote page");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_data_file_groups_shared_school() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data_sekolah.json");
        std::fs::write(
            &data,
            r#"[
                {"sekolah": "SMA 1", "pdf_file": "sma1.pdf", "pendamping": ["Budi"], "verification_codes": ["1234"]},
                {"sekolah": "SD 7", "pdf_file": "sd7.pdf", "pendamping": ["Rina"], "verification_codes": ["0007"]},
                {"sekolah": "SMA 1", "pdf_file": "sma1.pdf", "pendamping": ["Sari"], "verification_codes": ["5678"]}
            ]"#,
        )
        .unwrap();

        let html = render_data_file(&data, &Config::default()).unwrap();
        assert_eq!(html.matches("<h3>SMA 1</h3>").count(), 1);
        assert!(html.find("<h3>SD 7</h3>").unwrap() < html.find("<h3>SMA 1</h3>").unwrap());

        let targets = scrape_download_targets(&html);
        let names: Vec<&str> = targets.iter().map(|t| t.companion_name.as_str()).collect();
        assert_eq!(names, vec!["Rina", "Budi", "Sari"]);
    }

    #[test]
    fn test_render_data_file_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data_sekolah.json");
        std::fs::write(&data, "[{\"sekolah\": ").unwrap();

        let err = render_data_file(&data, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::DataParse { .. }));
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_write_page_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public").join("index.html");

        write_page(&path, "<html></html>").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html></html>");
    }

    #[test]
    fn test_write_page_to_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_page(dir.path(), "<html></html>").unwrap_err();
        assert!(matches!(err, Error::OutputWrite { .. }));
    }
}
