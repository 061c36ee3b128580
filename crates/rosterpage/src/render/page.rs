//! Page assembly: the school list, the verification modal and the gate script.

use std::fmt::Write;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::escape::{escape_html, unescape_html};
use crate::config::{Config, GateConfig, GateMessages, PageConfig};
use crate::error::Result;
use crate::gate::GateTarget;
use crate::roster::Roster;

const PAGE_CSS: &str = include_str!("../../assets/page.css");
const GATE_JS: &str = include_str!("../../assets/gate.js");

/// Settings handed to the browser gate script, embedded in the page as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScriptConfig {
    download_dir: String,
    code_length: usize,
    cooldown_ms: u64,
    revoke_delay_ms: u64,
    companion_label: String,
    messages: GateMessages,
}

impl ScriptConfig {
    fn from_config(config: &Config) -> Self {
        Self {
            download_dir: config.gate.download_dir.clone(),
            code_length: config.gate.code_length,
            cooldown_ms: config.gate.cooldown_ms,
            revoke_delay_ms: config.gate.revoke_delay_ms,
            companion_label: config.page.companion_label.clone(),
            messages: config.gate.messages.clone(),
        }
    }

    fn into_gate_config(self) -> GateConfig {
        GateConfig {
            download_dir: self.download_dir,
            code_length: self.code_length,
            cooldown_ms: self.cooldown_ms,
            revoke_delay_ms: self.revoke_delay_ms,
            messages: self.messages,
        }
    }
}

/// Render the school list: one block per school, one entry per companion.
///
/// # Errors
///
/// Returns an error only if formatting fails.
pub fn render_school_list(roster: &Roster, page: &PageConfig) -> Result<String> {
    let mut out = String::new();
    let label = escape_html(&page.companion_label);
    let button = escape_html(&page.button_label);

    for (school, group) in roster.iter() {
        let pdf = escape_html(&group.pdf_file);

        writeln!(out, "    <div class=\"school-item\">")?;
        writeln!(out, "        <h3>{}</h3>", escape_html(school))?;
        writeln!(out, "        <ul class=\"pendamping-list\">")?;
        for companion in &group.companions {
            let name = escape_html(&companion.name);
            writeln!(out, "            <li>")?;
            writeln!(out, "                <strong>{label}:</strong> {name}")?;
            writeln!(
                out,
                "                <button type=\"button\" class=\"download-btn\" data-pdf=\"{pdf}\" data-code=\"{}\" data-name=\"{name}\">{button}</button>",
                escape_html(&companion.code),
            )?;
            writeln!(out, "            </li>")?;
        }
        writeln!(out, "        </ul>")?;
        writeln!(out, "    </div>")?;
    }

    Ok(out)
}

/// Render the complete HTML document for `roster`.
///
/// # Errors
///
/// Returns an error if the gate settings cannot be serialized or formatting
/// fails.
pub fn render_page(roster: &Roster, config: &Config) -> Result<String> {
    let page = &config.page;
    let title = escape_html(&page.title);
    let mut out = String::new();

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"{}\">", escape_html(&page.lang))?;
    writeln!(out, "<head>")?;
    writeln!(out, "    <meta charset=\"UTF-8\">")?;
    writeln!(
        out,
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">"
    )?;
    writeln!(out, "    <title>{title}</title>")?;
    if !page.stylesheet.is_empty() {
        writeln!(
            out,
            "    <link rel=\"stylesheet\" href=\"{}\">",
            escape_html(&page.stylesheet)
        )?;
    }
    writeln!(out, "    <style>\n{PAGE_CSS}    </style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out)?;
    writeln!(out, "<h1>{title}</h1>")?;
    writeln!(out)?;
    writeln!(out, "<div class=\"school-list\">")?;
    out.push_str(&render_school_list(roster, page)?);
    writeln!(out, "</div>")?;
    writeln!(out)?;
    write_modal(&mut out, config)?;
    writeln!(out)?;
    writeln!(
        out,
        "<script type=\"application/json\" id=\"gate-config\">{}</script>",
        script_config_json(config)?
    )?;
    writeln!(out, "<script>\n{GATE_JS}</script>")?;
    writeln!(out)?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;

    Ok(out)
}

fn write_modal(out: &mut String, config: &Config) -> Result<()> {
    let page = &config.page;
    let length = config.gate.code_length;

    writeln!(out, "<div id=\"gate-modal\" class=\"modal\">")?;
    writeln!(out, "    <div class=\"modal-content\">")?;
    writeln!(out, "        <span class=\"close\" data-gate-close>&times;</span>")?;
    writeln!(out, "        <h3>{}</h3>", escape_html(&page.modal_title))?;
    writeln!(out, "        <p id=\"gate-companion\"></p>")?;
    writeln!(out, "        <p>{}</p>", escape_html(&page.modal_prompt))?;
    writeln!(out, "        <form id=\"gate-form\">")?;
    writeln!(
        out,
        "            <label for=\"gate-code\">{}</label>",
        escape_html(&page.input_label)
    )?;
    writeln!(
        out,
        "            <input type=\"text\" id=\"gate-code\" name=\"code\" inputmode=\"numeric\" autocomplete=\"off\" placeholder=\"{}\" maxlength=\"{length}\" required>",
        "X".repeat(length)
    )?;
    writeln!(out, "            <div id=\"gate-error\" class=\"error-message\"></div>")?;
    writeln!(
        out,
        "            <button type=\"submit\">{}</button>",
        escape_html(&page.submit_label)
    )?;
    writeln!(out, "        </form>")?;
    writeln!(out, "    </div>")?;
    writeln!(out, "</div>")?;
    Ok(())
}

/// Gate settings as JSON that is safe inside a `<script>` element.
fn script_config_json(config: &Config) -> Result<String> {
    let settings = ScriptConfig::from_config(config);
    // `<` can only appear inside JSON strings, where `\u003c` decodes to it
    Ok(serde_json::to_string(&settings)?.replace('<', "\\u003c"))
}

fn gate_config_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?s)<script type="application/json" id="gate-config">(.*?)</script>"#)
            .expect("gate config pattern is valid")
    })
}

/// Recover the gate settings a rendered page hands to its script.
///
/// Returns `Ok(None)` when the page carries no settings block.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if the block is not valid settings JSON.
pub fn scrape_gate_settings(html: &str) -> Result<Option<GateConfig>> {
    let Some(caps) = gate_config_pattern().captures(html) else {
        return Ok(None);
    };
    let settings: ScriptConfig = serde_json::from_str(&caps[1])?;
    Ok(Some(settings.into_gate_config()))
}

fn download_button_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"class="download-btn"\s+data-pdf="([^"]*)"\s+data-code="([^"]*)"\s+data-name="([^"]*)""#,
        )
        .expect("download button pattern is valid")
    })
}

/// Recover the gate targets from the download buttons of a rendered page.
///
/// Attribute values are unescaped the way a browser would expose them
/// through `dataset`.
#[must_use]
pub fn scrape_download_targets(html: &str) -> Vec<GateTarget> {
    download_button_pattern()
        .captures_iter(html)
        .map(|caps| GateTarget {
            pdf_file: unescape_html(&caps[1]).into_owned(),
            expected_code: unescape_html(&caps[2]).into_owned(),
            companion_name: unescape_html(&caps[3]).into_owned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{group_records, RegistrationRecord};

    fn sample_roster() -> Roster {
        group_records(vec![
            RegistrationRecord::new(
                "SMP <Harapan>",
                "smp \"harapan\".pdf",
                vec!["O'Neil & Co".to_string()],
                vec!["4321".to_string()],
            ),
            RegistrationRecord::new(
                "SMA 1",
                "sma1.pdf",
                vec!["Budi".to_string(), "Sari".to_string()],
                vec!["1234".to_string(), "5678".to_string()],
            ),
        ])
    }

    #[test]
    fn test_school_list_escapes_everything() {
        let html = render_school_list(&sample_roster(), &PageConfig::default()).unwrap();

        assert!(html.contains("<h3>SMP &lt;Harapan&gt;</h3>"));
        assert!(html.contains("data-pdf=\"smp &quot;harapan&quot;.pdf\""));
        assert!(html.contains("data-name=\"O&#039;Neil &amp; Co\""));
        assert!(html.contains("<strong>Pendamping:</strong> O&#039;Neil &amp; Co"));
        assert!(!html.contains("<Harapan>"));
    }

    #[test]
    fn test_school_list_order_and_entries() {
        let html = render_school_list(&sample_roster(), &PageConfig::default()).unwrap();

        let sma = html.find("<h3>SMA 1</h3>").unwrap();
        let smp = html.find("<h3>SMP &lt;Harapan&gt;</h3>").unwrap();
        assert!(sma < smp);
        assert_eq!(html.matches("<li>").count(), 3);
        assert_eq!(html.matches("class=\"school-item\"").count(), 2);

        let budi = html.find("data-name=\"Budi\"").unwrap();
        let sari = html.find("data-name=\"Sari\"").unwrap();
        assert!(budi < sari);
    }

    #[test]
    fn test_empty_roster_renders_empty_list() {
        let html = render_school_list(&Roster::default(), &PageConfig::default()).unwrap();
        assert!(html.is_empty());
    }

    #[test]
    fn test_page_shell() {
        let mut config = Config::default();
        config.page.title = "Daftar Peserta Bebras Challenge 2025".to_string();
        let html = render_page(&sample_roster(), &config).unwrap();

        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"id\">"));
        assert!(html.contains("<title>Daftar Peserta Bebras Challenge 2025</title>"));
        assert!(html.contains("<h1>Daftar Peserta Bebras Challenge 2025</h1>"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"style.css\">"));
        assert!(html.contains("<div id=\"gate-modal\" class=\"modal\">"));
        assert!(html.contains("maxlength=\"4\""));
        assert!(html.contains("placeholder=\"XXXX\""));
        assert!(html.contains("class GateController"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_gate_script_settles_only_the_pending_target() {
        let html = render_page(&Roster::default(), &Config::default()).unwrap();
        let download = &html[html.find("async download(target)").unwrap()..];
        let download = &download[..download.find("attach()").unwrap()];

        assert_eq!(download.matches("if (this.target === target)").count(), 2);
        assert!(!download.contains("this.target.pdf"));
    }

    #[test]
    fn test_page_without_stylesheet_link() {
        let mut config = Config::default();
        config.page.stylesheet = String::new();
        let html = render_page(&Roster::default(), &config).unwrap();
        assert!(!html.contains("<link rel=\"stylesheet\""));
    }

    #[test]
    fn test_script_config_embedded_safely() {
        let mut config = Config::default();
        config.gate.messages.wrong_code = "</script><script>alert(1)</script>".to_string();
        config.gate.cooldown_ms = 1500;

        let html = render_page(&Roster::default(), &config).unwrap();
        assert_eq!(html.matches("</script>").count(), 2);

        let start = html.find("id=\"gate-config\">").unwrap() + "id=\"gate-config\">".len();
        let end = start + html[start..].find("</script>").unwrap();
        let settings: serde_json::Value = serde_json::from_str(&html[start..end]).unwrap();
        assert_eq!(settings["cooldownMs"], 1500);
        assert_eq!(settings["downloadDir"], "pdf_files");
        assert_eq!(settings["codeLength"], 4);
        assert_eq!(settings["companionLabel"], "Pendamping");
        assert_eq!(
            settings["messages"]["wrong_code"],
            "</script><script>alert(1)</script>"
        );
    }

    #[test]
    fn test_scrape_round_trips_rendered_buttons() {
        let html = render_page(&sample_roster(), &Config::default()).unwrap();
        let targets = scrape_download_targets(&html);

        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].companion_name, "Budi");
        assert_eq!(targets[0].expected_code, "1234");
        assert_eq!(targets[0].pdf_file, "sma1.pdf");
        assert_eq!(targets[2].companion_name, "O'Neil & Co");
        assert_eq!(targets[2].pdf_file, "smp \"harapan\".pdf");
        assert_eq!(targets[2].expected_code, "4321");
    }

    #[test]
    fn test_scrape_gate_settings_from_rendered_page() {
        let mut config = Config::default();
        config.gate.download_dir = "berkas/pdf".to_string();
        config.gate.code_length = 6;
        config.gate.cooldown_ms = 250;
        config.gate.messages.wrong_code = "<b>Salah</b>".to_string();

        let html = render_page(&sample_roster(), &config).unwrap();
        let settings = scrape_gate_settings(&html).unwrap().unwrap();
        assert_eq!(settings, config.gate);
    }

    #[test]
    fn test_scrape_gate_settings_missing_block() {
        let html = "<html><body><script>var x = 1;</script></body></html>";
        assert!(scrape_gate_settings(html).unwrap().is_none());
    }

    #[test]
    fn test_scrape_gate_settings_malformed_block() {
        let html = r#"<script type="application/json" id="gate-config">{"downloadDir": 1}</script>"#;
        let err = scrape_gate_settings(html).unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));
    }

    #[test]
    fn test_scrape_page_without_buttons() {
        assert!(scrape_download_targets("<html><body></body></html>").is_empty());
    }
}
