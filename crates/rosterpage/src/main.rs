//! `rosterpage` - CLI for rendering the participant page
//!
//! This binary renders the page, checks data files, and drives the download
//! gate against a rendered page from the command line.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;

use rosterpage::cli::{CheckCommand, Cli, Command, ConfigCommand, RenderCommand, UnlockCommand};
use rosterpage::config::{GateConfig, GateMessages};
use rosterpage::gate::{sanitize_code_input, DirectorySink, SiteFetcher};
use rosterpage::render::{scrape_download_targets, scrape_gate_settings};
use rosterpage::roster::RecordSchema;
use rosterpage::{
    group_records, init_logging, load_records, render_data_file, write_page, Config, Error,
    GateController, GateTarget, Rejection,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Render(render_cmd) => handle_render(&config, &render_cmd),
        Command::Check(check_cmd) => handle_check(&config, &check_cmd),
        Command::Unlock(unlock_cmd) => handle_unlock(&config, &unlock_cmd).await,
        Command::Config(config_cmd) => handle_config(&config, cli.config.as_deref(), config_cmd),
    }
}

fn handle_render(config: &Config, cmd: &RenderCommand) -> anyhow::Result<()> {
    let data = cmd.data.as_ref().unwrap_or(&config.data.path);
    let html = render_data_file(data, config)?;

    if cmd.stdout {
        std::io::stdout().write_all(html.as_bytes())?;
    } else {
        let output = cmd.output.as_ref().unwrap_or(&config.page.output_path);
        write_page(output, &html)?;
    }
    Ok(())
}

fn handle_check(config: &Config, cmd: &CheckCommand) -> anyhow::Result<()> {
    let data = cmd.data.as_ref().unwrap_or(&config.data.path);
    let records = load_records(data, &RecordSchema::new(config.gate.code_length))?;
    let record_count = records.len();
    let roster = group_records(records);

    if cmd.json {
        let schools: Vec<_> = roster
            .iter()
            .map(|(school, group)| {
                serde_json::json!({
                    "school": school,
                    "pdf_file": group.pdf_file,
                    "companions": group.companions.len(),
                })
            })
            .collect();
        let summary = serde_json::json!({
            "data_path": data.display().to_string(),
            "records": record_count,
            "school_count": roster.len(),
            "companion_count": roster.companion_count(),
            "schools": schools,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Data file:     {}", data.display());
        println!("Records:       {record_count}");
        println!("Schools:       {}", roster.len());
        println!("Companions:    {}", roster.companion_count());
        println!();
        for (school, group) in roster.iter() {
            println!(
                "  {school} ({}, {} companions)",
                group.pdf_file,
                group.companions.len()
            );
        }
    }
    Ok(())
}

async fn handle_unlock(config: &Config, cmd: &UnlockCommand) -> anyhow::Result<()> {
    let page_path = cmd.page.as_ref().unwrap_or(&config.page.output_path);
    let html = std::fs::read_to_string(page_path)
        .with_context(|| format!("cannot read page {}", page_path.display()))?;

    let targets = scrape_download_targets(&html);
    if targets.is_empty() {
        return Err(Error::page(page_path, "no download buttons found").into());
    }
    // The gate runs with the settings the page was rendered with
    let settings = scrape_gate_settings(&html)?
        .ok_or_else(|| Error::page(page_path, "no gate settings found"))?;
    let target = select_target(&targets, &cmd.name, cmd.pdf.as_deref())?;

    let code = match &cmd.code {
        Some(code) => code.clone(),
        None => prompt_code(config, &settings, target)?,
    };

    let messages = settings.messages.clone();
    let mut gate = GateController::new(settings);
    gate.open(target.clone());
    let request = gate
        .submit(&code)
        .map_err(|rejection| rejection_error(&messages, &rejection))?;

    let site = cmd.site.clone().unwrap_or_else(|| site_root(page_path));
    let saved = gate
        .download(&request, &SiteFetcher::new(site), &DirectorySink::new(&cmd.out))
        .await
        .map_err(|rejection| rejection_error(&messages, &rejection))?;

    println!("{}", saved.display());
    Ok(())
}

/// Pick the button for `name`, narrowed by `pdf` when names repeat.
fn select_target<'a>(
    targets: &'a [GateTarget],
    name: &str,
    pdf: Option<&str>,
) -> anyhow::Result<&'a GateTarget> {
    let matches: Vec<&GateTarget> = targets
        .iter()
        .filter(|t| t.companion_name == name)
        .filter(|t| pdf.map_or(true, |pdf| t.pdf_file == pdf))
        .collect();

    match matches.as_slice() {
        [] => bail!("no download button for {name:?}"),
        [target] => Ok(*target),
        [first, rest @ ..] if rest.iter().all(|t| t.pdf_file == first.pdf_file) => Ok(*first),
        _ => bail!("{name:?} appears under several PDF files; pass --pdf to choose one"),
    }
}

/// Read a code from stdin, filtered the way the page's code field filters
/// typed input.
fn prompt_code(
    config: &Config,
    settings: &GateConfig,
    target: &GateTarget,
) -> anyhow::Result<String> {
    let mut stderr = std::io::stderr();
    writeln!(
        stderr,
        "{}: {}",
        config.page.companion_label, target.companion_name
    )?;
    write!(stderr, "{} ", config.page.input_label)?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(sanitize_code_input(&line, settings.code_length))
}

fn rejection_error(messages: &GateMessages, rejection: &Rejection) -> anyhow::Error {
    match rejection.message(messages) {
        Some(message) => anyhow::anyhow!("{message} ({rejection})"),
        None => anyhow::anyhow!("{rejection}"),
    }
}

fn site_root(page_path: &Path) -> PathBuf {
    match page_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn handle_config(
    config: &Config,
    config_path: Option<&Path>,
    cmd: ConfigCommand,
) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Data]");
                println!("  Path:               {}", config.data.path.display());
                println!();
                println!("[Page]");
                println!("  Output path:        {}", config.page.output_path.display());
                println!("  Title:              {}", config.page.title);
                println!("  Language:           {}", config.page.lang);
                println!("  Stylesheet:         {}", config.page.stylesheet);
                println!();
                println!("[Gate]");
                println!("  Download dir:       {}", config.gate.download_dir);
                println!("  Code length:        {}", config.gate.code_length);
                println!("  Cooldown (ms):      {}", config.gate.cooldown_ms);
                println!("  Revoke delay (ms):  {}", config.gate.revoke_delay_ms);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.map_or_else(Config::default_config_path, Path::to_path_buf);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or_else(|| config_path.map(Path::to_path_buf))
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
