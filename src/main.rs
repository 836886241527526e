// sn2n-convert: convert an HTML file into blocks and optionally commit it.
//
// Without --commit the block tree is printed as host wire JSON. With --commit
// the document is written under the given parent page using NOTION_TOKEN, or
// into an in-memory host when --dry-run is set.

use anyhow::{Context, Result, bail};
use serde_json::json;
use sn2n::{
    Config, Container, DocumentPipeline, MemoryHost, NotionClient, Parent, blocks::blocks_to_wire,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: sn2n-convert <file.html> [--commit <parent_page_id>] [--title <title>] \
[--base-url <url>] [--config <config.json>] [--dry-run]";

#[derive(Debug, Default)]
struct Args {
    input: PathBuf,
    parent: Option<String>,
    title: Option<String>,
    base_url: Option<String>,
    config: Option<PathBuf>,
    dry_run: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut input = None;
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--commit" => args.parent = Some(iter.next().context("--commit needs a page id")?),
            "--title" => args.title = Some(iter.next().context("--title needs a value")?),
            "--base-url" => args.base_url = Some(iter.next().context("--base-url needs a value")?),
            "--config" => args.config = Some(iter.next().context("--config needs a path")?.into()),
            "--dry-run" => args.dry_run = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown flag {other}\n{USAGE}"),
            other => input = Some(PathBuf::from(other)),
        }
    }

    args.input = input.context(USAGE)?;
    Ok(args)
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(base) = &args.base_url {
        config.conversion.base_url = Some(base.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let config = load_config(&args)?;
    let html = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let Some(parent) = args.parent.clone() else {
        let conversion = sn2n::convert_html_to_blocks(&html, &config.conversion);
        for warning in &conversion.warnings {
            tracing::warn!(%warning, "conversion warning");
        }
        println!("{}", serde_json::to_string_pretty(&blocks_to_wire(&conversion.blocks))?);
        return Ok(());
    };

    let title = args.title.clone().unwrap_or_else(|| {
        args.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Untitled".to_string())
    });
    let container = Container::NewPage {
        parent: Parent::Page(parent),
        properties: json!({ "title": { "title": [{ "text": { "content": title } }] } }),
    };

    let report = if args.dry_run {
        let pipeline = DocumentPipeline::with_external_images(MemoryHost::new(), config);
        let report = pipeline.commit_document(&container, &html).await?;
        let tree = pipeline.host().tree(&report.page_id);
        println!("{}", serde_json::to_string_pretty(&blocks_to_wire(&tree))?);
        report
    } else {
        let client = NotionClient::from_env().context("building host client")?;
        let pipeline = DocumentPipeline::with_external_images(client, config);
        pipeline.commit_document(&container, &html).await?
    };

    for warning in report.conversion_warnings.iter().map(ToString::to_string) {
        tracing::warn!(%warning, "conversion warning");
    }
    for warning in report.warnings.iter().map(ToString::to_string) {
        tracing::warn!(%warning, "commit warning");
    }
    eprintln!(
        "committed {} blocks to {} in {} calls ({} relocations)",
        report.blocks_committed,
        report.url.as_deref().unwrap_or(&report.page_id),
        report.calls,
        report.relocations_resolved,
    );
    Ok(())
}
