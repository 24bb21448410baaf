mod config;
mod engine;
mod report;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use config::EntityConfig;
use engine::model::{DocumentContent, ParsedDocument};
use engine::ExtractionEngine;
use report::EntityReport;

#[derive(Parser)]
#[command(
    name = "rfp_scout",
    about = "Heuristic extraction of procurement opportunities from saved web pages and PDF text"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract opportunities from saved documents and emit reports
    Extract {
        /// Sources config file ({ "entities": [ ... ] })
        #[arg(short, long, default_value = "config/sources.json")]
        config: PathBuf,
        /// Process only this entity id (default: every active entity)
        #[arg(short, long)]
        entity: Option<String>,
        /// Documents to process: .html/.htm parsed as HTML, anything else as
        /// PDF-extracted text with form-feed page breaks
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Summary)]
        format: ReportFormat,
        /// Directory for report files
        #[arg(short, long, default_value = "reports")]
        output_dir: PathBuf,
        /// Print reports to stdout instead of writing files
        #[arg(long)]
        print_only: bool,
    },
    /// Show detected blocks and per-block confidence for one document
    Inspect {
        /// Sources config file
        #[arg(short, long, default_value = "config/sources.json")]
        config: PathBuf,
        /// Entity id whose configuration to apply (default: first active)
        #[arg(short, long)]
        entity: Option<String>,
        input: PathBuf,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Json,
    Markdown,
    Summary,
    All,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            config,
            entity,
            inputs,
            format,
            output_dir,
            print_only,
        } => run_extract(&config, entity.as_deref(), &inputs, format, &output_dir, print_only),
        Commands::Inspect {
            config,
            entity,
            input,
        } => run_inspect(&config, entity.as_deref(), &input),
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn run_extract(
    config_path: &Path,
    entity_id: Option<&str>,
    inputs: &[PathBuf],
    format: ReportFormat,
    output_dir: &Path,
    print_only: bool,
) -> Result<()> {
    let entities = select_entities(config_path, entity_id)?;
    let documents = read_documents(inputs);
    if documents.is_empty() {
        bail!("no readable input documents");
    }

    let mut results = Vec::with_capacity(entities.len());
    for entity in entities {
        let name = entity.name.clone();
        let compiled = match entity.compile() {
            Ok(c) => c,
            Err(err) => {
                warn!(entity = %name, error = %err, "skipping entity with invalid configuration");
                continue;
            }
        };
        let engine = ExtractionEngine::new(compiled);
        let entity = engine.config().entity.clone();

        let docs: Vec<ParsedDocument> = documents
            .iter()
            .map(|(url, content)| ParsedDocument {
                content: content.clone(),
                source_url: url.clone(),
                entity_id: entity.id.clone(),
            })
            .collect();

        let pb = ProgressBar::new(docs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                .unwrap()
                .progress_chars("#>-"),
        );
        let found: Vec<_> = docs
            .par_iter()
            .map(|doc| {
                let opps = engine.process_document(doc);
                pb.inc(1);
                opps
            })
            .collect();
        pb.finish_and_clear();

        let opportunities = engine.aggregate(found.into_iter().flatten().collect());
        info!(
            entity = %entity.id,
            documents = docs.len(),
            opportunities = opportunities.len(),
            "entity processed"
        );
        results.push(EntityReport {
            entity,
            opportunities,
        });
    }

    if results.is_empty() {
        bail!("no entity could be processed");
    }
    emit_reports(&results, format, output_dir, print_only)
}

fn emit_reports(
    results: &[EntityReport],
    format: ReportFormat,
    output_dir: &Path,
    print_only: bool,
) -> Result<()> {
    if matches!(format, ReportFormat::Json | ReportFormat::All) {
        let json = report::render_json(results)?;
        if print_only {
            println!("{}", json);
        } else {
            let path = report::save(output_dir, &json, "json")?;
            println!("JSON report: {}", path.display());
        }
    }
    if matches!(format, ReportFormat::Markdown | ReportFormat::All) {
        let md = report::render_markdown(results);
        if print_only {
            println!("{}", md);
        } else {
            let path = report::save(output_dir, &md, "md")?;
            println!("Markdown report: {}", path.display());
        }
    }
    if matches!(format, ReportFormat::Summary | ReportFormat::All) {
        // The summary is console output either way.
        println!("{}", report::render_summary(results));
    }
    Ok(())
}

fn run_inspect(config_path: &Path, entity_id: Option<&str>, input: &Path) -> Result<()> {
    let entity = select_entities(config_path, entity_id)?
        .into_iter()
        .next()
        .context("no active entity in sources file")?;
    let engine = ExtractionEngine::new(entity.compile()?);

    let content = read_document(input)?;
    let doc = ParsedDocument {
        content,
        source_url: input.display().to_string(),
        entity_id: engine.config().entity.id.clone(),
    };

    let threshold = engine.config().entity.acceptance_threshold;
    let candidates = engine.candidates(&doc);
    println!(
        "{}: {} blocks (threshold {:.2}, entity {})",
        input.display(),
        candidates.len(),
        threshold,
        engine.config().entity.id
    );

    for (i, c) in candidates.iter().enumerate() {
        let marker = if c.confidence >= threshold { "+" } else { " " };
        let page = c
            .block
            .page
            .map(|p| format!(" p{}", p))
            .unwrap_or_default();
        let kinds: Vec<String> = c.fields.iter().map(|f| format!("{:?}", f.kind)).collect();
        println!(
            "{} #{:<3} conf {:.2}{}  [{}]",
            marker,
            i,
            c.confidence,
            page,
            kinds.join(", ")
        );
        println!("      {}", truncate(&c.block.text(), 100));
    }
    Ok(())
}

/// Load the sources file and pick the entities to run: the named one, or
/// every active entity when no id is given.
fn select_entities(config_path: &Path, entity_id: Option<&str>) -> Result<Vec<EntityConfig>> {
    let sources = config::load_sources(config_path)?;
    let entities: Vec<EntityConfig> = match entity_id {
        Some(id) => {
            let found: Vec<_> = sources.entities.into_iter().filter(|e| e.id == id).collect();
            if found.is_empty() {
                bail!("entity {:?} not found in {}", id, config_path.display());
            }
            found
        }
        None => sources.entities.into_iter().filter(|e| e.active).collect(),
    };
    if entities.is_empty() {
        bail!("no active entities in {}", config_path.display());
    }
    Ok(entities)
}

/// Read every input, logging and skipping unreadable files.
fn read_documents(inputs: &[PathBuf]) -> Vec<(String, DocumentContent)> {
    let mut documents = Vec::with_capacity(inputs.len());
    for path in inputs {
        match read_document(path) {
            Ok(content) => documents.push((path.display().to_string(), content)),
            Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable input"),
        }
    }
    documents
}

fn read_document(path: &Path) -> Result<DocumentContent> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_html = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
        .unwrap_or(false);
    Ok(if is_html {
        DocumentContent::Html(raw)
    } else {
        DocumentContent::PdfText(raw)
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let shortened: String = s.chars().take(max).collect();
        format!("{}...", shortened)
    }
}
