use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use docx_template_patch::container::DocxContainer;
use docx_template_patch::error::PatchError;
use docx_template_patch::inspect::{inspect_field, list_placeholders};
use docx_template_patch::patch::{patch_file, PatchSpec};

/// Wrap the table row(s) between two placeholders in template-engine loop
/// markers, editing `word/document.xml` inside the DOCX container in place.
#[derive(Parser, Debug)]
#[command(name = "patch-template")]
#[command(about = "Insert table-row loop markers into a DOCX template")]
struct Cli {
    /// Path to the .docx template
    path: PathBuf,

    /// Loop name to create, e.g. list_ubah
    #[arg(
        long = "loop",
        value_name = "NAME",
        required_unless_present_any = ["spec", "list_placeholders", "inspect"]
    )]
    loop_name: Option<String>,

    /// Logical field whose placeholder opens the repeat region
    #[arg(long, value_name = "FIELD", required_unless_present_any = ["spec", "list_placeholders", "inspect"])]
    start: Option<String>,

    /// Logical field whose placeholder closes the repeat region
    #[arg(long, value_name = "FIELD", required_unless_present_any = ["spec", "list_placeholders", "inspect"])]
    end: Option<String>,

    /// JSON patch spec file: {"loopName": ..., "startField": ..., "endField": ...}
    #[arg(long, value_name = "FILE", conflicts_with_all = ["loop_name", "start", "end"])]
    spec: Option<PathBuf>,

    /// Run the full pipeline, including validation, but write nothing
    #[arg(long)]
    dry_run: bool,

    /// List every placeholder in the template and exit
    #[arg(long)]
    list_placeholders: bool,

    /// Show match offset, row boundaries, and raw context for a field, then exit
    #[arg(long, value_name = "FIELD")]
    inspect: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<(), PatchError> {
    if cli.list_placeholders {
        let container = DocxContainer::open(&cli.path)?;
        for name in list_placeholders(container.body()) {
            println!("{}", name);
        }
        return Ok(());
    }

    if let Some(field) = &cli.inspect {
        let container = DocxContainer::open(&cli.path)?;
        let ctx = inspect_field(container.body(), field).ok_or_else(|| {
            PatchError::TemplateFieldNotFound {
                name: field.clone(),
            }
        })?;
        println!("{}", serde_json::to_string_pretty(&ctx).unwrap_or_default());
        return Ok(());
    }

    let spec = load_spec(&cli)?;
    info!(
        "patching {:?}: loop '{}' from '{}' to '{}'{}",
        cli.path,
        spec.loop_name,
        spec.start_field,
        spec.end_field,
        if cli.dry_run { " (dry run)" } else { "" }
    );

    let report = patch_file(&cli.path, &spec, cli.dry_run)?;
    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
    } else if report.body_changed {
        info!(
            "patched: open marker at {}, close marker at {}",
            report.open_marker_offset, report.close_marker_offset
        );
    } else {
        info!("already patched; document unchanged");
    }
    Ok(())
}

fn load_spec(cli: &Cli) -> Result<PatchSpec, PatchError> {
    if let Some(spec_path) = &cli.spec {
        let raw = std::fs::read_to_string(spec_path).map_err(|e| {
            PatchError::ContainerRead(format!("cannot read patch spec {:?}: {}", spec_path, e))
        })?;
        return serde_json::from_str(&raw).map_err(|e| {
            PatchError::ContainerRead(format!("invalid patch spec {:?}: {}", spec_path, e))
        });
    }

    // clap guarantees these are present when --spec is absent.
    match (&cli.loop_name, &cli.start, &cli.end) {
        (Some(loop_name), Some(start), Some(end)) => Ok(PatchSpec {
            loop_name: loop_name.clone(),
            start_field: start.clone(),
            end_field: end.clone(),
        }),
        _ => Err(PatchError::ContainerRead(
            "missing --loop/--start/--end (or --spec)".to_string(),
        )),
    }
}
