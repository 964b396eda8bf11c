//! CLI binary for alto-searchable-pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, renders progress, and turns the error class into the
//! process exit code.

use alto_searchable_pdf::{
    convert, resolve_only, ErrorClass, ImageBackend, OutputNaming, PipelineConfig,
    PipelineProgressCallback, ProgressCallback, SearchablePdfError, Stage, ToolCommand,
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One bar, re-styled per stage: a spinner for whole-object stages and a
/// page counter for per-page ones.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Instant>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            stage_started: Mutex::new(Instant::now()),
        })
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS)
    }

    fn pages_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS)
    }
}

impl PipelineProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage, total_items: usize) {
        let per_page = matches!(stage, Stage::Transform | Stage::ConvertImages);
        self.bar.set_style(if per_page {
            Self::pages_style()
        } else {
            Self::spinner_style()
        });
        self.bar.set_prefix(stage.label());
        self.bar.set_length(total_items as u64);
        self.bar.set_position(0);
        self.bar.reset_eta();
        self.bar.set_message("");
        *self.stage_started.lock().unwrap() = Instant::now();
    }

    fn on_item_complete(&self, _stage: Stage, item: &str) {
        self.bar.set_message(item.to_string());
        self.bar.inc(1);
    }

    fn on_stage_complete(&self, stage: Stage) {
        let elapsed = self.stage_started.lock().unwrap().elapsed();
        self.bar.println(format!(
            "  {} {:<12} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", elapsed.as_secs_f64()))
        ));
    }

    fn on_run_complete(&self, _output_path: &Path) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one object with the default tool layout
  alto2pdf objects/MMTUK04_210988001 dump.xml

  # Explicit tools and output directory
  alto2pdf --saxon-jar /opt/saxon/saxon9he.jar --stylesheet xsl/alto2hocr.xsl \
           --output-dir pdf objects/MMTUK04_210988001 dump.xml

  # Check what would be stamped, without running any tool
  alto2pdf --resolve-only --json objects/MMTUK04_210988001 dump.xml

EXIT CODES:
  0  success
  1  configuration or internal error
  2  incomplete object (layout/image mismatch)
  3  external tool or image conversion failed
  4  metadata could not be resolved from the dump
  5  final PDF could not be written

EXTERNAL TOOLS:
  java + Saxon-HE   ALTO → hOCR transform (--java, --saxon-jar, --stylesheet)
  hocr-pdf          page assembly with text layer (--hocr-pdf)
  magick            JPEG 2000 → JPEG (--image-converter)
"#;

#[derive(Parser, Debug)]
#[command(
    name = "alto2pdf",
    version,
    about = "Build a searchable PDF from ALTO OCR files, page scans and a metadata dump",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Object directory holding the page files.
    object_dir: PathBuf,

    /// Shipment metadata dump (XML).
    metadata_dump: PathBuf,

    #[arg(short, long, env = "ALTO2PDF_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    #[arg(long, env = "ALTO2PDF_SCRATCH_DIR", default_value = "output/tmp")]
    scratch_dir: PathBuf,

    #[arg(long, env = "ALTO2PDF_STYLESHEET", default_value = "alto2hocr.xsl")]
    stylesheet: PathBuf,

    #[arg(long, env = "ALTO2PDF_SAXON_JAR", default_value = "SaxonHE9-7-0-21J/saxon9he.jar")]
    saxon_jar: PathBuf,

    #[arg(long, env = "ALTO2PDF_JAVA", default_value = "java")]
    java: String,

    #[arg(long, env = "ALTO2PDF_HOCR_PDF", default_value = "hocr-pdf")]
    hocr_pdf: String,

    /// Converter called as `<program> <input> <output>`.
    #[arg(long, env = "ALTO2PDF_IMAGE_CONVERTER", default_value = "magick")]
    image_converter: String,

    #[arg(long, env = "ALTO2PDF_IMAGE_BACKEND", value_enum, default_value = "auto")]
    image_backend: BackendArg,

    #[arg(long, env = "ALTO2PDF_LAYOUT_SUFFIX", default_value = "_alto.xml")]
    layout_suffix: String,

    #[arg(long, env = "ALTO2PDF_IMAGE_SUFFIX", default_value = "_access.jp2")]
    image_suffix: String,

    #[arg(long, env = "ALTO2PDF_NAMING", value_enum, default_value = "object-dir")]
    naming: NamingArg,

    /// Dump identifier; derived from the output filename when absent.
    #[arg(long, env = "ALTO2PDF_OBJECT_ID")]
    object_id: Option<String>,

    /// Seconds before a hung external tool is killed.
    #[arg(long, env = "ALTO2PDF_TOOL_TIMEOUT", default_value_t = 300,
          value_parser = clap::value_parser!(u64).range(1..))]
    tool_timeout: u64,

    /// Resolve metadata and report it; run no tools and write nothing.
    #[arg(long, env = "ALTO2PDF_RESOLVE_ONLY")]
    resolve_only: bool,

    #[arg(long, env = "ALTO2PDF_JSON")]
    json: bool,

    #[arg(long, env = "ALTO2PDF_NO_PROGRESS")]
    no_progress: bool,

    #[arg(short, long, env = "ALTO2PDF_VERBOSE")]
    verbose: bool,

    #[arg(short, long, env = "ALTO2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum BackendArg {
    Auto,
    Native,
    External,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum NamingArg {
    ObjectDir,
    FirstImage,
}

impl From<NamingArg> for OutputNaming {
    fn from(v: NamingArg) -> Self {
        match v {
            NamingArg::ObjectDir => OutputNaming::ObjectDirectory,
            NamingArg::FirstImage => OutputNaming::FirstImage,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs unless -v is given.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.resolve_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("✘"), e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let cli_cb = show_progress.then(CliProgressCallback::new);
    let progress_cb: Option<ProgressCallback> = cli_cb
        .clone()
        .map(|cb| cb as Arc<dyn PipelineProgressCallback>);
    let config = build_config(cli, progress_cb)?;

    // ── Resolve-only mode ────────────────────────────────────────────────
    if cli.resolve_only {
        let preview = resolve_only(&cli.object_dir, &cli.metadata_dump, &config)
            .await
            .context("Metadata resolution failed")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&preview).context("Failed to serialise metadata")?
            );
        } else {
            let meta = &preview.metadata;
            println!("Object:    {}", meta.object_id);
            println!("Material:  {}", meta.material);
            println!("Pages:     {}", preview.pages);
            println!("Output:    {}", preview.output_file_name);
            println!("Title:     {}", meta.title);
            if let Some(ref author) = meta.author {
                println!("Author:    {}", author);
            }
            println!("Keywords:  {}", meta.keywords);
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&cli.object_dir, &cli.metadata_dump, &config).await;
    if let Some(ref cb) = cli_cb {
        // Already cleared on success; a failed run leaves the bar mid-stage.
        cb.bar.finish_and_clear();
    }
    let summary = result.context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            green("✔"),
            summary.pages,
            summary.timings.total_ms,
            bold(&summary.output_path.display().to_string()),
        );
        eprintln!("   {}", dim(&summary.title));
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<PipelineConfig> {
    let converter = ToolCommand::image_magick(cli.image_converter.clone());
    let backend = match cli.image_backend {
        BackendArg::Auto => ImageBackend::Auto(converter),
        BackendArg::Native => ImageBackend::Native,
        BackendArg::External => ImageBackend::External(converter),
    };

    let mut builder = PipelineConfig::builder()
        .layout_suffix(cli.layout_suffix.clone())
        .image_suffix(cli.image_suffix.clone())
        .output_dir(cli.output_dir.clone())
        .scratch_root(cli.scratch_dir.clone())
        .stylesheet(cli.stylesheet.clone())
        .transform(ToolCommand::saxon(cli.java.clone(), &cli.saxon_jar))
        .assemble(ToolCommand::hocr_pdf(cli.hocr_pdf.clone()))
        .image_backend(backend)
        .naming(cli.naming.into())
        .tool_timeout_secs(cli.tool_timeout);

    if let Some(ref id) = cli.object_id {
        builder = builder.object_id(id.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Exit code for a failed run, from the library error class.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<SearchablePdfError>()
        .map(SearchablePdfError::exit_code)
        .unwrap_or_else(|| ErrorClass::Config.exit_code())
}
