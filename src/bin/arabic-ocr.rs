//! CLI binary for arabic-pdf-ocr.
//!
//! A thin shim over the library crate: maps CLI flags to `OcrConfig`,
//! reads the service-account key, and writes the two downloads.

use anyhow::{Context, Result};
use arabic_pdf_ocr::{
    inspect, ocr_to_dir, DetectionMode, OcrConfig, OcrError, OcrProgressCallback, PipelineStep,
    ProgressCallback, ServiceAccountKey, DEFAULT_VISION_ENDPOINT, REMEDIATION_HINT,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while pages are rasterised, then a
/// page bar with one log line per recognised page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the page currently at the OCR service.
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Checking credentials…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("OCR");
        self.bar.reset_eta();
    }
}

impl OcrProgressCallback for CliProgressCallback {
    fn on_step(&self, step: PipelineStep) {
        self.bar
            .println(format!("{} {}", cyan("◆"), bold(&step.to_string())));
        if step == PipelineStep::Rasterizing {
            self.bar.set_prefix("Rendering");
            self.bar.set_message("Converting PDF pages to images…");
        }
    }

    fn on_pages_rendered(&self, total_pages: usize) {
        self.activate_bar(total_pages);
    }

    fn on_page_start(&self, page_num: usize, _total_pages: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let elapsed_ms = self
            .page_started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);

        let chars = if text_len == 0 {
            "no text".to_string()
        } else {
            format!("{text_len:>5} chars")
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            total_pages,
            dim(&chars),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_complete(&self, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages recognised",
            green("✔"),
            bold(&total_pages.to_string())
        );
    }

    fn on_failure(&self, _error: &OcrError) {
        // main prints the error and hint once the bar is gone.
        self.bar.abandon();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR a scanned Arabic book into book_OCR.txt and book_OCR.docx
  arabic-ocr --credentials key.json book.pdf

  # Key from the environment, downloads into ./out
  GOOGLE_APPLICATION_CREDENTIALS=key.json arabic-ocr -o out book.pdf

  # Pipe the key on stdin
  cat key.json | arabic-ocr --credentials - book.pdf

  # Dense pages: use DOCUMENT_TEXT_DETECTION
  arabic-ocr --credentials key.json --document-mode book.pdf

  # Inspect PDF metadata (no key needed)
  arabic-ocr --inspect-only book.pdf

OUTPUT:
  <name>_OCR.txt   UTF-8, starts with U+202B (right-to-left embedding),
                   pages separated by "--- Page Break ---"
  <name>_OCR.docx  one right-aligned paragraph per page, page breaks between

  Both files are written only when every page succeeded.

ENVIRONMENT VARIABLES:
  GOOGLE_SERVICE_ACCOUNT_JSON     Service-account key JSON (inline)
  GOOGLE_APPLICATION_CREDENTIALS  Path to the service-account key file
  PDFIUM_LIB_PATH                 Path to an existing libpdfium
  PDFIUM_AUTO_CACHE_DIR           Where the downloaded libpdfium is cached
  RUST_LOG                        Override the log filter

SETUP:
  1. Enable the Cloud Vision API in your Google Cloud project.
  2. Create a service account and download its JSON key.
  3. arabic-ocr --credentials key.json document.pdf

  The PDF engine (pdfium, ~30 MB) is downloaded once on first use.
"#;

/// Extract Arabic text from PDF files with Google Cloud Vision.
#[derive(Parser, Debug)]
#[command(
    name = "arabic-ocr",
    version,
    about = "Extract Arabic text from PDF files with Google Cloud Vision",
    long_about = "Rasterise every page of a PDF at 300 DPI, recognise it with Google Cloud \
Vision using an Arabic language hint, and save the result as a right-to-left text file and a \
Word document.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to process.
    input: PathBuf,

    /// Service-account key JSON, pasted inline.
    /// Takes precedence over `--credentials`.
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_JSON", hide_env_values = true)]
    credentials_json: Option<String>,

    /// Path to the service-account key file; `-` reads it from stdin.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// Directory the two downloads are written to.
    #[arg(short, long, env = "ARABIC_OCR_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Rendering DPI (72–600).
    #[arg(long, env = "ARABIC_OCR_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Language hint sent with every page; repeat for several.
    #[arg(long = "language", env = "ARABIC_OCR_LANGUAGE", value_delimiter = ',',
          default_value = "ar")]
    languages: Vec<String>,

    /// Use DOCUMENT_TEXT_DETECTION instead of TEXT_DETECTION.
    #[arg(long, env = "ARABIC_OCR_DOCUMENT_MODE")]
    document_mode: bool,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "ARABIC_OCR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Per-request timeout for Vision calls, in seconds.
    #[arg(long, env = "ARABIC_OCR_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Vision images:annotate endpoint.
    #[arg(long, env = "ARABIC_OCR_ENDPOINT", default_value = DEFAULT_VISION_ENDPOINT)]
    endpoint: String,

    /// Print PDF metadata only, no OCR.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON summary of the run on stdout.
    #[arg(long, env = "ARABIC_OCR_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "ARABIC_OCR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ARABIC_OCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ARABIC_OCR_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the user-facing feedback; library INFO logs
    // only show when it is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
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
            // OcrError messages already embed their source.
            let (message, hint) = match e.downcast_ref::<OcrError>() {
                Some(ocr) => (ocr.to_string(), ocr.hint()),
                None => (format!("{e:#}"), REMEDIATION_HINT),
            };
            eprintln!("{} {}", red("✘"), bold(&message));
            eprintln!("  {}", dim(hint));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        ensure_pdf_engine(!cli.quiet && !cli.json)?;
        let meta = inspect(&cli.input).await?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", meta.file_name);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    // An absent key is passed through as empty so the library reports it
    // before touching the PDF.
    let credentials_json = read_credentials(cli).await?.unwrap_or_default();

    // A bad key is reported by the library without fetching the engine.
    if ServiceAccountKey::from_json(&credentials_json).is_ok() {
        ensure_pdf_engine(show_progress)?;
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn OcrProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb)?;

    // ── Run OCR ──────────────────────────────────────────────────────────
    let saved = ocr_to_dir(&cli.input, &credentials_json, &cli.output_dir, &config).await?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&saved).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        let stats = &saved.output.stats;
        eprintln!(
            "{}  {} pages  {}ms  →  {}, {}",
            green("✔"),
            stats.total_pages,
            stats.total_duration_ms,
            bold(&saved.text_path.display().to_string()),
            bold(&saved.word_path.display().to_string()),
        );
        if stats.empty_pages > 0 {
            eprintln!(
                "   {}",
                dim(&format!("{} pages had no detectable text", stats.empty_pages))
            );
        }
    }

    Ok(())
}

/// Make sure the pdfium library is cached, downloading it on first use.
fn ensure_pdf_engine(show_bar: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    let result = if show_bar {
        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        dl_bar.set_prefix("PDF engine");
        dl_bar.set_message("Connecting…");
        dl_bar.enable_steady_tick(Duration::from_millis(80));

        let bar = dl_bar.clone();
        let result = tokio::task::block_in_place(|| {
            pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                if let Some(t) = total {
                    if bar.length().unwrap_or(0) != t {
                        bar.set_length(t);
                    }
                }
                bar.set_position(downloaded);
            }))
        });
        if result.is_ok() {
            dl_bar.finish_with_message("ready ✓");
        } else {
            dl_bar.abandon();
        }
        result
    } else {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
    };

    result
        .map(|_| ())
        .map_err(|e| OcrError::PdfiumBindingFailed(e.to_string()).into())
}

/// Resolve the key from `--credentials-json`, `--credentials <file>` or stdin.
/// Inline JSON wins when both are present.
async fn read_credentials(cli: &Cli) -> Result<Option<String>> {
    if let Some(ref json) = cli.credentials_json {
        return Ok(Some(json.clone()));
    }
    match cli.credentials {
        Some(ref path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read credentials from stdin")?;
            Ok(Some(buf))
        }
        Some(ref path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read credentials from {:?}", path))?;
            Ok(Some(json))
        }
        None => Ok(None),
    }
}

/// Map CLI args to `OcrConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<OcrConfig> {
    let mode = if cli.document_mode {
        DetectionMode::Document
    } else {
        DetectionMode::Text
    };

    let mut builder = OcrConfig::builder()
        .dpi(cli.dpi)
        .language_hints(cli.languages.iter())
        .detection_mode(mode)
        .endpoint(cli.endpoint.as_str())
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.as_str());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build()?)
}
