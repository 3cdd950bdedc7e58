//! CLI binary for html2pdf-client.
//!
//! A thin shim over the library crate that maps CLI flags to `ClientConfig`,
//! renders the status slot on the terminal, and drives the conversion flow.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use html2pdf_client::{
    ClientConfig, ClientError, ConversionClient, FilePreview, IncomingFile, IntakeKind,
    Orientation, PageSize, Severity, StatusMessage, StatusObserver, EXAMPLE_CV_HTML,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
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

// ── Terminal status line ─────────────────────────────────────────────────────

/// Renders the status slot: a spinner while an info message is up, one
/// coloured line per success or error.
struct CliStatus {
    spinner: Mutex<Option<ProgressBar>>,
    animate: bool,
    quiet: bool,
}

impl CliStatus {
    fn new(animate: bool, quiet: bool) -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
            animate,
            quiet,
        })
    }

    fn stop_spinner(&self) {
        if let Some(bar) = self.spinner.lock().unwrap_or_else(|e| e.into_inner()).take() {
            bar.finish_and_clear();
        }
    }
}

impl StatusObserver for CliStatus {
    fn on_shown(&self, message: &StatusMessage) {
        self.stop_spinner();
        match message.severity {
            Severity::Info if self.animate => {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner())
                        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
                );
                bar.set_message(message.text.clone());
                bar.enable_steady_tick(Duration::from_millis(80));
                *self.spinner.lock().unwrap_or_else(|e| e.into_inner()) = Some(bar);
            }
            Severity::Info if !self.quiet => eprintln!("{} {}", cyan("◆"), message.text),
            Severity::Success if !self.quiet => {
                eprintln!("{} {}", green("✔"), bold(&message.text))
            }
            Severity::Error => eprintln!("{} {}", red("✘"), red(&message.text)),
            _ => {}
        }
    }

    fn on_cleared(&self, message: &StatusMessage) {
        if message.severity == Severity::Info {
            self.stop_spinner();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a file; the PDF lands in the current directory
  html2pdf convert invoice.html

  # Letter, landscape, into ./out
  html2pdf convert --page-size letter --orientation landscape -o out report.html

  # Convert HTML from stdin against a remote service
  cat page.html | html2pdf convert --endpoint https://convert.example.com -

  # Edit in your editor, watch the preview, convert on demand
  html2pdf watch cv.html --preview preview.html

  # Start from the built-in example
  html2pdf example > cv.html

WATCH COMMANDS (type, then Enter):
  convert          Convert the current document        (Ctrl/Cmd+Enter)
  example          Load the built-in example CV        (Ctrl/Cmd+Shift+E)
  load <path>      Load another file (.html / .htm only) and watch it instead
  clear            Forget the loaded-file name; keeps the text
  size <SIZE>      A3, A4, A5, Letter, Legal
  orientation <O>  portrait, landscape
  quit             Leave watch mode (Ctrl-C works too)

ENVIRONMENT VARIABLES:
  HTML2PDF_ENDPOINT       Base URL of the conversion service
  HTML2PDF_PAGE_SIZE      Default page size
  HTML2PDF_ORIENTATION    Default orientation
  HTML2PDF_OUTPUT_DIR     Where PDFs are written
  RUST_LOG                Override log filtering (e.g. html2pdf_client=debug)
"#;

/// Preview HTML and convert it to PDF through a remote conversion endpoint.
#[derive(Parser, Debug)]
#[command(
    name = "html2pdf",
    version,
    about = "Preview HTML and convert it to PDF through a conversion endpoint",
    long_about = "Send HTML documents to an HTML-to-PDF conversion service \
(POST /api/convert_to_pdf) and save the returned PDF. Watch mode keeps a live, \
debounced preview file up to date while you edit.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base URL of the conversion service.
    #[arg(long, global = true, env = "HTML2PDF_ENDPOINT", default_value = "http://localhost:7071")]
    endpoint: String,

    /// Page size: a3, a4, a5, letter, legal.
    #[arg(long, global = true, env = "HTML2PDF_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Page orientation.
    #[arg(long, global = true, env = "HTML2PDF_ORIENTATION", value_enum, default_value = "portrait")]
    orientation: OrientationArg,

    /// Directory downloaded PDFs are written to.
    #[arg(short, long = "output-dir", global = true, env = "HTML2PDF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// `filename` sent to the service with each request.
    #[arg(long, global = true, env = "HTML2PDF_FILENAME", default_value = "converted.pdf")]
    filename: String,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "HTML2PDF_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Disable the spinner.
    #[arg(long, global = true, env = "HTML2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "HTML2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "HTML2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one HTML file (or `-` for stdin) and exit.
    Convert {
        /// HTML file path, or `-` to read stdin.
        input: String,

        /// Print the outcome as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
    /// Watch an HTML file, keep a preview current, convert on command.
    Watch {
        /// HTML file to watch.
        input: PathBuf,

        /// Preview file rewritten after each change.
        #[arg(long, default_value = "preview.html")]
        preview: PathBuf,

        /// How often to check the input for changes, in milliseconds.
        #[arg(long, default_value_t = 250)]
        poll_ms: u64,

        /// Quiet period before a change reaches the preview, in milliseconds.
        #[arg(long, default_value_t = 500)]
        debounce_ms: u64,
    },
    /// Print the built-in example document.
    Example,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A3 => PageSize::A3,
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::A5 => PageSize::A5,
            PageSizeArg::Letter => PageSize::Letter,
            PageSizeArg::Legal => PageSize::Legal,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for Orientation {
    fn from(v: OrientationArg) -> Self {
        match v {
            OrientationArg::Portrait => Orientation::Portrait,
            OrientationArg::Landscape => Orientation::Landscape,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep library INFO logs out of the way while the spinner is drawing.
    let animate = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || animate {
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

    match &cli.command {
        Command::Example => {
            println!("{EXAMPLE_CV_HTML}");
            Ok(())
        }
        Command::Convert { input, json } => run_convert(&cli, input, *json, animate).await,
        Command::Watch {
            input,
            preview,
            poll_ms,
            debounce_ms,
        } => run_watch(&cli, input, preview, *poll_ms, *debounce_ms, animate).await,
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, debounce_ms: Option<u64>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .endpoint(cli.endpoint.clone())
        .page_size(cli.page_size.into())
        .orientation(cli.orientation.into())
        .output_dir(cli.output_dir.clone())
        .filename(cli.filename.clone())
        .request_timeout_secs(cli.timeout);
    if let Some(ms) = debounce_ms {
        builder = builder.debounce_ms(ms);
    }
    builder.build().context("Invalid configuration")
}

async fn run_convert(cli: &Cli, input: &str, json: bool, animate: bool) -> Result<()> {
    let config = build_config(cli, None)?;
    let client = ConversionClient::builder(config)
        .status_observer(CliStatus::new(animate, cli.quiet))
        .build()
        .context("Failed to set up conversion client")?;

    if input == "-" {
        let mut html = String::new();
        io::stdin()
            .read_to_string(&mut html)
            .context("Failed to read HTML from stdin")?;
        client.edit(html);
    } else {
        client
            .load_file(IncomingFile::from_path(input), IntakeKind::Selected)
            .await
            .with_context(|| format!("Failed to load {input}"))?;
    }

    let outcome = client.submit().await.context("Conversion failed")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise outcome")?
        );
    } else if !cli.quiet {
        eprintln!(
            "   {}  {}",
            bold(&outcome.path.display().to_string()),
            dim(&format!("{} bytes in {}ms", outcome.bytes, outcome.duration_ms)),
        );
    }
    Ok(())
}

/// Modification time and length, enough to notice an editor's save.
async fn fingerprint(path: &Path) -> Option<(SystemTime, u64)> {
    let meta = tokio::fs::metadata(path).await.ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

async fn run_watch(
    cli: &Cli,
    input: &Path,
    preview: &Path,
    poll_ms: u64,
    debounce_ms: u64,
    animate: bool,
) -> Result<()> {
    let config = build_config(cli, Some(debounce_ms))?;
    let client = Arc::new(
        ConversionClient::builder(config)
            .status_observer(CliStatus::new(animate, cli.quiet))
            .preview(Arc::new(FilePreview::new(preview)))
            .build()
            .context("Failed to set up conversion client")?,
    );

    client
        .load_file(IncomingFile::from_path(input), IntakeKind::Selected)
        .await
        .with_context(|| format!("Failed to load {}", input.display()))?;

    if !cli.quiet {
        eprintln!(
            "{} watching {}  →  preview {}",
            cyan("◆"),
            bold(&input.display().to_string()),
            bold(&preview.display().to_string()),
        );
        eprintln!("{}", dim("  commands: convert | example | load <path> | clear | size <S> | orientation <O> | quit"));
    }

    let mut watched = input.to_path_buf();
    let mut last_seen = fingerprint(&watched).await;
    let mut ticker = tokio::time::interval(Duration::from_millis(poll_ms.max(50)));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = fingerprint(&watched).await;
                if now.is_some() && now != last_seen {
                    last_seen = now;
                    match tokio::fs::read_to_string(&watched).await {
                        Ok(text) => {
                            debug!("{} changed", watched.display());
                            client.edit(text);
                        }
                        Err(e) => eprintln!("{} {}", red("✘"), red(&format!("Failed to re-read {}: {e}", watched.display()))),
                    }
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else { break };
                match handle_command(&client, line.trim()).await {
                    Flow::Continue => {}
                    Flow::Quit => break,
                    Flow::Watch(path) => {
                        if !cli.quiet {
                            eprintln!("{} now watching {}", dim("·"), bold(&path.display().to_string()));
                        }
                        last_seen = fingerprint(&path).await;
                        watched = path;
                    }
                }
            }
            _ = &mut ctrl_c => break,
        }
    }
    Ok(())
}

/// What the watch loop does after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
    /// A file was loaded; poll it instead of the previous one.
    Watch(PathBuf),
}

/// Run one watch-mode command.
async fn handle_command(client: &Arc<ConversionClient>, line: &str) -> Flow {
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((c, a)) => (c, a.trim()),
        None => (line, ""),
    };

    match cmd {
        "" => {}
        "quit" | "exit" | "q" => return Flow::Quit,
        "convert" | "c" => {
            // Runs in the background so stdin and the watcher stay live;
            // the client itself refuses a second concurrent submission.
            let client = Arc::clone(client);
            tokio::spawn(async move {
                match client.submit().await {
                    Ok(outcome) => eprintln!("   {}", bold(&outcome.path.display().to_string())),
                    Err(ClientError::ConversionInProgress) => {
                        eprintln!("{} A conversion is already running", cyan("⚠"));
                    }
                    Err(e) => debug!("submit failed: {e}"),
                }
            });
        }
        "example" => client.load_example(),
        "clear" => match client.clear_file() {
            Some(name) => eprintln!("{} cleared {}", dim("·"), name),
            None => eprintln!("{} no file loaded", dim("·")),
        },
        "load" if !arg.is_empty() => {
            let path = PathBuf::from(arg);
            // Failures are already on the status line.
            match client
                .load_file(IncomingFile::from_path(&path), IntakeKind::Dropped)
                .await
            {
                Ok(()) => return Flow::Watch(path),
                Err(e) => debug!("load {} failed: {e}", path.display()),
            }
        }
        "size" => match arg.parse::<PageSize>() {
            Ok(size) => {
                client.select_page_size(size);
                eprintln!("{} page size {}", dim("·"), size);
            }
            Err(e) => eprintln!("{} {}", red("✘"), e),
        },
        "orientation" => match arg.parse::<Orientation>() {
            Ok(o) => {
                client.select_orientation(o);
                eprintln!("{} orientation {}", dim("·"), o);
            }
            Err(e) => eprintln!("{} {}", red("✘"), e),
        },
        other => eprintln!(
            "{} unknown command '{}' (convert, example, load <path>, clear, size, orientation, quit)",
            red("✘"),
            other
        ),
    }
    Flow::Continue
}
