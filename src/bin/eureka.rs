//! CLI binary for eureka-scorer.
//!
//! A thin shim over the library crate that maps CLI flags to `ScorerConfig`
//! and prints the scorecard.

use anyhow::{Context, Result};
use clap::Parser;
use eureka_scorer::backend::resolve_backend;
use eureka_scorer::evaluate::write_atomic;
use eureka_scorer::report::{render_case_studies, render_evaluation};
use eureka_scorer::{
    coach, evaluate_file, search_link, score_label, CaseStudy, Evaluation,
    EvaluationOutput, EvaluationProgressCallback, OutputMode, ProgressCallback, ScoreBand,
    ScoreReport, ScorerConfig, ScorerError,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
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

fn band_colour(band: ScoreBand, s: &str) -> String {
    match band.colour() {
        "red" => red(s),
        "yellow" => yellow(s),
        _ => green(s),
    }
}

fn spinner(prefix: &'static str, msg: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix(prefix);
    bar.set_message(msg);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn shorten(s: &str, max: usize) -> String {
    let line = s.lines().next().unwrap_or("");
    if line.chars().count() > max {
        format!("{}\u{2026}", line.chars().take(max - 1).collect::<String>())
    } else {
        line.to_string()
    }
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner plus one log line per model attempt.
struct CliProgressCallback {
    bar: ProgressBar,
    failures: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: spinner("Reading", "Extracting deck text…"),
            failures: AtomicUsize::new(0),
        })
    }
}

impl EvaluationProgressCallback for CliProgressCallback {
    fn on_extraction_complete(&self, source_name: &str, chars: usize) {
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(source_name),
            dim(&format!("{chars} chars of text"))
        ));
        self.bar.set_prefix("Judging");
        self.bar.set_message("Scoring against the anchors…");
    }

    fn on_attempt_start(&self, model_identifier: &str, _attempt: usize) {
        self.bar.set_message(model_identifier.to_string());
    }

    fn on_attempt_failed(&self, model_identifier: &str, error: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:<28} {}",
            red("✗"),
            model_identifier,
            dim(&shorten(error, 80))
        ));
    }

    fn on_attempt_succeeded(&self, model_identifier: &str) {
        self.bar
            .println(format!("  {} {}", green("✓"), model_identifier));
    }

    fn on_evaluation_complete(&self, _total_score: Option<u32>, success: bool) {
        let failures = self.failures.load(Ordering::SeqCst);
        if success && failures > 0 {
            self.bar.println(dim(&format!(
                "  {failures} candidate form(s) failed before one answered"
            )));
        }
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Score a deck (Gemini, GEMINI_API_KEY must be set)
  eureka pitch.pdf

  # PowerPoint deck, plus famous-startup case studies for weak answers
  eureka pitch.pptx --coach

  # Ask for the markdown table instead of JSON
  eureka pitch.pdf --mode markdown

  # Machine-readable output
  eureka pitch.pdf --json > score.json

  # Write the report to a file
  eureka https://example.com/decks/pitch.pdf -o report.md

  # Another provider through edgequake-llm
  eureka pitch.pdf --provider openai --models gpt-4.1-mini,gpt-4.1-nano

SCORING:
  3  strong   specific, evidence based
  2  vague    present but vague
  1  weak     missing or generic
  12 questions, 36 points maximum.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY     Google Gemini API key (required unless --provider is set)
  GEMINI_BASE_URL    Override the Gemini REST endpoint
  EUREKA_MODELS      Comma-separated candidate models, tried in order
  EUREKA_PROVIDER    edgequake-llm provider (openai, anthropic, ollama, …)
  PDFIUM_LIB_PATH    Path to libpdfium (file or directory) for PDF decks
  RUST_LOG           Log filter, overrides -v / -q
"#;

/// Score a startup pitch deck against the Eureka rubric.
#[derive(Parser, Debug)]
#[command(
    name = "eureka",
    version,
    about = "Score a startup pitch deck (PDF or PPTX) against the Eureka rubric",
    long_about = "Extracts the text of a pitch deck, asks a hosted LLM to grade it against the \
12-question Eureka rubric (1–3 per question, 36 max) and prints the scorecard with a blunt \
'hard truth' summary. Candidate models are tried in order until one answers.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .pdf / .pptx path or HTTP/HTTPS URL.
    input: String,

    /// Write the markdown report to this file as well.
    #[arg(short, long, env = "EUREKA_OUTPUT")]
    output: Option<PathBuf>,

    /// Reply format requested from the model.
    #[arg(long, env = "EUREKA_MODE", value_enum, default_value = "json")]
    mode: ModeArg,

    /// Candidate models, tried in order (comma-separated).
    #[arg(long, env = "EUREKA_MODELS", value_delimiter = ',')]
    models: Vec<String>,

    /// Use an edgequake-llm provider instead of Gemini.
    #[arg(long, env = "EUREKA_PROVIDER")]
    provider: Option<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini REST base URL.
    #[arg(long, env = "GEMINI_BASE_URL")]
    base_url: Option<String>,

    /// Ask for famous-startup case studies covering the weak answers.
    #[arg(long, env = "EUREKA_COACH")]
    coach: bool,

    /// Answers scoring at or below this are coached (1–3).
    #[arg(long, env = "EUREKA_WEAK_THRESHOLD", default_value_t = 2,
          value_parser = clap::value_parser!(u8).range(1..=3))]
    weak_threshold: u8,

    /// Deck text beyond this many characters is cut off.
    #[arg(long, env = "EUREKA_MAX_CHARS", default_value_t = 30_000)]
    max_chars: usize,

    /// Decks with less extracted text are rejected.
    #[arg(long, env = "EUREKA_MIN_CHARS", default_value_t = 50)]
    min_chars: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "EUREKA_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "EUREKA_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// Per-attempt model call timeout in seconds.
    #[arg(long, env = "EUREKA_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "EUREKA_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output structured JSON instead of the coloured scorecard.
    #[arg(long)]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "EUREKA_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except the result and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Json,
    Markdown,
}

impl From<ModeArg> for OutputMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Json => OutputMode::StructuredJson,
            ModeArg::Markdown => OutputMode::Markdown,
        }
    }
}

/// `--json` payload: the evaluation plus any coaching.
#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    output: &'a EvaluationOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    case_studies: Option<&'a [CaseStudy]>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner carries the progress; library INFO lines would tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn EvaluationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).context("Invalid configuration")?;

    if let Err(e) = config.check_credentials() {
        eprintln!("{} {e}", red("✘"));
        std::process::exit(1);
    }

    // ── Run evaluation ───────────────────────────────────────────────────
    let output = match evaluate_file(&cli.input, &config).await {
        Ok(output) => output,
        Err(e) => {
            print_failure(&e);
            std::process::exit(1);
        }
    };

    // ── Coaching ─────────────────────────────────────────────────────────
    let case_studies = match (cli.coach, output.evaluation.report()) {
        (true, Some(report)) => Some(run_coach(&cli, &config, report, show_progress).await),
        (true, None) => {
            if !cli.quiet {
                eprintln!(
                    "{} --coach needs the structured reply; skipped in markdown mode",
                    yellow("⚠")
                );
            }
            None
        }
        _ => None,
    };

    // ── Print ────────────────────────────────────────────────────────────
    if cli.json {
        let payload = JsonOutput {
            output: &output,
            case_studies: case_studies.as_deref(),
        };
        let json = serde_json::to_string_pretty(&payload).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        print_evaluation(&output, &config, case_studies.as_deref())?;
    }

    if let Some(ref path) = cli.output {
        let mut rendered = render_evaluation(&output.evaluation, &config.rubric);
        if let Some(studies) = case_studies.as_deref().filter(|s| !s.is_empty()) {
            rendered.push('\n');
            rendered.push_str(&render_case_studies(studies));
        }
        write_atomic(path, &rendered)
            .await
            .context("Failed to write report")?;
        if !cli.quiet {
            eprintln!("{} report written to {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{}",
            dim(&format!(
                "{} via {} · {} attempt(s) · {}ms",
                output.source_name,
                output.model,
                output.attempts.len(),
                output.stats.total_duration_ms
            ))
        );
    }

    Ok(())
}

/// Map CLI args to `ScorerConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ScorerConfig, ScorerError> {
    let mut builder = ScorerConfig::builder()
        .output_mode(cli.mode.into())
        .max_deck_chars(cli.max_chars)
        .min_text_chars(cli.min_chars)
        .weak_threshold(cli.weak_threshold)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if !cli.models.is_empty() {
        builder = builder.models(cli.models.iter().cloned());
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.gemini_base_url(url.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build()
}

async fn run_coach(
    cli: &Cli,
    config: &ScorerConfig,
    report: &ScoreReport,
    show_progress: bool,
) -> Vec<CaseStudy> {
    let coach_config = ScorerConfig {
        progress_callback: None,
        ..config.clone()
    };
    let bar = show_progress.then(|| spinner("Coaching", "Finding famous-startup examples…"));

    let result = match resolve_backend(&coach_config) {
        Ok(backend) => coach(backend.as_ref(), report, &coach_config).await,
        Err(e) => Err(e),
    };

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match result {
        Ok(studies) => studies,
        Err(e) => {
            // The scorecard is already in hand; coaching failure is not fatal.
            if !cli.quiet {
                eprintln!("{} coaching failed: {}", yellow("⚠"), shorten(&e.to_string(), 120));
            }
            Vec::new()
        }
    }
}

fn print_failure(e: &ScorerError) {
    eprintln!("{} {}", red("✘"), e);
    if let ScorerError::ModelInvocation(failure) = e {
        for a in &failure.attempts {
            eprintln!(
                "  {} {:<28} {}",
                red("✗"),
                a.model_identifier,
                dim(&shorten(a.error_detail.as_deref().unwrap_or(""), 100))
            );
        }
    }
    if let Some(raw) = e.raw_response() {
        eprintln!("\n{}", bold("Raw model reply:"));
        eprintln!("{raw}");
    }
}

fn print_evaluation(
    output: &EvaluationOutput,
    config: &ScorerConfig,
    case_studies: Option<&[CaseStudy]>,
) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &output.evaluation {
        Evaluation::Markdown(text) => {
            out.write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
            if !text.ends_with('\n') {
                out.write_all(b"\n").ok();
            }
        }
        Evaluation::Scored(report) => {
            writeln!(
                out,
                "\n{}  {}\n",
                bold("Total Score"),
                bold(&format!("{}/{}", report.total_score, config.rubric.max_total()))
            )?;
            writeln!(out, "{} {}\n", red(&bold("The Hard Truth:")), report.hard_truth)?;
            writeln!(out, "{}", bold("Detailed Report Card"))?;

            let mut last_category: Option<&str> = None;
            for r in &report.reviews {
                if let Some(cat) = r.category.as_deref() {
                    if last_category != Some(cat) {
                        writeln!(out, "\n  {}", cyan(&cat.to_uppercase()))?;
                        last_category = Some(cat);
                    }
                }
                let band = score_label(r.score);
                writeln!(
                    out,
                    "  {} {}",
                    band_colour(band, &format!("[{}] {:<6}", r.score, band.as_str())),
                    bold(&r.question)
                )?;
                writeln!(out, "           {}", r.reasoning)?;
            }

            if !report.warnings.is_empty() {
                writeln!(out, "\n{}", yellow("Warnings"))?;
                for w in &report.warnings {
                    writeln!(out, "  {} {w}", yellow("⚠"))?;
                }
            }
        }
    }

    if let Some(studies) = case_studies.filter(|s| !s.is_empty()) {
        writeln!(out, "\n{}", bold("Learn From The Best"))?;
        for s in studies {
            writeln!(
                out,
                "\n  {} {}  {}",
                cyan("◆"),
                bold(&s.example_company),
                dim(&format!("({})", s.weakness))
            )?;
            writeln!(out, "    {}", s.lesson)?;
            writeln!(out, "    {}", dim(&search_link(&s.search_query)))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_model_list() {
        let cli = Cli::try_parse_from([
            "eureka",
            "deck.pdf",
            "--models",
            "gemini-2.0-flash,gemini-1.5-pro",
            "--api-key",
            "k",
        ])
        .unwrap();
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.models, vec!["gemini-2.0-flash", "gemini-1.5-pro"]);
    }

    #[test]
    fn markdown_mode_flag() {
        let cli = Cli::try_parse_from(["eureka", "deck.pptx", "--mode", "markdown"]).unwrap();
        let config = build_config(&cli, None).unwrap();
        assert_eq!(config.output_mode, OutputMode::Markdown);
    }

    #[test]
    fn bands_map_to_ansi_colours() {
        assert_eq!(band_colour(score_label(1), "x"), red("x"));
        assert_eq!(band_colour(score_label(2), "x"), yellow("x"));
        assert_eq!(band_colour(score_label(3), "x"), green("x"));
    }

    #[test]
    fn shorten_cuts_on_chars() {
        assert_eq!(shorten("ééééé", 3), "éé\u{2026}");
        assert_eq!(shorten("short\nsecond line", 80), "short");
    }
}
