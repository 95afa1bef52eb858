//! manga-text-eraser - Batch removal of printed text from manga pages
//!
//! CLI entry point

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

use manga_text_eraser::{
    exit_codes, BatchError, BatchJob, BatchRunner, BatchSummary, Cli, Commands, Config,
    ItemOutcome, OutputMode, ProgressEvent, ProgressSink, RunArgs, StrategyKind,
    TesseractRecognizer,
};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_batch(&args),
        Commands::Info => run_info().map(|()| exit_codes::SUCCESS),
    };

    std::process::exit(match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::GENERAL_ERROR
        }
    });
}

// ============ Progress Sink Implementation ============

/// Terminal progress: indicatif bar, summary, and the "more images?" prompt
struct TerminalProgress {
    bar: ProgressBar,
    mode: OutputMode,
    json: bool,
    ask_to_continue: bool,
}

impl TerminalProgress {
    fn new(args: &RunArgs) -> Self {
        let mode = args.output_mode();
        let bar = if mode == OutputMode::Quiet {
            ProgressBar::hidden()
        } else {
            let style = ProgressStyle::with_template(
                "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ");
            ProgressBar::new(0).with_style(style)
        };

        Self {
            bar,
            mode,
            json: args.json,
            ask_to_continue: !args.yes,
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn on_batch_start(&self, total: usize) {
        self.bar.reset();
        self.bar.set_length(total as u64);
    }

    fn on_item_complete(&self, event: &ProgressEvent) {
        self.bar.set_position(event.index as u64);
        self.bar
            .set_message(format!("ETA {}s", event.remaining_whole_secs()));

        if self.mode.should_show(OutputMode::Verbose) {
            let name = event
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let line = match &event.outcome {
                ItemOutcome::Processed { regions, .. } => {
                    if self.mode.should_show(OutputMode::VeryVerbose) {
                        format!("{} regions erased", regions)
                    } else {
                        "done".to_string()
                    }
                }
                ItemOutcome::Failed(failure) => format!("skipped ({})", failure.kind),
                ItemOutcome::Cancelled => "cancelled".to_string(),
            };
            self.bar.println(format!(
                "[{}/{}] {}: {}",
                event.index, event.total, name, line
            ));
        }
    }

    fn on_batch_complete(&self, summary: &BatchSummary) -> bool {
        self.bar.finish_and_clear();

        if self.json {
            match serde_json::to_string_pretty(summary) {
                Ok(json) => println!("{}", json),
                Err(e) => warn!("Cannot serialize summary: {}", e),
            }
        } else if self.mode.should_show(OutputMode::Normal) {
            print_summary(summary);
        }

        self.ask_to_continue && confirm("Process more images? [y/N] ")
    }
}

// ============ Run Command ============

fn run_batch(args: &RunArgs) -> anyhow::Result<i32> {
    init_logging(args);

    // Load config file if specified, otherwise search the default locations
    let file_config = match &args.config {
        Some(path) => match Config::load_from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_else(|e| {
            warn!("Ignoring config file: {}", e);
            Config::default()
        }),
    };

    // CLI takes precedence over the config file
    let config = file_config.merge_with_cli(&args.to_overrides());
    let strategy = config.build_strategy();
    let kind = strategy.kind();

    if kind == StrategyKind::Ocr && !config.recognizer().is_available() {
        warn!(
            command = %config.ocr.tesseract.display(),
            "Tesseract not found; every image will be skipped"
        );
    }

    let runner = BatchRunner::new(strategy, config.batch_options());
    let sink = TerminalProgress::new(args);

    let mut input = args.input.clone();
    let mut output = args.output.clone();
    let mut exit_code = exit_codes::SUCCESS;

    loop {
        let input_dir = match input.take() {
            Some(dir) => dir,
            None => match prompt_input_dir()? {
                Some(dir) => dir,
                None => {
                    let code = report_batch_error(&BatchError::InputAbsent);
                    return Ok(exit_codes::combine(exit_code, code));
                }
            },
        };
        let output_dir = output
            .take()
            .unwrap_or_else(|| input_dir.join(kind.default_output_dir_name()));

        if args.dry_run {
            return match BatchJob::from_dir(&input_dir, &output_dir, kind) {
                Ok(job) => {
                    print_execution_plan(&job, &input_dir, &config);
                    Ok(exit_codes::SUCCESS)
                }
                Err(e) => Ok(report_batch_error(&e)),
            };
        }

        let result = match runner.run(&input_dir, &output_dir, &sink) {
            Ok(result) => result,
            Err(e) => return Ok(exit_codes::combine(exit_code, report_batch_error(&e))),
        };

        if result.summary.failed() > 0 {
            exit_code = exit_codes::combine(exit_code, exit_codes::ITEMS_FAILED);
        }
        if !result.continue_requested {
            break;
        }
        runner.cancel_token().reset();
    }

    Ok(exit_code)
}

fn init_logging(args: &RunArgs) {
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Print a setup error and map it to an exit code
fn report_batch_error(error: &BatchError) -> i32 {
    eprintln!("Error: {}", error);
    match error {
        BatchError::InputAbsent | BatchError::InputNotFound(_) | BatchError::NotADirectory(_) => {
            exit_codes::INPUT_NOT_FOUND
        }
        BatchError::EmptyBatch { .. } => exit_codes::EMPTY_BATCH,
        _ => exit_codes::GENERAL_ERROR,
    }
}

/// Ask for an input folder; empty answer or EOF yields `None`
fn prompt_input_dir() -> anyhow::Result<Option<PathBuf>> {
    let answer = read_answer("Input folder: ").context("Failed to read input folder")?;
    Ok(answer.map(PathBuf::from))
}

fn confirm(question: &str) -> bool {
    matches!(
        read_answer(question),
        Ok(Some(answer)) if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
    )
}

fn read_answer(question: &str) -> std::io::Result<Option<String>> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{}", question)?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("{}", "=".repeat(60));
    println!("Batch Summary ({})", summary.strategy);
    println!("{}", "=".repeat(60));
    println!("  Started:    {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Images:     {}", summary.total);
    println!("  Processed:  {}", summary.processed);
    println!("  Regions:    {}", summary.regions);
    println!("  Skipped:    {}", summary.failed());
    if summary.cancelled > 0 {
        println!("  Cancelled:  {}", summary.cancelled);
    }
    println!("  Output:     {}", summary.output_dir.display());
    println!("  Total time: {:.2}s", summary.elapsed_secs);
    println!("{}", "=".repeat(60));

    if !summary.failures.is_empty() {
        println!("Skipped images:");
        for failure in &summary.failures {
            println!("  {}", failure);
        }
    }
    println!();
}

/// Print execution plan for dry-run mode
fn print_execution_plan(job: &BatchJob, input_dir: &Path, config: &Config) {
    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input: {}", input_dir.display());
    println!("Output: {}", job.output_dir().display());
    println!("Images to process: {}", job.len());
    println!();
    println!("Strategy: {}", job.strategy());
    match job.strategy() {
        StrategyKind::Bubble => {
            let d = &config.detection;
            println!("  1. Intensity conversion + Gaussian blur (sigma {})", d.blur_sigma);
            println!("  2. Canny edges ({} / {})", d.canny_low, d.canny_high);
            println!("  3. Contours with area > {} px", d.min_area);
            if d.simplify {
                println!("     Simplified outlines (epsilon {} x perimeter)", d.approx_epsilon_ratio);
            }
            println!(
                "  4. Mean-color fill (sampled from {})",
                if config.fill.sample_from_source { "source" } else { "working copy" }
            );
        }
        StrategyKind::Ocr => {
            let o = &config.ocr;
            println!(
                "  1. Tesseract ({}) lang={} psm={}",
                o.tesseract.display(),
                o.language,
                o.page_seg_mode
            );
            println!("  2. Keep tokens at level {} and deeper", o.min_level);
            println!("  3. Whiteout boxes");
        }
    }
    println!();
    println!("Threads: {}", config.batch_options().effective_threads());
    println!();
    println!("Files:");
    for (i, item) in job.items().iter().enumerate() {
        println!("  {}. {}", i + 1, item.input.display());
    }
}

// ============ Info Command ============

fn run_info() -> anyhow::Result<()> {
    println!("manga-text-eraser v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("System Information:");
    println!("  Platform: {}", std::env::consts::OS);
    println!("  Arch: {}", std::env::consts::ARCH);
    println!("  CPUs: {}", num_cpus::get());

    println!();
    println!("OCR Tools:");
    let tesseract = TesseractRecognizer::default();
    match which::which(tesseract.command()) {
        Ok(path) => {
            let version = std::process::Command::new(&path)
                .arg("--version")
                .output()
                .ok()
                .and_then(|out| {
                    // Older builds print the version on stderr
                    let text = if out.stdout.is_empty() { out.stderr } else { out.stdout };
                    String::from_utf8_lossy(&text)
                        .lines()
                        .next()
                        .map(|l| l.trim().to_string())
                })
                .filter(|l| !l.is_empty() && l.len() < 80);
            match version {
                Some(v) => println!("  Tesseract: {} ({})", v, path.display()),
                None => println!("  Tesseract: {} (found)", path.display()),
            }
        }
        Err(_) => println!("  Tesseract: Not found (ocr strategy unavailable)"),
    }

    println!();
    println!("Config File Locations:");
    for path in Config::search_paths() {
        let marker = if path.is_file() { " (present)" } else { "" };
        println!("  {}{}", path.display(), marker);
    }

    Ok(())
}
