//! Command-line interface definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CliOverrides;
use crate::detect::TokenLevel;
use crate::progress::OutputMode;
use crate::strategy::StrategyKind;

/// Batch removal of printed text from scanned manga and comic pages
#[derive(Parser, Debug)]
#[command(name = "manga-text-eraser")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Erase text from every image in a folder
    Run(RunArgs),
    /// Show system information and tool availability
    Info,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Input folder (prompted for when omitted)
    pub input: Option<PathBuf>,

    /// Output folder (default: <INPUT>/output or <INPUT>/output_ocr)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Detection strategy: bubble (contour + fill) or ocr (boxes + whiteout)
    #[arg(short, long, value_parser = parse_strategy)]
    pub strategy: Option<StrategyKind>,

    /// Worker threads (0 = all CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum enclosed contour area in square pixels
    #[arg(long)]
    pub min_area: Option<f64>,

    /// Sample the fill color from the original image instead of the working copy
    #[arg(long)]
    pub sample_from_source: bool,

    /// Erase the simplified polygon instead of the raw contour
    #[arg(long)]
    pub simplify: bool,

    /// Tesseract language (e.g. eng, jpn, jpn_vert)
    #[arg(long)]
    pub ocr_lang: Option<String>,

    /// Shallowest OCR token level to erase (page, block, paragraph, line, word).
    ///
    /// Defaults to word: only word boxes are whited out and the coarser
    /// page/block/paragraph/line boxes are dropped.
    #[arg(long, value_parser = parse_token_level)]
    pub ocr_level: Option<TokenLevel>,

    /// Path to the tesseract executable
    #[arg(long)]
    pub tesseract: Option<PathBuf>,

    /// Do not ask to process more folders after the batch
    #[arg(short = 'y', long, visible_alias = "no-prompt")]
    pub yes: bool,

    /// Show the execution plan without processing
    #[arg(long)]
    pub dry_run: bool,

    /// Print the batch summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

fn parse_strategy(s: &str) -> Result<StrategyKind, String> {
    s.parse()
}

fn parse_token_level(s: &str) -> Result<TokenLevel, String> {
    s.parse()
}

impl RunArgs {
    /// Only flags the user actually set become overrides
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            strategy: self.strategy,
            min_area: self.min_area,
            simplify: self.simplify.then_some(true),
            sample_from_source: self.sample_from_source.then_some(true),
            tesseract: self.tesseract.clone(),
            ocr_language: self.ocr_lang.clone(),
            min_level: self.ocr_level,
            threads: self.threads,
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        if self.quiet || self.json {
            OutputMode::Quiet
        } else {
            OutputMode::from_verbosity(self.verbose)
        }
    }

    /// Max tracing level for the stderr subscriber
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::ERROR;
        }
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn run_args(cli: Cli) -> RunArgs {
        match cli.command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition_valid() {
        Cli::command().debug_assert();
    }

    // CLI-001: run with no flags leaves everything to the config
    #[test]
    fn test_run_defaults() {
        let args = run_args(parse(&["manga-text-eraser", "run"]));
        assert!(args.input.is_none());
        assert!(!args.yes);
        assert_eq!(args.to_overrides(), CliOverrides::default());
        assert_eq!(args.output_mode(), OutputMode::Normal);
        assert_eq!(args.log_level(), tracing::Level::WARN);
    }

    // CLI-002: flags become overrides
    #[test]
    fn test_run_overrides() {
        let args = run_args(parse(&[
            "manga-text-eraser",
            "run",
            "pages",
            "-s",
            "manga",
            "-j",
            "2",
            "--min-area",
            "900",
            "--simplify",
            "--ocr-lang",
            "jpn",
            "--ocr-level",
            "line",
            "--no-prompt",
        ]));
        assert_eq!(args.input, Some(PathBuf::from("pages")));
        assert!(args.yes);

        let overrides = args.to_overrides();
        assert_eq!(overrides.strategy, Some(StrategyKind::Ocr));
        assert_eq!(overrides.threads, Some(2));
        assert_eq!(overrides.min_area, Some(900.0));
        assert_eq!(overrides.simplify, Some(true));
        assert_eq!(overrides.sample_from_source, None);
        assert_eq!(overrides.ocr_language.as_deref(), Some("jpn"));
        assert_eq!(overrides.min_level, Some(TokenLevel::Line));
    }

    #[test]
    fn test_run_rejects_unknown_strategy() {
        assert!(Cli::try_parse_from(["manga-text-eraser", "run", "-s", "paint"]).is_err());
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["manga-text-eraser", "run", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        let args = run_args(parse(&["manga-text-eraser", "run", "-vv"]));
        assert_eq!(args.log_level(), tracing::Level::DEBUG);
        assert_eq!(args.output_mode(), OutputMode::VeryVerbose);

        let args = run_args(parse(&["manga-text-eraser", "run", "-q"]));
        assert_eq!(args.log_level(), tracing::Level::ERROR);
        assert_eq!(args.output_mode(), OutputMode::Quiet);

        let args = run_args(parse(&["manga-text-eraser", "run", "--json"]));
        assert_eq!(args.output_mode(), OutputMode::Quiet);
    }

    // CLI-003: --ocr-level help states the word-only default
    #[test]
    fn test_ocr_level_help_mentions_default() {
        let mut command = Cli::command();
        let run = command.find_subcommand_mut("run").unwrap();
        let help = run.render_long_help().to_string();
        assert!(help.contains("--ocr-level"));
        assert!(help.contains("Defaults to word"));
    }

    #[test]
    fn test_info_command() {
        assert!(matches!(parse(&["manga-text-eraser", "info"]).command, Commands::Info));
    }
}
