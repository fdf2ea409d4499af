//! vtimeline - Entry Point

use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// vtimeline - scroll a JSONL post feed through a virtualized timeline
#[derive(Parser, Debug)]
#[command(name = "vtimeline")]
#[command(version)]
#[command(about = "Scroll a JSONL post feed through a virtualized timeline")]
pub struct Args {
    /// Path to JSONL feed file (one post per line)
    pub feed: PathBuf,

    /// Show only posts of this category
    #[arg(short, long)]
    pub category: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Rows kept mounted above and below the viewport
    #[arg(long)]
    pub overscan: Option<u32>,

    /// Posts fetched per page (must be positive)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub page_size: Option<u64>,

    /// Disable colors
    #[arg(long)]
    pub no_color: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration with full precedence chain:
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        // 1. Load config file (or None if missing)
        let config_file = vtimeline::config::load_config_with_precedence(args.config.clone())?;

        // 2. Merge with defaults
        let merged = vtimeline::config::merge_config(config_file);

        // 3. Apply environment variable overrides
        let with_env = vtimeline::config::apply_env_overrides(merged);

        // 4. Apply CLI argument overrides (only flags the user passed)
        let page_size = args.page_size.and_then(|n| usize::try_from(n).ok());
        vtimeline::config::apply_cli_overrides(
            with_env,
            args.category.clone(),
            args.overscan,
            page_size,
        )
    };

    // Initialize tracing with configured log file path
    vtimeline::logging::init(&config.log_file_path)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let feed = vtimeline::source::JsonlFeed::open(&args.feed)?;
    let colors = vtimeline::view::ColorConfig::from_env_and_args(args.no_color);
    let options = vtimeline::view::AppOptions::from_config(&config, colors);

    // Single-threaded: the engine is driven from one event loop
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(vtimeline::view::run_with_feed(feed, options))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_help_does_not_error() {
        // Help should succeed (exits with code 0)
        let result = Args::try_parse_from(["vtimeline", "--help"]);
        // Help returns Err with DisplayHelp, which is success
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_version_does_not_error() {
        let result = Args::try_parse_from(["vtimeline", "--version"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_feed_is_required() {
        let result = Args::try_parse_from(["vtimeline"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_defaults_leave_overrides_unset() {
        let args = Args::parse_from(["vtimeline", "feed.jsonl"]);
        assert_eq!(args.feed, PathBuf::from("feed.jsonl"));
        assert_eq!(args.category, None);
        assert_eq!(args.config, None);
        assert_eq!(args.overscan, None);
        assert_eq!(args.page_size, None);
        assert!(!args.no_color);
    }

    #[test]
    fn test_all_flags() {
        let args = Args::parse_from([
            "vtimeline",
            "feed.jsonl",
            "--category",
            "rust",
            "--config",
            "/tmp/vt.toml",
            "--overscan",
            "40",
            "--page-size",
            "25",
            "--no-color",
        ]);
        assert_eq!(args.category.as_deref(), Some("rust"));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/vt.toml")));
        assert_eq!(args.overscan, Some(40));
        assert_eq!(args.page_size, Some(25));
        assert!(args.no_color);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let result = Args::try_parse_from(["vtimeline", "feed.jsonl", "--page-size", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_short_category_flag() {
        let args = Args::parse_from(["vtimeline", "-c", "go", "feed.jsonl"]);
        assert_eq!(args.category.as_deref(), Some("go"));
    }
}
