mod config;
mod lookup;
mod resolve;
mod timeline;
mod viewer;

use std::io::ErrorKind;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use sessionlens_logging::{init_tracing, LogFormat};

use config::Config;
use timeline::{handle_timeline_command, write_stdout, TimelineArgs};

#[derive(Parser, Debug)]
#[command(
    name = "sessionlens",
    about = "Compact timelines of recorded coding-assistant sessions",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Diagnostic log level (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Diagnostic log format: pretty, compact or json
    #[arg(long, global = true, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a session as a timeline of events
    Timeline(TimelineArgs),

    /// Print the log file a session id resolves to
    ResolveSession {
        /// Session ID (or prefix) or path to a session log
        input: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    if let Err(err) = run(cli).await {
        if is_broken_pipe(&err) {
            std::process::exit(0);
        }
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let config = Config::load(&working_dir)?.unwrap_or_default();

    match cli.command {
        Commands::Timeline(args) => handle_timeline_command(args, &config).await,
        Commands::ResolveSession { input } => {
            let roots = resolve::search_roots(config.claude_dir());
            let path = resolve::resolve_session(&input, &roots)?;
            write_stdout(&path.display().to_string())?;
            Ok(())
        }
    }
}

/// True when a reader such as `head` closed stdout early.
fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|e| e.kind() == ErrorKind::BrokenPipe)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["sessionlens", "timeline", "abc123", "-t", "UR"]).unwrap();
        assert!(matches!(cli.command, Commands::Timeline(ref args) if args.types.as_deref() == Some("UR")));
        assert_eq!(cli.log_level, "warn");

        let cli = Cli::try_parse_from([
            "sessionlens",
            "resolve-session",
            "abc123",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::ResolveSession { ref input } if input == "abc123"));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_flag() {
        let cli = Cli::try_parse_from(["sessionlens", "resolve-session", "x"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Pretty);

        let cli =
            Cli::try_parse_from(["sessionlens", "--log-format", "Compact", "resolve-session", "x"])
                .unwrap();
        assert_eq!(cli.log_format, LogFormat::Compact);

        assert!(Cli::try_parse_from(["sessionlens", "--log-format", "xml", "resolve-session", "x"]).is_err());
    }

    #[test]
    fn test_is_broken_pipe() {
        let err = anyhow::Error::from(std::io::Error::from(ErrorKind::BrokenPipe));
        assert!(is_broken_pipe(&err));

        let err = anyhow::Error::from(std::io::Error::from(ErrorKind::BrokenPipe)).context("writing");
        assert!(is_broken_pipe(&err));

        let err = anyhow::anyhow!("something else");
        assert!(!is_broken_pipe(&err));
    }
}
