use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "condactl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative package management for conda environments", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Bring packages in an environment to the desired state
    Ensure(EnsureArgs),

    /// List packages installed in an environment
    List(EnvArgs),

    /// Check whether an environment exists (exit status 1 if not)
    Exists(EnvArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Ensure
// ============================================================================

#[derive(Args)]
pub struct EnsureArgs {
    /// Package names or specifiers (e.g. flask=1.0)
    #[arg(required = true, value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Desired state of the packages
    #[arg(short, long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,

    #[command(flatten)]
    pub env: EnvArgs,

    /// Extra channel to use (repeatable)
    #[arg(short, long = "channel", value_name = "CHANNEL")]
    pub channels: Vec<String>,

    /// Only report what would change (conda --dry-run)
    #[arg(long, alias = "dry-run")]
    pub check: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Present,
    Latest,
    Absent,
}

impl From<StateArg> for condakit::PackageState {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => Self::Present,
            StateArg::Latest => Self::Latest,
            StateArg::Absent => Self::Absent,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

// ============================================================================
// Shared environment selection
// ============================================================================

#[derive(Args, Clone, Default)]
pub struct EnvArgs {
    /// Environment name or path (default: config file, then "base")
    #[arg(short, long = "env", value_name = "ENV")]
    pub environment: Option<String>,

    /// Path of the conda executable
    #[arg(long, env = "CONDACTL_EXECUTABLE", value_name = "PATH")]
    pub executable: Option<PathBuf>,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show config file location and effective defaults
    Show,

    /// Print the config file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_defaults() {
        let cli = Cli::try_parse_from(["condactl", "ensure", "flask=1.0", "python"]).unwrap();
        let Command::Ensure(args) = cli.command else {
            panic!("expected ensure");
        };
        assert_eq!(args.packages, vec!["flask=1.0", "python"]);
        assert_eq!(args.state, StateArg::Present);
        assert_eq!(args.format, OutputFormat::Json);
        assert!(args.env.environment.is_none());
        assert!(args.channels.is_empty());
        assert!(!args.check);
    }

    #[test]
    fn test_ensure_all_flags() {
        let cli = Cli::try_parse_from([
            "condactl",
            "-v",
            "ensure",
            "flask",
            "--state",
            "absent",
            "--env",
            "/opt/conda/envs/web",
            "--executable",
            "/mypath/conda",
            "-c",
            "conda-forge",
            "--channel",
            "bioconda",
            "--check",
            "--format",
            "text",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Ensure(args) = cli.command else {
            panic!("expected ensure");
        };
        assert_eq!(args.state, StateArg::Absent);
        assert_eq!(args.env.environment.as_deref(), Some("/opt/conda/envs/web"));
        assert_eq!(args.env.executable, Some(PathBuf::from("/mypath/conda")));
        assert_eq!(args.channels, vec!["conda-forge", "bioconda"]);
        assert!(args.check);
        assert_eq!(args.format, OutputFormat::Text);
    }

    #[test]
    fn test_ensure_requires_packages() {
        assert!(Cli::try_parse_from(["condactl", "ensure"]).is_err());
    }

    #[test]
    fn test_dry_run_alias() {
        let cli = Cli::try_parse_from(["condactl", "ensure", "flask", "--dry-run"]).unwrap();
        let Command::Ensure(args) = cli.command else {
            panic!("expected ensure");
        };
        assert!(args.check);
    }

    #[test]
    fn test_state_conversion() {
        assert_eq!(
            condakit::PackageState::from(StateArg::Latest),
            condakit::PackageState::Latest
        );
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
