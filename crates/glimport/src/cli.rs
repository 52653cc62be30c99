//! Clap derive structures for the `glimport` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// glimport -- adopt existing GitLab projects and groups into compositions
#[derive(Debug, Parser)]
#[command(
    name = "glimport",
    version,
    about = "Link Crossplane GitLab resources to projects and groups that already exist",
    long_about = "Resolves crossplane.io/external-name for provider-gitlab Project and Group\n\
        resources whose creation failed because the path is already taken.\n\n\
        `glimport run` processes one composition-function request document;\n\
        `glimport lookup` queries GitLab directly.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// GitLab instance URL (default https://gitlab.com/)
    #[arg(long, env = "GITLAB_URL", global = true)]
    pub gitlab_url: Option<String>,

    /// GitLab access token
    #[arg(long, env = "GITLAB_API_KEY", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Config file (default: platform config dir)
    #[arg(long, env = "GLIMPORT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "GLIMPORT_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "GLIMPORT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, env = "GLIMPORT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one reconciliation pass over a function request document
    Run(RunArgs),

    /// Resolve projects and groups directly against GitLab
    #[command(alias = "l")]
    Lookup(LookupArgs),

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Run ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Request document (JSON or YAML); `-` reads stdin
    #[arg(long, short = 'r', default_value = "-")]
    pub request: String,
}

// ── Lookup ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LookupArgs {
    #[command(subcommand)]
    pub command: LookupCommand,
}

#[derive(Debug, Subcommand)]
pub enum LookupCommand {
    /// Find a project by namespace id and path
    Project {
        /// Id of the group the project lives in
        #[arg(long)]
        namespace_id: i64,

        /// Project path (exact match)
        #[arg(long)]
        path: String,
    },

    /// Find a subgroup by parent group id and path
    Group {
        /// Id of the parent group
        #[arg(long)]
        parent_id: i64,

        /// Group path (exact match)
        #[arg(long)]
        path: String,
    },

    /// Print the namespaced path of a project
    FullPath {
        /// Project id
        project_id: i64,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration (token masked)
    Show,

    /// Print the config file location
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
