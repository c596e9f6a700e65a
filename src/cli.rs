use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "actionlink")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Keep a service action associated with a product's provisioning artifacts",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub catalog: CatalogArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run as a Lambda custom runtime (default)
    Serve(ServeArgs),

    /// Handle a single lifecycle event
    Invoke(InvokeArgs),

    /// Show the batch an event would produce without sending it
    Plan(PlanArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Catalog Settings
// ============================================================================

/// Where the target artifact set comes from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ArtifactSource {
    /// The `ProvisioningArtifactIds` property
    #[default]
    Declared,
    /// Every artifact the product currently has
    Discovered,
}

#[derive(Args, Debug, Clone)]
pub struct CatalogArgs {
    /// How the artifact set is determined
    #[arg(
        long,
        value_enum,
        env = "ARTIFACT_SOURCE",
        default_value_t = ArtifactSource::Declared,
        global = true
    )]
    pub artifact_source: ArtifactSource,

    /// AWS region of the catalog
    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    /// Override the catalog endpoint URL
    #[arg(long, env = "SERVICE_CATALOG_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Language code sent with catalog calls (en, jp, zh)
    #[arg(long, env = "SERVICE_CATALOG_ACCEPT_LANGUAGE", global = true)]
    pub accept_language: Option<String>,
}

// ============================================================================
// Subcommand Arguments
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Runtime API host:port
    #[arg(long, env = "AWS_LAMBDA_RUNTIME_API")]
    pub runtime_api: Option<String>,
}

impl ServeArgs {
    /// Settings for a bare `actionlink` launch, as a Lambda bootstrap does
    pub fn from_env() -> Self {
        Self {
            runtime_api: std::env::var("AWS_LAMBDA_RUNTIME_API")
                .ok()
                .filter(|api| !api.is_empty()),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InvokeArgs {
    /// Event JSON file, or - for stdin
    #[arg(short, long)]
    pub event: PathBuf,

    /// Also PUT the response to the event's ResponseURL
    #[arg(long)]
    pub respond: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Event JSON file, or - for stdin
    #[arg(short, long)]
    pub event: PathBuf,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}
