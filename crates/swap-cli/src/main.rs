use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

mod commands;
mod output;
mod settings;

#[derive(Parser)]
#[command(
    name = "swap",
    about = "Blue/green deployments for Kubernetes services",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to a swap.toml (default: ./swap.toml when present)
    #[arg(long, global = true, env = "SWAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Delay between readiness/absence polls, e.g. "500ms", "5s"
    #[arg(long, global = true, env = "SWAP_POLL_INTERVAL")]
    pub poll_interval: Option<String>,

    /// Polls before giving up on a replica group
    #[arg(long, global = true, env = "SWAP_MAX_ATTEMPTS")]
    pub max_attempts: Option<u32>,

    /// Deadline for the whole operation, e.g. "10m"
    #[arg(long, global = true, env = "SWAP_TIMEOUT")]
    pub timeout: Option<String>,

    /// Report format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Which service, and where.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Service name
    #[arg(short, long)]
    pub service: String,

    /// Namespace (default: [cluster].namespace, then "default")
    #[arg(short, long, env = "SWAP_NAMESPACE")]
    pub namespace: Option<String>,

    /// Kubeconfig file (default: $KUBECONFIG, ~/.kube/config, in-cluster)
    #[arg(short = 'f', long)]
    pub kubeconfig: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Roll a new image out to the idle variant and switch traffic to it.
    ///
    /// The previous replica group is scaled to zero and recorded on the
    /// service so `swap rollback` can restore it.
    Deploy {
        #[command(flatten)]
        target: TargetArgs,
        /// Image to run
        #[arg(short, long)]
        image: String,
        /// Container in the pod template whose image is replaced
        #[arg(short, long)]
        container: String,
    },
    /// Switch traffic back to the replica group replaced by the last deploy.
    Rollback {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("swap=info,swapgrid=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            target,
            image,
            container,
        } => commands::deploy::run(&cli.global, &target, &image, &container).await,
        Commands::Rollback { target } => commands::rollback::run(&cli.global, &target).await,
    }
}
