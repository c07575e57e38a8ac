use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use dockhand::config::Secret;
use dockhand::logging;
use dockhand::pipeline::{Mode, Pipeline};
use dockhand::prompt::{self, Presets};

#[derive(Parser)]
#[command(name = "dockhand")]
#[command(about = "Deploy a Dockerized Git repository to a Linux host behind Nginx")]
struct Cli {
    /// Tear down a previous deployment instead of deploying
    #[arg(long)]
    cleanup: bool,

    /// Show debug output on the console
    #[arg(short, long)]
    verbose: bool,

    /// Git repository URL
    #[arg(long, env = "DOCKHAND_REPO_URL")]
    repo_url: Option<String>,

    /// Branch to deploy
    #[arg(long, env = "DOCKHAND_BRANCH")]
    branch: Option<String>,

    /// SSH username on the server
    #[arg(long, env = "DOCKHAND_SSH_USER")]
    ssh_user: Option<String>,

    /// Server IP address or hostname
    #[arg(long, env = "DOCKHAND_SERVER_IP")]
    server_ip: Option<String>,

    /// Path to the SSH private key
    #[arg(long, env = "DOCKHAND_SSH_KEY")]
    ssh_key: Option<PathBuf>,

    /// Port the application listens on inside the container
    #[arg(long, env = "DOCKHAND_APP_PORT")]
    app_port: Option<u16>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_path = match logging::init(Path::new("."), cli.verbose) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Session log: {}", log_path.display());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let presets = Presets {
        repo_url: cli.repo_url,
        // Never taken from a flag: it would show up in `ps`.
        token: std::env::var("DOCKHAND_TOKEN").ok().map(|t| Secret::new(&t)),
        branch: cli.branch,
        ssh_user: cli.ssh_user,
        server_ip: cli.server_ip,
        ssh_key_path: cli.ssh_key,
        app_port: cli.app_port,
    };

    let config = prompt::collect(presets)?;
    let mode = if cli.cleanup {
        Mode::Cleanup
    } else {
        Mode::Deploy
    };

    Pipeline::new(config).run(mode)?;
    Ok(())
}
