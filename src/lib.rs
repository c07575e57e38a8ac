//! Deploy a Dockerized Git repository to a Linux host.
//!
//! dockhand clones (or updates) a repository, ships the working
//! tree to a server over SSH, builds and runs it with Docker or
//! Docker Compose, and puts an Nginx reverse proxy on port 80 in
//! front of it. Re-running against the same repository replaces the
//! previous deployment; `--cleanup` removes it.
//!
//! # Overview
//!
//! A run is a [`Pipeline`] over one [`DeploymentConfig`]:
//!
//! 1. **Input** - validate every field before any network call
//! 2. **Repository** - clone or fast-forward the branch locally
//! 3. **Artifact** - find a Compose file or a `Dockerfile`
//! 4. **Reachability** - ping (advisory) then an SSH no-op
//! 5. **Bootstrap** - install Docker, Compose and Nginx if missing
//! 6. **Redeploy** - retire the previous container and proxy link
//! 7. **Build** - rsync the tree, build and start the application
//! 8. **Proxy** - write, link, test and reload the Nginx site
//! 9. **Validation** - container running, health, HTTP probe
//!
//! Every remote change is a typed [`RemoteOp`](remote::RemoteOp)
//! run through a [`RemoteShell`](remote::RemoteShell), so a step
//! sequence can be checked without a server.
//!
//! # Example
//!
//! ```rust,no_run
//! use dockhand::config::Secret;
//! use dockhand::{DeploymentConfig, Mode, Pipeline};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = DeploymentConfig::new(
//!         "https://github.com/acme/Shop-App.git",
//!         "ubuntu",
//!         "203.0.113.10",
//!         "/home/me/.ssh/id_ed25519",
//!         3000,
//!     )
//!     .token(Secret::new("ghp_..."));
//!
//!     Pipeline::new(config).run(Mode::Deploy)?;
//!     Ok(())
//! }
//! ```

#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod artifact;
pub mod bootstrap;
pub mod cleanup;
pub mod cmd;
pub mod config;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod naming;
pub mod nginx;
pub mod pipeline;
pub mod prompt;
pub mod remote;
pub mod repo;
pub mod ssh;
pub mod validate;

pub use artifact::ArtifactKind;
pub use config::{DeploymentConfig, RemoteTarget};
pub use naming::DeployedUnit;
pub use nginx::NginxSite;
pub use pipeline::{Mode, Pipeline};
pub use ssh::SshSession;
