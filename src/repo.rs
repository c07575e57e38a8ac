use std::path::{Path, PathBuf};

use crate::cmd;
use crate::config::DeploymentConfig;
use crate::error::DeployResult;
use crate::naming;

/// Embed the token into an `https://` clone URL. Other schemes
/// (ssh, scp-style) authenticate with keys and are returned as-is.
///
/// ```
/// use dockhand::repo::authenticated_url;
///
/// let url = authenticated_url("https://github.com/acme/app.git", "t0k");
/// assert_eq!(url, "https://t0k@github.com/acme/app.git");
/// ```
#[must_use]
pub fn authenticated_url(url: &str, token: &str) -> String {
    if token.is_empty() {
        return url.to_string();
    }
    match url.strip_prefix("https://") {
        Some(rest) => {
            // Drop credentials already present in the URL.
            let rest = match rest.split_once('@') {
                Some((creds, host)) if !creds.contains('/') => host,
                _ => rest,
            };
            format!("https://{}@{rest}", urlencoding::encode(token))
        }
        None => url.to_string(),
    }
}

/// Bring `<parent>/<repo name>` to the tip of the configured
/// branch, cloning when no checkout exists yet. Returns the path of
/// the working tree.
///
/// The token only ever appears on the git command line. A fresh
/// clone has its `origin` reset to the plain URL so nothing
/// credential-bearing is written into `.git/config`.
pub fn sync(config: &DeploymentConfig, parent: &Path) -> DeployResult<PathBuf> {
    let name = naming::repo_name(&config.repo_url)?;
    let dir = parent.join(&name);
    let token = config.token.expose();
    let authed = authenticated_url(&config.repo_url, token);
    let encoded = urlencoding::encode(token).into_owned();
    let secret = Some(encoded.as_str()).filter(|t| !t.is_empty());
    let branch = config.branch.as_str();

    if dir.join(".git").is_dir() {
        tracing::info!("Repository {name} exists, updating branch {branch}");
        let dir_str = dir.to_string_lossy().to_string();
        let refspec = format!("+refs/heads/{branch}:refs/remotes/origin/{branch}");
        cmd::run_masked("git", &["-C", &dir_str, "fetch", &authed, &refspec], secret)?;
        cmd::run("git", &["-C", &dir_str, "checkout", branch])?;
        cmd::run_masked("git", &["-C", &dir_str, "pull", &authed, branch], secret)?;
    } else {
        tracing::info!("Cloning {} (branch {branch})", config.repo_url);
        let dir_str = dir.to_string_lossy().to_string();
        cmd::run_masked(
            "git",
            &["clone", "--branch", branch, &authed, &dir_str],
            secret,
        )?;
        cmd::run(
            "git",
            &["-C", &dir_str, "remote", "set-url", "origin", &config.repo_url],
        )?;
    }

    tracing::info!("Working tree ready at {}", dir.display());
    Ok(dir)
}
