use crate::config::DeploymentConfig;
use crate::error::{DeployError, DeployResult};

const SITES_AVAILABLE: &str = "/etc/nginx/sites-available";
const SITES_ENABLED: &str = "/etc/nginx/sites-enabled";
const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 128;

/// Derive the project name from a clone URL: the last path
/// segment, `.git` stripped, lower-cased.
///
/// ```
/// use dockhand::naming::repo_name;
///
/// let name = repo_name("https://github.com/acme/Shop-App.git").unwrap();
/// assert_eq!(name, "shop-app");
/// ```
pub fn repo_name(url: &str) -> DeployResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let base = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let base = base.strip_suffix(".git").unwrap_or(base);
    let name = base.to_ascii_lowercase();

    validate_name(&name)?;
    Ok(name)
}

/// Names end up in file paths, image tags and container names, so
/// they must fit Docker's name component grammar: lowercase
/// alphanumeric runs joined by single `.`, `_` or `-`, at least two
/// characters long.
fn validate_name(name: &str) -> DeployResult<()> {
    let is_sep = |c: char| matches!(c, '.' | '_' | '-');
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || is_sep(c));
    let alnum_ends = name.starts_with(|c: char| c.is_ascii_alphanumeric())
        && name.ends_with(|c: char| c.is_ascii_alphanumeric());
    let single_seps = !name
        .as_bytes()
        .windows(2)
        .any(|w| is_sep(char::from(w[0])) && is_sep(char::from(w[1])));

    if name.len() < MIN_NAME_LEN
        || name.len() > MAX_NAME_LEN
        || !valid_chars
        || !alnum_ends
        || !single_seps
    {
        return Err(DeployError::InputValidation(format!(
            "cannot derive a safe project name from '{name}'"
        )));
    }
    Ok(())
}

/// The identifiers of one deployment on the remote host. All of
/// them are pure functions of the repository URL, the SSH user and
/// the application port, which is what makes re-runs and cleanup
/// find the previous deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedUnit {
    /// Container name, image tag and compose project name.
    pub name: String,
    pub remote_dir: String,
    pub nginx_available: String,
    pub nginx_enabled: String,
    pub app_port: u16,
}

impl DeployedUnit {
    pub fn derive(config: &DeploymentConfig) -> DeployResult<Self> {
        let name = repo_name(&config.repo_url)?;
        let home = if config.ssh_user == "root" {
            "/root".to_string()
        } else {
            format!("/home/{}", config.ssh_user)
        };

        Ok(Self {
            remote_dir: format!("{home}/{name}"),
            nginx_available: format!("{SITES_AVAILABLE}/{name}"),
            nginx_enabled: format!("{SITES_ENABLED}/{name}"),
            app_port: config.app_port,
            name,
        })
    }

    /// Image tag used for Dockerfile builds.
    #[must_use]
    pub fn image(&self) -> String {
        format!("{}:latest", self.name)
    }
}
