use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{DeployError, DeployResult};
use crate::naming;

pub const DEFAULT_BRANCH: &str = "main";

/// A credential that never shows up in `Debug` or `Display`
/// output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(****)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Everything one deployment run needs. Built once, validated,
/// then only read.
///
/// # Example
///
/// ```
/// use dockhand::DeploymentConfig;
///
/// let config = DeploymentConfig::new(
///     "https://github.com/acme/Shop-App.git",
///     "ubuntu",
///     "203.0.113.10",
///     "/home/me/.ssh/id_ed25519",
///     3000,
/// )
/// .branch("release");
///
/// assert_eq!(config.branch, "release");
/// assert_eq!(config.app_port, 3000);
/// ```
#[derive(Debug, Clone)]
pub struct DeploymentConfig {
    pub repo_url: String,
    pub branch: String,
    pub ssh_user: String,
    pub server_ip: String,
    pub ssh_key_path: PathBuf,
    pub app_port: u16,
    pub token: Secret,
}

impl DeploymentConfig {
    #[must_use]
    pub fn new(
        repo_url: &str,
        ssh_user: &str,
        server_ip: &str,
        ssh_key_path: impl AsRef<Path>,
        app_port: u16,
    ) -> Self {
        Self {
            repo_url: repo_url.trim().to_string(),
            branch: DEFAULT_BRANCH.to_string(),
            ssh_user: ssh_user.trim().to_string(),
            server_ip: server_ip.trim().to_string(),
            ssh_key_path: ssh_key_path.as_ref().to_path_buf(),
            app_port,
            token: Secret::default(),
        }
    }

    #[must_use]
    pub fn branch(mut self, branch: &str) -> Self {
        let branch = branch.trim();
        if !branch.is_empty() {
            self.branch = branch.to_string();
        }
        self
    }

    #[must_use]
    pub fn token(mut self, token: Secret) -> Self {
        self.token = token;
        self
    }

    /// Check every field before anything touches the network.
    pub fn validate(&self) -> DeployResult<()> {
        require("repository URL", &self.repo_url)?;
        require("access token", self.token.expose())?;
        require("branch", &self.branch)?;
        require("SSH username", &self.ssh_user)?;
        require("server address", &self.server_ip)?;

        if !self.repo_url.contains("://") && !self.repo_url.contains('@') {
            return Err(invalid(format!(
                "repository URL '{}' is not a clone URL",
                self.repo_url
            )));
        }
        naming::repo_name(&self.repo_url)?;

        validate_branch(&self.branch)?;
        validate_user(&self.ssh_user)?;
        validate_host(&self.server_ip)?;

        if self.app_port == 0 {
            return Err(invalid("application port must be between 1 and 65535"));
        }

        if self.ssh_key_path.as_os_str().is_empty() {
            return Err(invalid("SSH key path is required"));
        }
        if !self.ssh_key_path.is_file() {
            return Err(invalid(format!(
                "SSH key file not found: {}",
                self.ssh_key_path.display()
            )));
        }

        Ok(())
    }
}

/// Where and as whom remote commands run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub user: String,
    pub key_path: PathBuf,
}

impl From<&DeploymentConfig> for RemoteTarget {
    fn from(config: &DeploymentConfig) -> Self {
        Self {
            host: config.server_ip.clone(),
            user: config.ssh_user.clone(),
            key_path: config.ssh_key_path.clone(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> DeployError {
    DeployError::InputValidation(msg.into())
}

fn require(field: &str, value: &str) -> DeployResult<()> {
    if value.trim().is_empty() {
        Err(invalid(format!("{field} is required")))
    } else {
        Ok(())
    }
}

const SHELL_META: &[char] = &[
    ';', '&', '|', '$', '`', '\\', '"', '\'', '<', '>', '(', ')', '{', '}', '*', '?', '[', ']',
    '!', '~', '^', ':',
];

fn validate_branch(branch: &str) -> DeployResult<()> {
    if branch.starts_with('-')
        || branch.contains("..")
        || branch.ends_with('/')
        || branch.ends_with(".lock")
        || branch
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || SHELL_META.contains(&c))
    {
        return Err(invalid(format!("branch '{branch}' is not a valid ref name")));
    }
    Ok(())
}

fn validate_user(user: &str) -> DeployResult<()> {
    let mut chars = user.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
    // One trailing `$` is allowed, as on Samba machine accounts.
    let rest_ok = user
        .strip_suffix('$')
        .unwrap_or(user)
        .chars()
        .skip(1)
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');

    if first_ok && rest_ok && user.len() <= 32 {
        Ok(())
    } else {
        Err(invalid(format!("SSH username '{user}' is not a valid login name")))
    }
}

fn validate_host(host: &str) -> DeployResult<()> {
    let ok = !host.starts_with('-')
        && host.len() <= 253
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));

    if ok {
        Ok(())
    } else {
        Err(invalid(format!("server address '{host}' is not a hostname or IP")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key(key: &Path) -> DeploymentConfig {
        DeploymentConfig::new(
            "https://github.com/acme/Shop-App.git",
            "ubuntu",
            "203.0.113.10",
            key,
            3000,
        )
        .token(Secret::new("ghp_example"))
    }

    #[test]
    fn secret_is_redacted() {
        let secret = Secret::new("ghp_super_secret");

        assert_eq!(format!("{secret:?}"), "Secret(****)");
        assert_eq!(secret.to_string(), "****");
        assert_eq!(secret.expose(), "ghp_super_secret");
    }

    #[test]
    fn debug_of_config_hides_token() {
        let key = tempfile::NamedTempFile::new().unwrap();
        let config = config_with_key(key.path());

        assert!(!format!("{config:?}").contains("ghp_example"));
    }

    #[test]
    fn valid_config_passes() {
        let key = tempfile::NamedTempFile::new().unwrap();
        config_with_key(key.path()).validate().unwrap();
    }

    #[test]
    fn empty_branch_keeps_default() {
        let config = DeploymentConfig::new("u", "x", "h", "k", 1).branch("  ");
        assert_eq!(config.branch, "main");
    }

    #[test]
    fn missing_token_rejected() {
        let key = tempfile::NamedTempFile::new().unwrap();
        let config = config_with_key(key.path()).token(Secret::default());

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("access token"));
    }

    #[test]
    fn zero_port_rejected() {
        let key = tempfile::NamedTempFile::new().unwrap();
        let mut config = config_with_key(key.path());
        config.app_port = 0;

        assert!(matches!(
            config.validate(),
            Err(DeployError::InputValidation(_))
        ));
    }

    #[test]
    fn branch_with_shell_metacharacters_rejected() {
        for bad in ["main;rm -rf /", "-x", "a..b", "$(id)", "with space"] {
            assert!(validate_branch(bad).is_err(), "{bad}");
        }
        for good in ["main", "release/1.2", "feature-x_y"] {
            assert!(validate_branch(good).is_ok(), "{good}");
        }
    }

    #[test]
    fn users_follow_login_rules() {
        assert!(validate_user("ubuntu").is_ok());
        assert!(validate_user("_svc-1").is_ok());
        assert!(validate_user("Root").is_err());
        assert!(validate_user("me;id").is_err());
        assert!(validate_user("host$").is_ok());
        assert!(validate_user("a$$$").is_err());
        assert!(validate_user("a$b").is_err());
        assert!(validate_user("").is_err());
    }

    #[test]
    fn hosts_accept_names_and_ips() {
        assert!(validate_host("203.0.113.10").is_ok());
        assert!(validate_host("2001:db8::1").is_ok());
        assert!(validate_host("app.example.com").is_ok());
        assert!(validate_host("-oProxyCommand=x").is_err());
        assert!(validate_host("host name").is_err());
    }

    #[test]
    fn remote_target_uses_validated_fields() {
        let config = DeploymentConfig::new("u", "deploy", "10.0.0.5", "/k", 80);
        let target = RemoteTarget::from(&config);

        assert_eq!(target.host, "10.0.0.5");
        assert_eq!(target.user, "deploy");
        assert_eq!(target.key_path, PathBuf::from("/k"));
    }
}
