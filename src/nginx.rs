use std::fmt::Write;

use crate::error::{DeployError, DeployResult};
use crate::naming::DeployedUnit;
use crate::remote::{self, Outcome, RemoteOp, RemoteShell};

/// Site shipped enabled by the distribution's nginx package. It
/// claims `default_server` on port 80 and would shadow ours.
pub const DISTRO_DEFAULT_SITE: &str = "/etc/nginx/sites-enabled/default";

/// One Nginx server block forwarding everything to a local port.
///
/// # Example
///
/// ```
/// use dockhand::NginxSite;
///
/// let site = NginxSite::new(3000);
///
/// assert_eq!(site.listen, 80);
/// assert_eq!(site.server_name, "_");
/// assert!(site.render().contains("listen 80 default_server;"));
/// assert!(site.render().contains("proxy_pass http://localhost:3000;"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NginxSite {
    pub listen: u16,
    /// Answer requests whose `Host` matches no other server block.
    pub default_server: bool,
    pub server_name: String,
    pub upstream_port: u16,
    pub headers: Vec<(String, String)>,
}

impl NginxSite {
    #[must_use]
    pub fn new(upstream_port: u16) -> Self {
        Self {
            listen: 80,
            default_server: true,
            server_name: "_".to_string(),
            upstream_port,
            headers: vec![
                ("Host".to_string(), "$host".to_string()),
                ("X-Real-IP".to_string(), "$remote_addr".to_string()),
                (
                    "X-Forwarded-For".to_string(),
                    "$proxy_add_x_forwarded_for".to_string(),
                ),
                ("X-Forwarded-Proto".to_string(), "$scheme".to_string()),
            ],
        }
    }

    #[must_use]
    pub fn for_unit(unit: &DeployedUnit) -> Self {
        Self::new(unit.app_port)
    }

    /// Render the server block. Output depends only on the fields,
    /// so identical inputs give byte-identical files.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "server {{");
        if self.default_server {
            let _ = writeln!(out, "    listen {} default_server;", self.listen);
        } else {
            let _ = writeln!(out, "    listen {};", self.listen);
        }
        let _ = writeln!(out, "    server_name {};", self.server_name);
        let _ = writeln!(out);
        let _ = writeln!(out, "    location / {{");
        let _ = writeln!(
            out,
            "        proxy_pass http://localhost:{};",
            self.upstream_port
        );
        for (name, value) in &self.headers {
            let _ = writeln!(out, "        proxy_set_header {name} {value};");
        }
        let _ = writeln!(out, "    }}");
        let _ = writeln!(out, "}}");
        out
    }
}

/// Install the server block for `unit` and reload Nginx.
///
/// The stale `sites-enabled` link and the distribution's default
/// site are removed before relinking. A failing `nginx -t` aborts
/// before the reload so the running configuration is never replaced
/// by a broken one.
pub fn configure(shell: &dyn RemoteShell, unit: &DeployedUnit) -> DeployResult<()> {
    let site = NginxSite::for_unit(unit);

    remote::apply(
        shell,
        &RemoteOp::WriteFile {
            path: unit.nginx_available.clone(),
            content: site.render(),
        },
    )?;
    remote::apply(shell, &RemoteOp::RemoveFile(unit.nginx_enabled.clone()))?;
    remote::apply(
        shell,
        &RemoteOp::RemoveFile(DISTRO_DEFAULT_SITE.to_string()),
    )?;
    remote::apply(
        shell,
        &RemoteOp::Symlink {
            target: unit.nginx_available.clone(),
            link: unit.nginx_enabled.clone(),
        },
    )?;

    validate(shell)?;

    remote::apply(shell, &RemoteOp::ReloadService("nginx".to_string()))?;
    tracing::info!(
        "Nginx routes :{} -> localhost:{}",
        site.listen,
        site.upstream_port
    );
    Ok(())
}

/// Run `nginx -t`, mapping a rejection to
/// [`DeployError::ProxyConfigInvalid`].
pub fn validate(shell: &dyn RemoteShell) -> DeployResult<()> {
    match remote::apply(shell, &RemoteOp::ValidateNginx) {
        Ok(Outcome::Applied(_) | Outcome::Skipped) => Ok(()),
        Ok(Outcome::Tolerated(stderr)) | Err(DeployError::RemoteCommand { stderr, .. }) => {
            Err(DeployError::ProxyConfigInvalid(stderr))
        }
        Err(e) => Err(e),
    }
}
