use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Global configuration for the sync engine
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    /// Gateway-facing settings (artifact paths, SSL material, reload hooks)
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Local storage settings
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewaySettings {
    /// Directory the per-route artifacts are written into
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,

    /// Path of the combined artifact covering all active routes
    /// (default: {config_dir}/global_apps.conf)
    pub global_config_path: Option<PathBuf>,

    /// Path to the SSL certificate (PEM). TLS blocks are only emitted when
    /// both this and the key are configured.
    pub ssl_certificate: Option<PathBuf>,

    /// Path to the SSL certificate key (PEM)
    pub ssl_certificate_key: Option<PathBuf>,

    /// Command run to validate gateway syntax before reloading,
    /// e.g. "nginx -t"
    pub check_command: Option<String>,

    /// Command run to reload the gateway after a clean sync,
    /// e.g. "systemctl reload nginx"
    pub reload_command: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Path of the SQLite registry database
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Path of the dotenv file managed by the env subcommands
    #[serde(default = "default_env_path")]
    pub env_path: PathBuf,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("/etc/nginx/conf.d")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("routesync.db")
}

fn default_env_path() -> PathBuf {
    PathBuf::from(".env")
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            global_config_path: None,
            ssl_certificate: None,
            ssl_certificate_key: None,
            check_command: None,
            reload_command: None,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            env_path: default_env_path(),
        }
    }
}

impl GatewaySettings {
    /// Both cert paths must be present for any TLS block to be emitted
    pub fn has_ssl_files(&self) -> bool {
        self.ssl_certificate.is_some() && self.ssl_certificate_key.is_some()
    }

    /// Resolved global artifact path
    pub fn global_config_path(&self) -> PathBuf {
        self.global_config_path
            .clone()
            .unwrap_or_else(|| self.config_dir.join("global_apps.conf"))
    }

    /// Default per-route artifact path for a (host, port, path) triple
    pub fn route_config_path(&self, host: &str, port: u16, path: &str) -> PathBuf {
        self.config_dir
            .join(format!("{}_{}_{}.conf", host, port, path))
    }
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate all configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut errors = Vec::new();

        if self.gateway.config_dir.as_os_str().is_empty() {
            errors.push("gateway.config_dir must not be empty".to_string());
        }
        if self.gateway.ssl_certificate.is_some() != self.gateway.ssl_certificate_key.is_some() {
            errors.push(
                "gateway.ssl_certificate and gateway.ssl_certificate_key must be set together"
                    .to_string(),
            );
        }
        for (key, cmd) in [
            ("gateway.check_command", &self.gateway.check_command),
            ("gateway.reload_command", &self.gateway.reload_command),
        ] {
            if let Some(cmd) = cmd {
                match shell_words::split(cmd) {
                    Ok(words) if words.is_empty() => {
                        errors.push(format!("{} must not be empty", key))
                    }
                    Ok(_) => {}
                    Err(e) => errors.push(format!("{} is not a valid command: {}", key, e)),
                }
            }
        }

        if !errors.is_empty() {
            anyhow::bail!("Configuration errors:\n  - {}", errors.join("\n  - "));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let toml = r#"
[gateway]
config_dir = "/srv/nginx/conf.d"
ssl_certificate = "/etc/ssl/certs/cert.pem"
ssl_certificate_key = "/etc/ssl/private/key.pem"
reload_command = "systemctl reload nginx"

[storage]
db_path = "/var/lib/routesync/routes.db"
"#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.gateway.config_dir, PathBuf::from("/srv/nginx/conf.d"));
        assert!(settings.gateway.has_ssl_files());
        assert_eq!(
            settings.gateway.global_config_path(),
            PathBuf::from("/srv/nginx/conf.d/global_apps.conf")
        );
        assert_eq!(
            settings.storage.db_path,
            PathBuf::from("/var/lib/routesync/routes.db")
        );
        settings.validate().unwrap();
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.gateway.config_dir, PathBuf::from("/etc/nginx/conf.d"));
        assert!(!settings.gateway.has_ssl_files());
        assert_eq!(
            settings.gateway.global_config_path(),
            PathBuf::from("/etc/nginx/conf.d/global_apps.conf")
        );
        assert_eq!(settings.storage.env_path, PathBuf::from(".env"));
    }

    #[test]
    fn test_route_config_path_derivation() {
        let gateway = GatewaySettings::default();
        assert_eq!(
            gateway.route_config_path("localhost", 8001, "api"),
            PathBuf::from("/etc/nginx/conf.d/localhost_8001_api.conf")
        );
    }

    #[test]
    fn test_validate_rejects_lone_certificate() {
        let settings: Settings = toml::from_str(
            r#"
[gateway]
ssl_certificate = "/etc/ssl/certs/cert.pem"
"#,
        )
        .unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unparseable_command() {
        let settings: Settings = toml::from_str(
            r#"
[gateway]
reload_command = "systemctl reload 'nginx"
"#,
        )
        .unwrap();
        assert!(settings.validate().is_err());
    }
}
