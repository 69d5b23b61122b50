use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RegistrarError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub registrar: RegistrarConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Reseller account the adapter talks to OpenProvider with.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    api_url: String,
    #[serde(default)]
    debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// File the request journal is appended to, if any.
    #[serde(default)]
    pub request_log: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            request_log: None,
        }
    }
}

impl RegistrarConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Result<Self, RegistrarError> {
        let config = Self {
            username: username.into(),
            password: password.into(),
            api_url: api_url.into(),
            debug: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Fill in a password kept outside `config.toml`.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn validate(&self) -> Result<(), RegistrarError> {
        if self.username.trim().is_empty() {
            return Err(RegistrarError::Config {
                parameter: "Reseller Username",
            });
        }
        if self.password.is_empty() {
            return Err(RegistrarError::Config {
                parameter: "Reseller Password",
            });
        }
        if self.api_url.trim().is_empty() {
            return Err(RegistrarError::Config {
                parameter: "API url",
            });
        }
        Ok(())
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Copy safe to print or log.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.password.is_empty() {
            copy.password = "********".to_string();
        }
        copy
    }

    /// The configuration form the hosting platform renders for this registrar.
    pub fn form() -> ConfigForm {
        ConfigForm {
            label: "OpenProvider registrar",
            fields: vec![
                FormField {
                    name: "Username",
                    kind: FieldKind::Text,
                    label: "Username",
                    description: "",
                    required: true,
                },
                FormField {
                    name: "Password",
                    kind: FieldKind::Password,
                    label: "Password",
                    description: "",
                    required: true,
                },
                FormField {
                    name: "ApiUrl",
                    kind: FieldKind::Text,
                    label: "Api url",
                    description: "",
                    required: true,
                },
            ],
        }
    }
}

impl fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrarConfig")
            .field("username", &self.username)
            .field("password", &"********")
            .field("api_url", &self.api_url)
            .field("debug", &self.debug)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigForm {
    pub label: &'static str,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
    pub description: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Password,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => f.pad("text"),
            FieldKind::Password => f.pad("password"),
        }
    }
}

impl Settings {
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        Ok(settings)
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn config_dir() -> PathBuf {
        #[cfg(unix)]
        {
            PathBuf::from("/etc/opregistrar")
        }
        #[cfg(windows)]
        {
            PathBuf::from(r"C:\ProgramData\opregistrar")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[registrar]
username = "reseller"
password = "hunter2"
api_url = "https://api.openprovider.eu"

[logging]
log_level = "debug"
request_log = "/var/log/opregistrar/requests.log"
"#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.registrar.username(), "reseller");
        assert_eq!(settings.registrar.api_url(), "https://api.openprovider.eu");
        assert!(!settings.registrar.debug());
        assert!(settings.registrar.validate().is_ok());
        assert_eq!(settings.logging.log_level, "debug");
        assert_eq!(
            settings.logging.request_log,
            Some(PathBuf::from("/var/log/opregistrar/requests.log"))
        );
    }

    #[test]
    fn test_logging_defaults() {
        let toml_str = r#"
[registrar]
username = "reseller"
api_url = "https://api.openprovider.eu"
"#;

        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.logging.log_level, "info");
        assert!(settings.logging.request_log.is_none());
        assert!(!settings.registrar.has_password());
    }

    #[test]
    fn test_missing_values_are_config_errors() {
        let err = RegistrarConfig::new("", "secret", "https://api").unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::Config {
                parameter: "Reseller Username"
            }
        ));

        let err = RegistrarConfig::new("user", "", "https://api").unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::Config {
                parameter: "Reseller Password"
            }
        ));

        let err = RegistrarConfig::new("user", "secret", "  ").unwrap_err();
        assert!(matches!(err, RegistrarError::Config { parameter: "API url" }));
    }

    #[test]
    fn test_password_never_printed() {
        let config = RegistrarConfig::new("user", "hunter2", "https://api").unwrap();
        assert!(!format!("{:?}", config).contains("hunter2"));
        assert_eq!(config.redacted().password(), "********");
        assert_eq!(config.password(), "hunter2");
    }

    #[test]
    fn test_form_fields() {
        let form = RegistrarConfig::form();
        assert_eq!(form.label, "OpenProvider registrar");
        let names: Vec<_> = form.fields.iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["Username", "Password", "ApiUrl"]);
        assert_eq!(form.fields[1].kind, FieldKind::Password);
        assert!(form.fields.iter().all(|f| f.required));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[registrar]
username = "reseller"
password = "pw"
api_url = "http://localhost"
debug = true"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert!(settings.registrar.debug());
        assert_eq!(settings.registrar.password(), "pw");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_from(&dir.path().join("config.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
