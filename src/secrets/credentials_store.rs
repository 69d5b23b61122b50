use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    accounts: HashMap<String, AccountCredentials>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccountCredentials {
    password: String,
}

/// Reseller passwords kept in a `credentials.toml` next to the config file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the same directory as the given `config.toml`.
    pub fn beside(config_path: &Path) -> Self {
        Self::new(config_path.with_file_name("credentials.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CredentialsFile> {
        if !self.path.exists() {
            return Ok(CredentialsFile::default());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials file: {}", self.path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse credentials file: {}", self.path.display()))
    }

    fn save(&self, creds: &CredentialsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(creds).context("Failed to serialize credentials")?;

        fs::write(&self.path, &content)
            .with_context(|| format!("Failed to write credentials file: {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.path, perms).with_context(|| {
                format!("Failed to set permissions on: {}", self.path.display())
            })?;
        }

        Ok(())
    }

    pub fn store_password(&self, username: &str, password: &str) -> Result<()> {
        let mut creds_file = self.load()?;

        creds_file.accounts.insert(
            username.to_string(),
            AccountCredentials {
                password: password.to_string(),
            },
        );

        self.save(&creds_file)
    }

    pub fn get_password(&self, username: &str) -> Result<String> {
        let creds_file = self.load()?;

        creds_file
            .accounts
            .get(username)
            .map(|account| account.password.clone())
            .ok_or_else(|| {
                anyhow!(
                    "No password stored for reseller account: {}. Use 'opregistrar set-password {}' to store it.",
                    username,
                    username
                )
            })
    }

    pub fn delete_password(&self, username: &str) -> Result<()> {
        let mut creds_file = self.load()?;

        if creds_file.accounts.remove(username).is_none() {
            return Err(anyhow!("No password stored for reseller account: {}", username));
        }

        self.save(&creds_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_get_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("credentials.toml"));

        store.store_password("reseller", "s3cret").unwrap();
        store.store_password("other", "pw").unwrap();

        assert_eq!(store.get_password("reseller").unwrap(), "s3cret");
        assert_eq!(store.get_password("other").unwrap(), "pw");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_store_follows_config_location() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("custom").join("config.toml");
        let store = CredentialStore::beside(&config_path);
        assert_eq!(
            store.path(),
            dir.path().join("custom").join("credentials.toml")
        );

        store.store_password("reseller", "s3cret").unwrap();
        let reopened = CredentialStore::beside(&config_path);
        assert_eq!(reopened.get_password("reseller").unwrap(), "s3cret");
    }

    #[test]
    fn test_missing_account() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.toml"));

        let err = store.get_password("nobody").unwrap_err();
        assert!(err.to_string().contains("set-password nobody"));
        assert!(store.delete_password("nobody").is_err());
    }

    #[test]
    fn test_delete_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.toml"));

        store.store_password("reseller", "s3cret").unwrap();
        store.delete_password("reseller").unwrap();
        assert!(store.get_password("reseller").is_err());
    }
}
