//! Service settings.
//!
//! Resolved in three layers: built-in defaults, an optional TOML file, then
//! `CAREBASE_*` environment overrides.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use carebase_contracts::error::{CarebaseError, CarebaseResult};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
/// One year.
pub const MAX_ACCESS_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;
/// Ten years.
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 10 * 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub project_name: String,
    pub bind: String,
    pub cors_origins: Vec<String>,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    /// PBKDF2 rounds for new password hashes.
    pub password_iterations: u32,
    pub upload_dir: PathBuf,
    pub public_base_url: String,
    pub avatar_bucket: String,
    pub prescription_bucket: String,
    pub max_upload_bytes: usize,
    pub symptom_table: PathBuf,
    /// Policy file; the embedded default policy applies when unset.
    pub access_policy: Option<PathBuf>,
    /// Administrator account created or promoted at startup.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_name: "Healthcare API".to_string(),
            bind: "0.0.0.0:8000".to_string(),
            cors_origins: Vec::new(),
            access_token_ttl_minutes: 30,
            refresh_token_ttl_days: 7,
            password_iterations: carebase_core::credentials::DEFAULT_ITERATIONS,
            upload_dir: PathBuf::from("uploads"),
            public_base_url: "http://localhost:8000/files".to_string(),
            avatar_bucket: "avatars".to_string(),
            prescription_bucket: "prescriptions".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            symptom_table: PathBuf::from("data/symptoms.json"),
            access_policy: None,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl Settings {
    /// Defaults, then `path` when given, then the process environment.
    ///
    /// # Errors
    ///
    /// `Config` when the file cannot be read or parsed, or an override is
    /// malformed.
    pub fn load(path: Option<&Path>) -> CarebaseResult<Self> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> CarebaseResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CarebaseError::Config {
            reason: format!("cannot read settings file {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(s: &str) -> CarebaseResult<Self> {
        let settings: Self = toml::from_str(s).map_err(|e| CarebaseError::Config {
            reason: format!("settings parse error: {e}"),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Range-check values that would otherwise fail later at runtime.
    ///
    /// # Errors
    ///
    /// `Config` naming the first offending setting.
    pub fn validate(&self) -> CarebaseResult<()> {
        self.access_token_ttl()?;
        self.refresh_token_ttl()?;
        Ok(())
    }

    /// `access_token_ttl_minutes` as a duration, if within `1..=MAX`.
    pub fn access_token_ttl(&self) -> CarebaseResult<Duration> {
        ttl(
            "access_token_ttl_minutes",
            self.access_token_ttl_minutes,
            MAX_ACCESS_TOKEN_TTL_MINUTES,
            Duration::try_minutes,
        )
    }

    /// `refresh_token_ttl_days` as a duration, if within `1..=MAX`.
    pub fn refresh_token_ttl(&self) -> CarebaseResult<Duration> {
        ttl(
            "refresh_token_ttl_days",
            self.refresh_token_ttl_days,
            MAX_REFRESH_TOKEN_TTL_DAYS,
            Duration::try_days,
        )
    }

    /// Apply `CAREBASE_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CarebaseResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("CAREBASE_BIND") {
            self.bind = bind;
        }
        if let Some(raw) = lookup("CAREBASE_CORS_ORIGINS") {
            self.cors_origins = parse_origins(&raw)?;
        }
        if let Some(url) = lookup("CAREBASE_PUBLIC_BASE_URL") {
            self.public_base_url = url;
        }
        if let Some(dir) = lookup("CAREBASE_UPLOAD_DIR") {
            self.upload_dir = PathBuf::from(dir);
        }
        if let Some(table) = lookup("CAREBASE_SYMPTOM_TABLE") {
            self.symptom_table = PathBuf::from(table);
        }
        if let Some(policy) = lookup("CAREBASE_ACCESS_POLICY") {
            self.access_policy = Some(PathBuf::from(policy));
        }
        if let Some(email) = lookup("CAREBASE_ADMIN_EMAIL") {
            self.admin_email = Some(email);
        }
        if let Some(password) = lookup("CAREBASE_ADMIN_PASSWORD") {
            self.admin_password = Some(password);
        }
        debug!(bind = %self.bind, origins = self.cors_origins.len(), "settings resolved");
        Ok(())
    }
}

fn ttl(
    name: &str,
    value: i64,
    max: i64,
    build: fn(i64) -> Option<Duration>,
) -> CarebaseResult<Duration> {
    if !(1..=max).contains(&value) {
        return Err(CarebaseError::Config {
            reason: format!("{name} must be between 1 and {max}, got {value}"),
        });
    }
    build(value).ok_or_else(|| CarebaseError::Config {
        reason: format!("{name} is out of range: {value}"),
    })
}

/// Comma-separated origins, or a JSON-style `["a", "b"]` list.
pub fn parse_origins(raw: &str) -> CarebaseResult<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| CarebaseError::Config {
            reason: format!("CAREBASE_CORS_ORIGINS is not a valid list: {e}"),
        });
    }
    Ok(trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}
