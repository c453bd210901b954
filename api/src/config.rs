//! Server configuration

use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Server configuration, read from a JSON file and then from the
/// environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// HS256 signing secret for access and refresh tokens
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl_secs: i64,
    /// Bootstrap admin, created on start when absent
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// List page size when the request does not give one
    pub default_page_size: u32,
    /// Upper bound on requested page sizes
    pub max_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
            jwt_secret: String::new(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 60 * 60,
            admin_email: None,
            admin_password: None,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl ServerConfig {
    /// Load from file
    pub fn load(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Apply `CAMPUS_*` environment overrides
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(bind) = var("CAMPUS_BIND") {
            self.bind = bind;
        }
        if let Some(secret) = var("CAMPUS_JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(email) = var("CAMPUS_ADMIN_EMAIL") {
            self.admin_email = Some(email);
        }
        if let Some(password) = var("CAMPUS_ADMIN_PASSWORD") {
            self.admin_password = Some(password);
        }
        self
    }

    /// Fills an empty signing secret with a random one. Returns whether it
    /// did; tokens signed with a generated secret do not survive a restart.
    pub fn ensure_secret(&mut self) -> bool {
        if !self.jwt_secret.is_empty() {
            return false;
        }
        self.jwt_secret = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(48)
            .map(char::from)
            .collect();
        true
    }

    /// Page size for a request, clamped to `1..=max_page_size`
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1))
    }
}
