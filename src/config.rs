use url::Url;

use crate::error::AppError;

/// Environment variable selecting the service base address.
pub const API_URL_VAR: &str = "PC_BUILDER_API_URL";

/// Used when `PC_BUILDER_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Where the PC builder service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Normalized base URL without a trailing slash.
    pub base_url: String,
}

impl ServiceConfig {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Ignoring unreadable .env file: {}", e);
            }
        }

        match std::env::var(API_URL_VAR) {
            Ok(raw) if !raw.trim().is_empty() => Self::from_url(raw.trim()),
            _ => Self::from_url(DEFAULT_API_URL),
        }
    }

    pub fn from_url(raw: &str) -> Result<Self, AppError> {
        let parsed = validate_service_url(raw)?;
        Ok(Self {
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }
}

/// Accept `https://` anywhere and `http://` only on this machine, which is
/// where a development server usually runs.
fn validate_service_url(raw: &str) -> Result<Url, AppError> {
    let parsed =
        Url::parse(raw).map_err(|e| AppError::Config(format!("Invalid service URL: {e}")))?;

    match (parsed.scheme(), is_loopback(&parsed)) {
        ("https", _) | ("http", true) => Ok(parsed),
        ("http", false) => Err(AppError::Config(format!(
            "Refusing plain HTTP to {}; only loopback addresses may skip TLS",
            parsed.host_str().unwrap_or("<no host>")
        ))),
        (other, _) => Err(AppError::Config(format!(
            "Service URL must use https:// (or http:// on loopback), got \"{other}://\""
        ))),
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(name)) => name == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}
