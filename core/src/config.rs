//! Endpoint configuration.

use std::env;

pub const DEFAULT_API_BASE_URL: &str = "https://rentkub2025-api.vercel.app";
pub const DEFAULT_GEOCODER_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Base origins for the RentKub backend and the reverse-geocoding service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub geocoder_base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            geocoder_base_url: DEFAULT_GEOCODER_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Read `RENTKUB_API_URL` and `RENTKUB_GEOCODER_URL`, falling back to the
    /// public origins for unset or empty variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let pick = |key: &str, fallback: String| {
            lookup(key).filter(|value| !value.trim().is_empty()).unwrap_or(fallback)
        };
        Self {
            api_base_url: pick("RENTKUB_API_URL", defaults.api_base_url),
            geocoder_base_url: pick("RENTKUB_GEOCODER_URL", defaults.geocoder_base_url),
        }
    }

    /// Point both services at one origin, as the mock server does.
    pub fn single_origin(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            geocoder_base_url: base_url.to_string(),
        }
    }
}
