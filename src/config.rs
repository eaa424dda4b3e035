use serde::Deserialize;
use std::time::Duration;

use crate::services::SvdParams;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL connection URL (direct access to the booking database)
    #[serde(default)]
    pub database_url: Option<String>,

    /// Supabase project URL, used with the service role key for REST access
    #[serde(default)]
    pub supabase_url: Option<String>,

    /// Supabase service role key
    #[serde(default)]
    pub supabase_service_role_key: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Minimum number of fused interactions required to fit a model
    #[serde(default = "default_min_interactions")]
    pub min_interactions: usize,

    /// Number of recommendations returned when the caller omits `limit`
    #[serde(default = "default_limit")]
    pub default_limit: i64,

    /// Upper bound on any single data source query
    #[serde(default = "default_data_source_timeout_secs")]
    pub data_source_timeout_secs: u64,

    #[serde(default = "default_svd_factors")]
    pub svd_factors: usize,

    #[serde(default = "default_svd_epochs")]
    pub svd_epochs: usize,

    #[serde(default = "default_svd_learning_rate")]
    pub svd_learning_rate: f64,

    #[serde(default = "default_svd_regularization")]
    pub svd_regularization: f64,

    #[serde(default = "default_svd_seed")]
    pub svd_seed: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_min_interactions() -> usize {
    10
}

fn default_limit() -> i64 {
    5
}

fn default_data_source_timeout_secs() -> u64 {
    30
}

fn default_svd_factors() -> usize {
    SvdParams::default().factors
}

fn default_svd_epochs() -> usize {
    SvdParams::default().epochs
}

fn default_svd_learning_rate() -> f64 {
    SvdParams::default().learning_rate
}

fn default_svd_regularization() -> f64 {
    SvdParams::default().regularization
}

fn default_svd_seed() -> u64 {
    SvdParams::default().seed
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn data_source_timeout(&self) -> Duration {
        Duration::from_secs(self.data_source_timeout_secs)
    }

    pub fn svd_params(&self) -> SvdParams {
        SvdParams {
            factors: self.svd_factors,
            epochs: self.svd_epochs,
            learning_rate: self.svd_learning_rate,
            regularization: self.svd_regularization,
            seed: self.svd_seed,
        }
    }

    /// Supabase credentials, only when both halves are present and non-empty
    pub fn supabase_credentials(&self) -> Option<(&str, &str)> {
        match (&self.supabase_url, &self.supabase_service_role_key) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => {
                Some((url.as_str(), key.as_str()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()));
        envy::from_iter::<_, Config>(vars).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.min_interactions, 10);
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.data_source_timeout(), Duration::from_secs(30));
        assert!(config.database_url.is_none());
        assert!(config.supabase_credentials().is_none());
        assert_eq!(config.svd_params(), SvdParams::default());
    }

    #[test]
    fn test_supabase_credentials_require_both_values() {
        let config = from_pairs(&[("SUPABASE_URL", "https://project.supabase.co")]);
        assert!(config.supabase_credentials().is_none());

        let config = from_pairs(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", ""),
        ]);
        assert!(config.supabase_credentials().is_none());

        let config = from_pairs(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "secret"),
        ]);
        assert_eq!(
            config.supabase_credentials(),
            Some(("https://project.supabase.co", "secret"))
        );
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("PORT", "9100"),
            ("MIN_INTERACTIONS", "25"),
            ("SVD_FACTORS", "16"),
            ("SVD_SEED", "7"),
        ]);
        assert_eq!(config.port, 9100);
        assert_eq!(config.min_interactions, 25);
        assert_eq!(config.svd_params().factors, 16);
        assert_eq!(config.svd_params().seed, 7);
    }
}
