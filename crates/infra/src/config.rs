//! Process configuration read from the environment.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::warn;

use hvacdesk_inventory::{BalanceStrategy, InventoryPolicy};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
const DEV_JWT_SECRET: &str = "hvacdesk-dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Postgres URL; `None` selects the in-memory backend.
    pub database_url: Option<String>,
    pub bind: SocketAddr,
    pub jwt_secret: String,
    pub policy: InventoryPolicy,
    pub strategy: BalanceStrategy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = var("DATABASE_URL");

        let bind_raw = var("HVACDESK_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("HVACDESK_BIND", &bind_raw, e.to_string()))?;

        let jwt_secret = match var("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set; using the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let allow_negative = match var("INVENTORY_ALLOW_NEGATIVE") {
            None => true,
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::invalid("INVENTORY_ALLOW_NEGATIVE", &raw, "expected true or false"))?,
        };

        let max_retries = match var("INVENTORY_MAX_RETRIES") {
            None => DEFAULT_MAX_RETRIES,
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::invalid("INVENTORY_MAX_RETRIES", &raw, e.to_string()))?,
        };

        let strategy = match var("INVENTORY_BALANCE_STRATEGY") {
            None => BalanceStrategy::default(),
            Some(raw) => parse_strategy(&raw, max_retries)?,
        };

        Ok(Self {
            database_url,
            bind,
            jwt_secret,
            policy: InventoryPolicy { allow_negative },
            strategy,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_strategy(raw: &str, max_retries: u32) -> Result<BalanceStrategy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "atomic" => Ok(BalanceStrategy::AtomicIncrement),
        "optimistic" => Ok(BalanceStrategy::OptimisticVersion { max_retries }),
        "read-modify-write" => Ok(BalanceStrategy::ReadModifyWrite),
        _ => Err(ConfigError::invalid(
            "INVENTORY_BALANCE_STRATEGY",
            raw,
            "expected atomic, optimistic or read-modify-write",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.database_url, None);
        assert_eq!(cfg.bind, DEFAULT_BIND.parse().unwrap());
        assert!(cfg.policy.allow_negative);
        assert_eq!(cfg.strategy, BalanceStrategy::AtomicIncrement);
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
    }

    #[test]
    fn optimistic_strategy_picks_up_retry_budget() {
        let cfg = config(&[
            ("INVENTORY_BALANCE_STRATEGY", "optimistic"),
            ("INVENTORY_MAX_RETRIES", "5"),
            ("INVENTORY_ALLOW_NEGATIVE", "false"),
        ])
        .unwrap();
        assert_eq!(cfg.strategy, BalanceStrategy::OptimisticVersion { max_retries: 5 });
        assert_eq!(cfg.policy, InventoryPolicy::strict());
    }

    #[test]
    fn invalid_values_are_reported_by_variable() {
        let err = config(&[("INVENTORY_BALANCE_STRATEGY", "yolo")]).unwrap_err();
        assert!(err.to_string().starts_with("INVENTORY_BALANCE_STRATEGY"));
        assert!(config(&[("HVACDESK_BIND", "not-an-addr")]).is_err());
        assert!(config(&[("INVENTORY_ALLOW_NEGATIVE", "maybe")]).is_err());
    }
}
