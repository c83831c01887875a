// config.rs
//
// Store configuration read from the environment (and `.env` via dotenvy).
use fyyur_domain::{DomainError, Result};

pub const DB_URL_VAR: &str = "FYYUR_DB_URL";
pub const FALLBACK_DB_URL_VAR: &str = "DATABASE_URL";
pub const POOL_SIZE_VAR: &str = "FYYUR_DB_POOL_SIZE";

/// Where the store lives and how many pooled connections it may open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
  pub database_url: String,
  pub max_pool_size: u32,
}

impl StoreConfig {
  pub const DEFAULT_POOL_SIZE: u32 = 4;

  pub fn new(database_url: impl Into<String>) -> Self {
    Self { database_url: database_url.into(), max_pool_size: Self::DEFAULT_POOL_SIZE }
  }

  pub fn with_pool_size(mut self, max_pool_size: u32) -> Self {
    self.max_pool_size = max_pool_size;
    self
  }

  /// Loads `.env` if present, then reads `FYYUR_DB_URL` (or `DATABASE_URL`)
  /// and `FYYUR_DB_POOL_SIZE`.
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Same as `from_env` with an explicit variable source.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where F: Fn(&str) -> Option<String>
  {
    let database_url = lookup(DB_URL_VAR).or_else(|| lookup(FALLBACK_DB_URL_VAR))
                                         .filter(|url| !url.trim().is_empty())
                                         .ok_or_else(|| {
                                           DomainError::ExternalError(format!("set {} or {} to the database location",
                                                                              DB_URL_VAR, FALLBACK_DB_URL_VAR))
                                         })?;
    let max_pool_size = match lookup(POOL_SIZE_VAR) {
      None => Self::DEFAULT_POOL_SIZE,
      Some(raw) => raw.trim()
                      .parse::<u32>()
                      .map_err(|_| DomainError::ExternalError(format!("{} must be a positive integer, got '{}'", POOL_SIZE_VAR, raw)))?,
    };
    let config = Self { database_url: database_url.trim().to_string(), max_pool_size };
    config.validate()?;
    Ok(config)
  }

  /// Checks the URL matches the compiled backend and the pool size is usable.
  pub fn validate(&self) -> Result<()> {
    if self.max_pool_size == 0 {
      return Err(DomainError::ExternalError(format!("{} must be at least 1", POOL_SIZE_VAR)));
    }
    let url = self.database_url.as_str();
    let is_postgres = url.starts_with("postgres://") || url.starts_with("postgresql://");
    if cfg!(feature = "pg") && !is_postgres {
      return Err(DomainError::ExternalError(format!("'{}' is not a Postgres URL", url)));
    }
    if !cfg!(feature = "pg") && (is_postgres || (url.contains("://") && !url.starts_with("file:"))) {
      return Err(DomainError::ExternalError(format!("'{}' is not an SQLite location; rebuild with the `pg` feature for Postgres",
                                                    url)));
    }
    Ok(())
  }

  /// In-memory SQLite databases are private to one connection, so the pool
  /// is capped at a single connection for them.
  pub fn effective_pool_size(&self) -> u32 {
    if self.is_sqlite_memory() {
      1
    } else {
      self.max_pool_size
    }
  }

  fn is_sqlite_memory(&self) -> bool {
    self.database_url == ":memory:" || self.database_url.contains("mode=memory")
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn primary_variable_wins_over_fallback() -> Result<()> {
    let config = StoreConfig::from_lookup(lookup(&[(DB_URL_VAR, "fyyur.db"), (FALLBACK_DB_URL_VAR, "other.db")]));
    if cfg!(feature = "pg") {
      assert!(config.is_err());
      return Ok(());
    }
    let config = config?;
    assert_eq!(config.database_url, "fyyur.db");
    assert_eq!(config.max_pool_size, StoreConfig::DEFAULT_POOL_SIZE);
    Ok(())
  }

  #[test]
  fn missing_url_is_external_error() {
    assert!(matches!(StoreConfig::from_lookup(lookup(&[])), Err(DomainError::ExternalError(_))));
    assert!(matches!(StoreConfig::from_lookup(lookup(&[(DB_URL_VAR, "  ")])), Err(DomainError::ExternalError(_))));
  }

  #[test]
  fn pool_size_must_be_positive() {
    let url = if cfg!(feature = "pg") { "postgres://localhost/fyyur" } else { "fyyur.db" };
    assert!(StoreConfig::from_lookup(lookup(&[(DB_URL_VAR, url), (POOL_SIZE_VAR, "zero")])).is_err());
    assert!(StoreConfig::from_lookup(lookup(&[(DB_URL_VAR, url), (POOL_SIZE_VAR, "0")])).is_err());
  }

  #[cfg(not(feature = "pg"))]
  #[test]
  fn sqlite_build_rejects_postgres_url_and_caps_memory_pool() {
    assert!(StoreConfig::new("postgres://localhost/fyyur").validate().is_err());
    let memory = StoreConfig::new(":memory:").with_pool_size(8);
    assert!(memory.validate().is_ok());
    assert_eq!(memory.effective_pool_size(), 1);
  }
}
