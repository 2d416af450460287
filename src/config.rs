//! Startup Configuration
//!
//! Every setting is read once from the environment at process entry,
//! collected into [`AppConfig`], and never changed afterwards. The config
//! is handed by reference into telemetry bootstrap and server construction
//! rather than read ambiently.

/// Default HTTP bind address (all interfaces, fixed port).
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Default session signing secret.
///
/// Kept for deployment parity with conventional web apps; no endpoint in
/// this application signs or verifies anything with it.
pub const DEFAULT_SECRET_KEY: &str = "dev-secret-key-change-in-production";

/// Immutable application configuration, frozen for the process lifetime.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telemetry connection string; `None` disables telemetry export.
    pub telemetry_connection_string: Option<String>,
    /// Session signing secret (defaulted, not security-relevant here).
    pub secret_key: String,
    /// Debug mode: raises log verbosity.
    pub debug: bool,
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
}

impl AppConfig {
    /// True when the operator left the secret key at its well-known default.
    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telemetry_connection_string: None,
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            debug: false,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_disables_telemetry() {
        let config = AppConfig::default();
        assert!(config.telemetry_connection_string.is_none());
        assert!(!config.debug);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
    }

    #[test]
    fn default_secret_is_detected() {
        let mut config = AppConfig::default();
        assert!(config.uses_default_secret());

        config.secret_key = "something-operator-provided".to_string();
        assert!(!config.uses_default_secret());
    }
}
