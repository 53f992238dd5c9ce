//! Runtime configuration for the web server.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// How often the reconciliation sweep runs over every live tournament.
    pub reconcile_interval: Duration,
    /// Tournaments not accessed for this long are removed.
    pub inactivity_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        let reconcile_secs = env::var("RECONCILE_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(30);

        let inactivity_hours = env::var("INACTIVITY_TIMEOUT_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(12);

        Settings {
            host,
            port,
            reconcile_interval: Duration::from_secs(reconcile_secs),
            inactivity_timeout: Duration::from_secs(inactivity_hours * 3600),
        }
    }
}
