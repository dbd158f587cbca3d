use std::env;

use log::*;
use pbw_common::{parse_boolean_flag, Secret};

const DEFAULT_PBW_HOST: &str = "127.0.0.1";
const DEFAULT_PBW_PORT: u16 = 8380;
const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Database connection pool size.
    pub max_connections: u32,
    /// Shared key the storefront gateway presents in the `pbw-gateway-key` header. When unset, the customer id
    /// header is trusted as-is.
    pub gateway_secret: Option<Secret<String>>,
    /// When true, validation error responses include field-level detail.
    pub verbose_validation: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PBW_HOST.to_string(),
            port: DEFAULT_PBW_PORT,
            database_url: String::default(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            gateway_secret: None,
            verbose_validation: false,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PBW_HOST").ok().unwrap_or_else(|| DEFAULT_PBW_HOST.into());
        let port = env::var("PBW_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PBW_PORT. {e} Using the default, {DEFAULT_PBW_PORT}, instead."
                    );
                    DEFAULT_PBW_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PBW_PORT);
        let database_url = env::var("PBW_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PBW_DATABASE_URL is not set. Please set it to the URL for the orders database.");
            String::default()
        });
        let max_connections = env::var("PBW_MAX_CONNECTIONS")
            .map(|s| {
                s.parse::<u32>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid value for PBW_MAX_CONNECTIONS. {e} Using the default, \
                         {DEFAULT_MAX_CONNECTIONS}, instead."
                    );
                    DEFAULT_MAX_CONNECTIONS
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let gateway_secret = env::var("PBW_GATEWAY_SECRET").ok().filter(|s| !s.is_empty()).map(Secret::new);
        if gateway_secret.is_none() {
            warn!(
                "🪛️ PBW_GATEWAY_SECRET is not set. The customer id header will be trusted as-is. Only run like this \
                 when the server is reachable solely from the storefront gateway."
            );
        }
        let verbose_validation = parse_boolean_flag(env::var("PBW_VERBOSE_VALIDATION").ok(), false);
        Self { host, port, database_url, max_connections, gateway_secret, verbose_validation }
    }
}
