//! Server configuration
//!
//! A single externally-supplied port number plus the static asset directory;
//! everything else is fixed.

use std::path::PathBuf;

use tracing::warn;

/// Default listen port when `PORT` is absent
pub const DEFAULT_PORT: u16 = 3000;

/// Default directory served for non-API requests
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Server configuration, read from the environment.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// TCP port shared by the HTTP surface and the WebSocket upgrade
    pub port: u16,

    /// Directory the web UI is served from
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerConfig {
    /// Read configuration from `PORT` and `CHAT_STATIC_DIR`, falling back to
    /// the defaults when absent.
    pub fn from_env() -> Self {
        Self {
            port: parse_port(std::env::var("PORT").ok().as_deref()),
            static_dir: std::env::var("CHAT_STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }
}

/// Parse a port value, warning and falling back to the default when the
/// supplied value is not a valid port number.
fn parse_port(value: Option<&str>) -> u16 {
    match value {
        Some(raw) => match raw.parse() {
            Ok(port) => port,
            Err(_) => {
                warn!(value = raw, "invalid PORT value, using default");
                DEFAULT_PORT
            }
        },
        None => DEFAULT_PORT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        assert_eq!(parse_port(None), DEFAULT_PORT);
        assert_eq!(ServerConfig::default().port, DEFAULT_PORT);
    }

    #[test]
    fn test_explicit_port() {
        assert_eq!(parse_port(Some("8080")), 8080);
    }

    #[test]
    fn test_invalid_port_falls_back() {
        assert_eq!(parse_port(Some("not-a-port")), DEFAULT_PORT);
        assert_eq!(parse_port(Some("99999")), DEFAULT_PORT);
    }

    #[test]
    fn test_default_static_dir() {
        assert_eq!(
            ServerConfig::default().static_dir,
            PathBuf::from(DEFAULT_STATIC_DIR)
        );
    }
}
