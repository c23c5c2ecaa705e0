use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::protocol::DEFAULT_PORT;

pub struct Config {
    pub host: String,
    pub port: u16,
    /// Only browser connections from this origin are accepted. `None` accepts any.
    pub client_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: DEFAULT_PORT,
            client_url: env::var("CLIENT_URL").ok().filter(|url| !url.trim().is_empty()),
        }
    }

    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::new(self.parse_host(), self.port)
    }

    fn parse_host(&self) -> IpAddr {
        if let Ok(addr) = self.host.parse::<IpAddr>() {
            return addr;
        }

        match self.host.as_str() {
            "localhost" => IpAddr::V4(Ipv4Addr::LOCALHOST),
            "" => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            _ => {
                tracing::warn!(
                    host = %self.host,
                    "Unable to parse host as IP address, using 0.0.0.0"
                );
                IpAddr::V4(Ipv4Addr::UNSPECIFIED)
            }
        }
    }

    /// Whether a handshake carrying `origin` may connect.
    ///
    /// Requests without an `Origin` header come from non-browser clients and
    /// are always accepted.
    pub fn origin_allowed(&self, origin: Option<&str>) -> bool {
        match (&self.client_url, origin) {
            (None, _) | (_, None) => true,
            (Some(allowed), Some(origin)) => {
                allowed.trim().trim_end_matches('/') == origin.trim().trim_end_matches('/')
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, client_url: Option<&str>) -> Config {
        Config {
            host: host.to_string(),
            port: DEFAULT_PORT,
            client_url: client_url.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_localhost() {
        let addr = config("localhost", None).bind_address();
        assert_eq!(addr, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_parse_ip_address() {
        let addr = config("192.168.1.1", None).bind_address();
        assert_eq!(addr, "192.168.1.1:8000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_parse_invalid_hostname_defaults_to_all() {
        let addr = config("invalid-hostname", None).bind_address();
        assert_eq!(addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config("", None).bind_address(), addr);
    }

    #[test]
    fn test_origin_unrestricted_when_unset() {
        let config = config("0.0.0.0", None);
        assert!(config.origin_allowed(Some("http://anything.example")));
        assert!(config.origin_allowed(None));
    }

    #[test]
    fn test_origin_must_match_client_url() {
        let config = config("0.0.0.0", Some("http://localhost:5173/"));
        assert!(config.origin_allowed(Some("http://localhost:5173")));
        assert!(!config.origin_allowed(Some("http://evil.example")));
        assert!(config.origin_allowed(None));
    }
}
