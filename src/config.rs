//! Server configuration
//!
//! Command line first, environment variables as fallback, built-in defaults last.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Port used when none is given
pub const DEFAULT_PORT: u16 = 8989;

/// Multi-client TCP chat server
#[derive(Parser, Debug, Clone)]
#[command(name = "tcp_chat", version, about = "Multi-client TCP chat server")]
pub struct Config {
    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Bind address; `::` also accepts IPv4 where the OS allows dual-stack sockets
    #[arg(long, env = "TCP_CHAT_BIND", default_value = "::")]
    pub bind: IpAddr,

    /// Maximum number of clients with a registered name
    #[arg(long, env = "TCP_CHAT_MAX_CLIENTS", default_value_t = 10)]
    pub max_clients: usize,

    /// Banner file sent to every new connection
    #[arg(long, env = "TCP_CHAT_BANNER", default_value = "linuxlogo.txt")]
    pub banner: PathBuf,

    /// Keep only the most recent N backlog entries (0 = keep everything)
    #[arg(long, env = "TCP_CHAT_HISTORY_LIMIT", default_value_t = 0)]
    pub history_limit: usize,

    /// Seconds a single write may take before the connection is dropped
    #[arg(long, env = "TCP_CHAT_WRITE_TIMEOUT", default_value_t = 10)]
    pub write_timeout_secs: u64,
}

impl Config {
    /// Socket address for the listener
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            banner: self.banner.clone(),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
        }
    }
}

/// Per-connection settings shared by all sessions
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub banner: PathBuf,
    pub write_timeout: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["tcp_chat"]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.listen_addr().to_string(), "[::]:8989");
    }

    #[test]
    fn test_ipv4_bind() {
        let config = Config::try_parse_from(["tcp_chat", "--bind", "0.0.0.0", "2525"]).unwrap();
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:2525");
        assert!(Config::try_parse_from(["tcp_chat", "--bind", "localhost"]).is_err());
    }

    #[test]
    fn test_port_override() {
        let config = Config::try_parse_from(["tcp_chat", "2525"]).unwrap();
        assert_eq!(config.port, 2525);
    }

    #[test]
    fn test_extra_argument_is_usage_error() {
        assert!(Config::try_parse_from(["tcp_chat", "2525", "4040"]).is_err());
    }

    #[test]
    fn test_session_options() {
        let config = Config::try_parse_from([
            "tcp_chat",
            "--banner",
            "/tmp/logo.txt",
            "--write-timeout-secs",
            "3",
        ])
        .unwrap();
        let options = config.session_options();
        assert_eq!(options.banner, PathBuf::from("/tmp/logo.txt"));
        assert_eq!(options.write_timeout, Duration::from_secs(3));
    }
}
