//! Game server socket addresses and the targets that resolve to them.

use crate::hosting::domain::Server;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a `host[:port]` string cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid server address '{0}'")]
pub struct ParseServerAddressError(pub String);

/// Host and port of a game server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// Creates an address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parses `host:port`, or `host` alone with `default_port`. IPv6
    /// literals must be bracketed (`[::1]:25565` or `[::1]`).
    ///
    /// # Errors
    ///
    /// Returns [`ParseServerAddressError`] when the host is empty, an IPv6
    /// literal is unbracketed, or the port is not a valid `u16`.
    pub fn parse(input: &str, default_port: u16) -> Result<Self, ParseServerAddressError> {
        let invalid = || ParseServerAddressError(input.to_owned());
        let (host, raw_port) = split_host_port(input.trim()).ok_or_else(invalid)?;
        let port = raw_port.map_or(Ok(default_port), |digits| {
            digits.parse::<u16>().map_err(|_| invalid())
        })?;
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(invalid());
        }
        Ok(Self::new(host, port))
    }

    /// Host name or IP literal.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

fn split_host_port(input: &str) -> Option<(&str, Option<&str>)> {
    if let Some(bracketed) = input.strip_prefix('[') {
        let (host, rest) = bracketed.split_once(']')?;
        return if rest.is_empty() {
            Some((host, None))
        } else {
            rest.strip_prefix(':').map(|digits| (host, Some(digits)))
        };
    }
    match input.split_once(':') {
        // More than one colon is an IPv6 literal missing its brackets.
        Some((_, rest)) if rest.contains(':') => None,
        Some((host, digits)) => Some((host, Some(digits))),
        None => Some((input, None)),
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(formatter, "[{}]:{}", self.host, self.port)
        } else {
            write!(formatter, "{}:{}", self.host, self.port)
        }
    }
}

/// Anything that can be status-polled.
pub trait StatusTarget {
    /// Address the game protocol query is sent to.
    fn status_address(&self) -> ServerAddress;
}

impl StatusTarget for ServerAddress {
    fn status_address(&self) -> ServerAddress {
        self.clone()
    }
}

impl StatusTarget for Server {
    fn status_address(&self) -> ServerAddress {
        ServerAddress::new(self.host().as_str(), self.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("minecraft-00.cvn:25570", "minecraft-00.cvn", 25570)]
    #[case("minecraft-00.cvn", "minecraft-00.cvn", 25565)]
    #[case(" 10.0.0.5:25566 ", "10.0.0.5", 25566)]
    #[case("[::1]:25570", "::1", 25570)]
    #[case("[2001:db8::7]", "2001:db8::7", 25565)]
    fn parses_host_and_port(#[case] input: &str, #[case] host: &str, #[case] port: u16) {
        let address = ServerAddress::parse(input, 25565).expect("address should parse");
        assert_eq!(address.host(), host);
        assert_eq!(address.port(), port);
    }

    #[rstest]
    #[case("")]
    #[case(":25565")]
    #[case("host:notaport")]
    #[case("host:70000")]
    #[case("::1")]
    #[case("2001:db8::7:25565")]
    #[case("[::1")]
    #[case("[::1]25565")]
    #[case("[]:25565")]
    fn rejects_malformed_addresses(#[case] input: &str) {
        assert!(ServerAddress::parse(input, 25565).is_err());
    }

    #[test]
    fn ipv6_hosts_display_bracketed() {
        let address = ServerAddress::parse("[::1]:25570", 25565).expect("address should parse");
        assert_eq!(address.to_string(), "[::1]:25570");
    }
}
