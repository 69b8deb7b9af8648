//! Hosting machines and their assignable port ranges.

use super::{HostName, HostingDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Half-open `[min_port, max_port)` range of ports a host may hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPortRange")]
pub struct PortRange {
    min_port: u16,
    max_port: u16,
}

#[derive(Deserialize)]
struct RawPortRange {
    min_port: u16,
    max_port: u16,
}

impl TryFrom<RawPortRange> for PortRange {
    type Error = HostingDomainError;

    fn try_from(raw: RawPortRange) -> Result<Self, Self::Error> {
        Self::new(raw.min_port, raw.max_port)
    }
}

impl PortRange {
    /// Creates a validated port range.
    ///
    /// # Errors
    ///
    /// Returns [`HostingDomainError::InvalidPortRange`] unless
    /// `min_port < max_port`.
    pub const fn new(min_port: u16, max_port: u16) -> Result<Self, HostingDomainError> {
        if min_port >= max_port {
            return Err(HostingDomainError::InvalidPortRange { min_port, max_port });
        }
        Ok(Self { min_port, max_port })
    }

    /// Returns the inclusive lower bound.
    #[must_use]
    pub const fn min_port(self) -> u16 {
        self.min_port
    }

    /// Returns the exclusive upper bound.
    #[must_use]
    pub const fn max_port(self) -> u16 {
        self.max_port
    }

    /// Returns whether `port` lies inside the range.
    #[must_use]
    pub const fn contains(self, port: u16) -> bool {
        port >= self.min_port && port < self.max_port
    }

    /// Returns the number of ports in the range.
    #[must_use]
    pub const fn len(self) -> usize {
        (self.max_port - self.min_port) as usize
    }

    /// Always `false`; a validated range holds at least one port.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Iterates the range in ascending order.
    #[must_use]
    pub const fn ports(self) -> Range<u16> {
        self.min_port..self.max_port
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[{}, {})", self.min_port, self.max_port)
    }
}

/// A machine able to run server containers within a configured port range.
///
/// Hosts are administered outside the core; services only read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    name: HostName,
    enabled: bool,
    port_range: PortRange,
    server_limit: u32,
}

impl Host {
    /// Creates an enabled host.
    #[must_use]
    pub const fn new(name: HostName, port_range: PortRange, server_limit: u32) -> Self {
        Self {
            name,
            enabled: true,
            port_range,
            server_limit,
        }
    }

    /// Sets whether the host accepts new servers.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the host name.
    #[must_use]
    pub const fn name(&self) -> &HostName {
        &self.name
    }

    /// Returns whether the host is enabled.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the assignable port range.
    #[must_use]
    pub const fn port_range(&self) -> PortRange {
        self.port_range
    }

    /// Returns the maximum number of servers the host may hold.
    #[must_use]
    pub const fn server_limit(&self) -> u32 {
        self.server_limit
    }
}

impl fmt::Display for Host {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name.as_str())
    }
}
