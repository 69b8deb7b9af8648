//! Port allocation and capacity rules for hosts.
//!
//! Allocation fills gaps: the lowest unassigned port in the host range wins,
//! so a port freed by a deleted server is reused before the range is
//! extended towards `max_port`. Callers must run allocation and the insert
//! that consumes its result under one per-host critical section.

use super::{Host, HostingDomainError, Owner};
use std::collections::BTreeSet;

/// Returns the lowest port of `host`'s range not present in `assigned`.
///
/// # Errors
///
/// Returns [`HostingDomainError::CapacityExhausted`] when every port of the
/// range is already assigned.
pub fn allocate_port(host: &Host, assigned: &BTreeSet<u16>) -> Result<u16, HostingDomainError> {
    let range = host.port_range();
    range
        .ports()
        .find(|port| !assigned.contains(port))
        .ok_or_else(|| HostingDomainError::CapacityExhausted {
            host: host.name().clone(),
            range,
        })
}

/// Resolves the port for a new server on `host`.
///
/// A pinned port is honoured when it lies inside the range and is free;
/// otherwise the next free port is allocated.
///
/// # Errors
///
/// Returns [`HostingDomainError::PortOutOfRange`] or
/// [`HostingDomainError::PortInUse`] for an unusable pinned port, and
/// [`HostingDomainError::CapacityExhausted`] when no port is free.
pub fn resolve_port(
    host: &Host,
    pinned: Option<u16>,
    assigned: &BTreeSet<u16>,
) -> Result<u16, HostingDomainError> {
    let Some(port) = pinned else {
        return allocate_port(host, assigned);
    };

    let range = host.port_range();
    if !range.contains(port) {
        return Err(HostingDomainError::PortOutOfRange {
            host: host.name().clone(),
            port,
            range,
        });
    }
    if assigned.contains(&port) {
        return Err(HostingDomainError::PortInUse {
            host: host.name().clone(),
            port,
        });
    }
    Ok(port)
}

/// Returns whether `host` may take one more server given its current count.
#[must_use]
pub fn host_accepts_server(host: &Host, current_servers: usize) -> bool {
    host.is_enabled() && current_servers < limit_as_usize(host.server_limit())
}

/// Returns whether `owner` may create one more server given its current
/// count.
#[must_use]
pub fn owner_may_create(owner: &Owner, current_servers: usize) -> bool {
    current_servers < limit_as_usize(owner.server_limit())
}

fn limit_as_usize(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::domain::{HostName, PortRange, Username};
    use rstest::{fixture, rstest};

    #[fixture]
    fn host() -> Host {
        Host::new(
            HostName::new("minecraft-00.cvn").expect("valid host name"),
            PortRange::new(25565, 25693).expect("valid range"),
            7,
        )
    }

    fn small_host(width: u16) -> Host {
        Host::new(
            HostName::new("tiny.cvn").expect("valid host name"),
            PortRange::new(30000, 30000 + width).expect("valid range"),
            7,
        )
    }

    #[rstest]
    fn first_allocation_returns_min_port(host: Host) {
        assert_eq!(allocate_port(&host, &BTreeSet::new()), Ok(25565));
    }

    #[rstest]
    fn sequential_allocations_are_contiguous(host: Host) {
        let mut assigned = BTreeSet::new();
        for offset in 0..10 {
            let port = allocate_port(&host, &assigned).expect("port should be free");
            assert_eq!(port, 25565 + offset);
            assigned.insert(port);
        }
    }

    #[rstest]
    fn allocation_fills_the_lowest_gap(host: Host) {
        let assigned = BTreeSet::from([25565, 25566, 25570]);

        assert_eq!(allocate_port(&host, &assigned), Ok(25567));
    }

    #[rstest]
    fn allocation_reuses_a_freed_port(host: Host) {
        let mut assigned = BTreeSet::from([25565, 25566, 25567]);
        assigned.remove(&25565);

        assert_eq!(allocate_port(&host, &assigned), Ok(25565));
    }

    #[test]
    fn allocation_fails_once_the_range_is_exhausted() {
        let host = small_host(3);
        let mut assigned = BTreeSet::new();
        for _ in 0..3 {
            let port = allocate_port(&host, &assigned).expect("port should be free");
            assigned.insert(port);
        }

        assert!(matches!(
            allocate_port(&host, &assigned),
            Err(HostingDomainError::CapacityExhausted { .. })
        ));
    }

    #[test]
    fn ports_outside_the_range_do_not_consume_capacity() {
        let host = small_host(1);
        let assigned = BTreeSet::from([29999, 30001]);

        assert_eq!(allocate_port(&host, &assigned), Ok(30000));
    }

    #[rstest]
    fn allocation_never_returns_an_assigned_port(host: Host) {
        let assigned: BTreeSet<u16> = (25565..25600).step_by(2).collect();
        let port = allocate_port(&host, &assigned).expect("port should be free");

        assert!(!assigned.contains(&port));
        assert_eq!(port, 25566);
    }

    #[rstest]
    #[case(Some(25570), Ok(25570))]
    #[case(None, Ok(25567))]
    fn resolve_port_honours_free_pins(
        host: Host,
        #[case] pinned: Option<u16>,
        #[case] expected: Result<u16, HostingDomainError>,
    ) {
        let assigned = BTreeSet::from([25565, 25566]);
        assert_eq!(resolve_port(&host, pinned, &assigned), expected);
    }

    #[rstest]
    fn resolve_port_rejects_taken_pins(host: Host) {
        let assigned = BTreeSet::from([25565]);
        assert!(matches!(
            resolve_port(&host, Some(25565), &assigned),
            Err(HostingDomainError::PortInUse { port: 25565, .. })
        ));
    }

    #[rstest]
    #[case(25564)]
    #[case(25693)]
    fn resolve_port_rejects_pins_outside_the_range(host: Host, #[case] port: u16) {
        assert!(matches!(
            resolve_port(&host, Some(port), &BTreeSet::new()),
            Err(HostingDomainError::PortOutOfRange { .. })
        ));
    }

    #[rstest]
    #[case(6, true)]
    #[case(7, false)]
    fn host_capacity_follows_the_server_limit(
        host: Host,
        #[case] current: usize,
        #[case] expected: bool,
    ) {
        assert_eq!(host_accepts_server(&host, current), expected);
    }

    #[rstest]
    fn disabled_hosts_accept_nothing(host: Host) {
        assert!(!host_accepts_server(&host.with_enabled(false), 0));
    }

    #[rstest]
    #[case(1, true)]
    #[case(2, false)]
    fn owner_quota_follows_the_server_limit(#[case] current: usize, #[case] expected: bool) {
        let owner = Owner::new(Username::new("test").expect("valid username"), 2);
        assert_eq!(owner_may_create(&owner, current), expected);
    }
}
