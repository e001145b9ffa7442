//! Address resolution for the driver endpoints.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use crate::core::DriverError;

/// Parse a textual endpoint (IPv4 or IPv6 literal) and port into a socket
/// address.
///
/// Parse failure is a fatal setup error; no name resolution is attempted.
pub fn resolve_endpoint(endpoint: &str, port: u16) -> Result<SocketAddr, DriverError> {
    endpoint
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, port))
        .map_err(|_| DriverError::AddressParse(endpoint.to_string()))
}

/// The unspecified address of the same family as `addr`, port 0.
pub fn wildcard_for(addr: SocketAddr) -> SocketAddr {
    let ip: IpAddr = if addr.is_ipv4() {
        Ipv4Addr::UNSPECIFIED.into()
    } else {
        Ipv6Addr::UNSPECIFIED.into()
    };
    SocketAddr::new(ip, 0)
}

/// Local bind address for a client talking to `destination`.
///
/// Binds the wildcard of the destination's family on the destination port
/// plus one, so a client and server co-located for testing never collide.
pub fn client_bind_addr(destination: SocketAddr) -> SocketAddr {
    let mut addr = wildcard_for(destination);
    addr.set_port(destination.port().wrapping_add(1));
    addr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ipv4_literal() {
        let addr = resolve_endpoint("127.0.0.1", 4443).unwrap();
        assert!(addr.is_ipv4());
        assert_eq!(addr.port(), 4443);
    }

    #[test]
    fn test_resolve_ipv6_literal() {
        let addr = resolve_endpoint("::1", 5000).unwrap();
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_resolve_default_endpoint() {
        let addr = resolve_endpoint("::", 4443).unwrap();
        assert!(addr.is_ipv6());
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_resolve_rejects_hostname() {
        let err = resolve_endpoint("example.com", 4443).unwrap_err();
        assert!(matches!(err, DriverError::AddressParse(_)));
    }

    #[test]
    fn test_client_bind_addr_is_port_plus_one() {
        let dest = resolve_endpoint("127.0.0.1", 4443).unwrap();
        let bind = client_bind_addr(dest);
        assert_eq!(bind.port(), 4444);
        assert!(bind.is_ipv4());
        assert!(bind.ip().is_unspecified());
    }

    #[test]
    fn test_client_bind_addr_matches_family() {
        let dest = resolve_endpoint("::1", 4443).unwrap();
        let bind = client_bind_addr(dest);
        assert!(bind.is_ipv6());
    }
}
