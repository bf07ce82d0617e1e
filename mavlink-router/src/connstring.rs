//! Parsing of router connection strings: `udpin:`, `udpout:`, `tcpout:`, `serial:`.
//!
//! Grounded on `mavlink-core`'s `connectable::ConnectionAddress::parse_address` (same
//! split-on-`:` approach), but reporting the distinct startup-error variants the router
//! needs instead of one generic `io::Error`.

use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::StartupError;

/// A parsed connection string, ready to be turned into a live adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    UdpIn { address: Ipv4Addr, port: u16 },
    UdpOut { address: Ipv4Addr, port: u16 },
    TcpOut { address: Ipv4Addr, port: u16 },
    Serial { device: String, baud: u32 },
}

impl Endpoint {
    /// Parses one of the four forms defined by the external interface:
    /// `udpin:<ip>:<port>`, `udpout:<ip>:<port>`, `tcpout:<ip>:<port>`, `serial:<device>:<baud>`.
    pub fn parse(s: &str) -> Result<Self, StartupError> {
        let mut parts = s.splitn(3, ':');
        let protocol = parts.next().unwrap_or_default();
        let first = parts
            .next()
            .ok_or_else(|| StartupError::InvalidProtocol(s.to_owned()))?;
        let second = parts
            .next()
            .ok_or_else(|| StartupError::InvalidProtocol(s.to_owned()))?;

        match protocol {
            "udpin" | "udpout" | "tcpout" => {
                let address = Ipv4Addr::from_str(first)
                    .map_err(|_| StartupError::InvalidIpAddress(s.to_owned(), first.to_owned()))?;
                let port = u16::from_str(second)
                    .map_err(|_| StartupError::InvalidPort(s.to_owned(), second.to_owned()))?;
                if port == 0 {
                    return Err(StartupError::InvalidPort(s.to_owned(), second.to_owned()));
                }
                Ok(match protocol {
                    "udpin" => Endpoint::UdpIn { address, port },
                    "udpout" => Endpoint::UdpOut { address, port },
                    _ => Endpoint::TcpOut { address, port },
                })
            }
            "serial" => {
                let baud = u32::from_str(second)
                    .map_err(|_| StartupError::InvalidBaud(s.to_owned(), second.to_owned()))?;
                Ok(Endpoint::Serial {
                    device: first.to_owned(),
                    baud,
                })
            }
            _ => Err(StartupError::InvalidProtocol(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_udpin() {
        assert_eq!(
            Endpoint::parse("udpin:0.0.0.0:14550").unwrap(),
            Endpoint::UdpIn {
                address: Ipv4Addr::new(0, 0, 0, 0),
                port: 14550,
            }
        );
    }

    #[test]
    fn parses_serial() {
        assert_eq!(
            Endpoint::parse("serial:/dev/ttyUSB0:57600").unwrap(),
            Endpoint::Serial {
                device: "/dev/ttyUSB0".to_owned(),
                baud: 57600,
            }
        );
    }

    #[test]
    fn rejects_unknown_protocol() {
        assert!(matches!(
            Endpoint::parse("icmp:0.0.0.0:0"),
            Err(StartupError::InvalidProtocol(_))
        ));
    }

    #[test]
    fn rejects_bad_ip() {
        assert!(matches!(
            Endpoint::parse("udpout:not-an-ip:14550"),
            Err(StartupError::InvalidIpAddress(_, _))
        ));
    }

    #[test]
    fn rejects_bad_port() {
        assert!(matches!(
            Endpoint::parse("tcpout:127.0.0.1:not-a-port"),
            Err(StartupError::InvalidPort(_, _))
        ));
    }

    #[test]
    fn rejects_zero_port() {
        assert!(matches!(
            Endpoint::parse("tcpout:127.0.0.1:0"),
            Err(StartupError::InvalidPort(_, _))
        ));
    }

    #[test]
    fn rejects_bad_baud() {
        assert!(matches!(
            Endpoint::parse("serial:/dev/ttyUSB0:fast"),
            Err(StartupError::InvalidBaud(_, _))
        ));
    }
}
