//! IP-to-ISP identity resolution backed by a GeoIP2-ISP database.

use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

/// Default location of the GeoIP2-ISP database, overridable via `GEOIP_ISP_DB`.
pub const DEFAULT_ISP_DB: &str = "/usr/share/GeoIP/GeoIP2-ISP.mmdb";

/// The ISP identity attached to a record after enrichment.
///
/// `asn == 0` with an empty `aso` is the lookup-miss sentinel; it never
/// matches a real autonomous system downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isp {
    pub asn: u32,
    pub aso: String,
}

impl Isp {
    /// The sentinel returned when an address cannot be resolved.
    pub fn unknown() -> Self {
        Isp {
            asn: 0,
            aso: String::new(),
        }
    }
}

/// Abstraction over the IP-to-ISP lookup source.
pub trait IspResolver {
    /// Resolves a batch of IP addresses to ISP identities, one per input,
    /// substituting [`Isp::unknown`] for any address that cannot be resolved.
    fn resolve_batch(&self, ips: &[String]) -> Result<Vec<Isp>>;
}

/// Shape of an ISP entry in the GeoIP2-ISP database.
#[derive(Deserialize)]
struct IspDbRecord {
    autonomous_system_number: Option<u32>,
    autonomous_system_organization: Option<String>,
}

/// Resolver backed by a read-only MaxMind `.mmdb` file.
///
/// The database is opened once per [`resolve_batch`](IspResolver::resolve_batch)
/// call and released when the call returns.
pub struct GeoIpResolver {
    db_path: PathBuf,
}

impl GeoIpResolver {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Builds a resolver from the `GEOIP_ISP_DB` environment variable,
    /// falling back to [`DEFAULT_ISP_DB`].
    pub fn from_env() -> Self {
        let path = std::env::var("GEOIP_ISP_DB").unwrap_or_else(|_| DEFAULT_ISP_DB.to_string());
        Self::new(path)
    }
}

impl IspResolver for GeoIpResolver {
    fn resolve_batch(&self, ips: &[String]) -> Result<Vec<Isp>> {
        let reader = maxminddb::Reader::open_readfile(&self.db_path)?;

        let isps = ips.iter().map(|ip| lookup_one(&reader, ip)).collect();

        // reader dropped here, releasing the database
        Ok(isps)
    }
}

fn lookup_one(reader: &maxminddb::Reader<Vec<u8>>, ip: &str) -> Isp {
    let addr: IpAddr = match ip.parse() {
        Ok(addr) => addr,
        Err(_) => {
            debug!(ip, "Could not parse IP address, using unknown ISP");
            return Isp::unknown();
        }
    };

    match reader.lookup::<IspDbRecord>(addr) {
        Ok(record) => match record.autonomous_system_number {
            Some(asn) => Isp {
                asn,
                aso: record.autonomous_system_organization.unwrap_or_default(),
            },
            None => {
                debug!(ip, "No ASN data for IP address, using unknown ISP");
                Isp::unknown()
            }
        },
        Err(e) => {
            debug!(ip, error = %e, "Could not determine ASN/ASO for IP address");
            Isp::unknown()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_sentinel() {
        let isp = Isp::unknown();
        assert_eq!(isp.asn, 0);
        assert_eq!(isp.aso, "");
    }

    #[test]
    fn test_missing_database_is_an_error() {
        let resolver = GeoIpResolver::new("/nonexistent/GeoIP2-ISP.mmdb");
        let result = resolver.resolve_batch(&["192.0.2.1".to_string()]);
        assert!(result.is_err());
    }
}
