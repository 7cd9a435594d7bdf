//! Assignment of ASNs to network types from observed traffic.

use std::collections::HashSet;

use crate::records::{NetworkType, TimingRecord};

/// Returns the distinct ASNs that have been observed serving traffic of
/// the given connectivity type at least once.
///
/// Computed from the unfiltered timing dataset, so classification does not
/// depend on CPU filtering. An ASN may legitimately appear for both
/// network types (dual-mode carriers). The lookup-miss sentinel (ASN 0) is
/// never classified.
pub fn asns_for_network(timing: &[TimingRecord], network: NetworkType) -> HashSet<u32> {
    timing
        .iter()
        .filter(|t| t.connection_type.as_deref() == Some(network.as_str()))
        .filter(|t| t.asn != 0)
        .map(|t| t.asn)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(asn: u32, connection_type: Option<&str>) -> TimingRecord {
        TimingRecord {
            device_family: None,
            ip: "192.0.2.1".to_string(),
            ttfb: Some(100.0),
            plt: Some(500.0),
            connection_type: connection_type.map(str::to_string),
            token: format!("t-{asn}-{connection_type:?}"),
            transfer_size: None,
            mobile_mode: None,
            asn,
            aso: format!("AS{asn}"),
        }
    }

    #[test]
    fn test_classification_by_observed_traffic() {
        let timing = vec![
            record(100, Some("cellular")),
            record(200, Some("wifi")),
            record(300, None),
        ];

        let cellular = asns_for_network(&timing, NetworkType::Cellular);
        let wifi = asns_for_network(&timing, NetworkType::Wifi);

        assert_eq!(cellular, HashSet::from([100]));
        assert_eq!(wifi, HashSet::from([200]));
    }

    #[test]
    fn test_dual_mode_asn_appears_in_both() {
        let timing = vec![record(100, Some("cellular")), record(100, Some("wifi"))];

        assert!(asns_for_network(&timing, NetworkType::Cellular).contains(&100));
        assert!(asns_for_network(&timing, NetworkType::Wifi).contains(&100));
    }

    #[test]
    fn test_sentinel_asn_never_classified() {
        let timing = vec![record(0, Some("cellular")), record(0, Some("wifi"))];

        assert!(asns_for_network(&timing, NetworkType::Cellular).is_empty());
        assert!(asns_for_network(&timing, NetworkType::Wifi).is_empty());
    }
}
