//! Record types for the timing and benchmark datasets, plus deduplication
//! and ISP enrichment shared by both.

use std::collections::{HashMap, HashSet};
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Deserializer};

use crate::isp::{Isp, IspResolver};

/// The two network types a ranking is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    Cellular,
    Wifi,
}

impl NetworkType {
    pub const ALL: [NetworkType; 2] = [NetworkType::Cellular, NetworkType::Wifi];

    /// The connectivity-type value as it appears in timing records.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Cellular => "cellular",
            NetworkType::Wifi => "wifi",
        }
    }

    /// The human-readable label used in the report's `Type` column.
    pub fn label(&self) -> &'static str {
        match self {
            NetworkType::Cellular => "Mobile",
            NetworkType::Wifi => "Desktop",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page view from the navigation timing dataset.
///
/// Field names follow the lowercased column headers of the warehouse query
/// output. `asn`/`aso` are filled in by [`enrich_with_isp`].
#[derive(Debug, Clone, Deserialize)]
pub struct TimingRecord {
    #[serde(default, deserialize_with = "opt_str")]
    pub device_family: Option<String>,
    pub ip: String,
    #[serde(default, deserialize_with = "opt_f64")]
    pub ttfb: Option<f64>,
    #[serde(default, deserialize_with = "opt_f64")]
    pub plt: Option<f64>,
    #[serde(rename = "type", default, deserialize_with = "opt_str")]
    pub connection_type: Option<String>,
    #[serde(rename = "pageviewtoken")]
    pub token: String,
    #[serde(rename = "transfersize", default, deserialize_with = "opt_f64")]
    pub transfer_size: Option<f64>,
    #[serde(rename = "mobilemode", default, deserialize_with = "opt_str")]
    pub mobile_mode: Option<String>,
    #[serde(skip)]
    pub asn: u32,
    #[serde(skip)]
    pub aso: String,
}

/// One CPU benchmark sample joined to a page view.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkRecord {
    pub ip: String,
    #[serde(rename = "pageviewtoken")]
    pub token: String,
    pub score: f64,
    #[serde(skip)]
    pub asn: u32,
    #[serde(skip)]
    pub aso: String,
}

/// A record keyed by page-view identity that carries a client IP and an
/// ISP identity slot.
pub trait PageViewRecord {
    fn token(&self) -> &str;
    fn ip(&self) -> &str;
    fn set_isp(&mut self, isp: &Isp);
}

impl PageViewRecord for TimingRecord {
    fn token(&self) -> &str {
        &self.token
    }

    fn ip(&self) -> &str {
        &self.ip
    }

    fn set_isp(&mut self, isp: &Isp) {
        self.asn = isp.asn;
        self.aso = isp.aso.clone();
    }
}

impl PageViewRecord for BenchmarkRecord {
    fn token(&self) -> &str {
        &self.token
    }

    fn ip(&self) -> &str {
        &self.ip
    }

    fn set_isp(&mut self, isp: &Isp) {
        self.asn = isp.asn;
        self.aso = isp.aso.clone();
    }
}

/// Deduplicates records by page-view token, keeping the first occurrence.
pub fn dedup_first<T: PageViewRecord>(records: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.token().to_string()))
        .collect()
}

/// Attaches ASN/ASO to every record, resolving each distinct IP once.
pub fn enrich_with_isp<T, R>(records: &mut [T], resolver: &R) -> Result<()>
where
    T: PageViewRecord,
    R: IspResolver,
{
    let mut distinct: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for record in records.iter() {
        if seen.insert(record.ip().to_string()) {
            distinct.push(record.ip().to_string());
        }
    }

    let isps = resolver.resolve_batch(&distinct)?;
    let by_ip: HashMap<&str, &Isp> = distinct
        .iter()
        .map(String::as_str)
        .zip(isps.iter())
        .collect();

    for record in records.iter_mut() {
        let isp = by_ip.get(record.ip()).copied().cloned();
        if let Some(isp) = isp {
            record.set_isp(&isp);
        }
    }

    Ok(())
}

/// Warehouse output renders absent values as empty strings or `NULL`.
fn opt_str<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty() && s != "NULL"))
}

fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.is_empty() || s == "NULL" => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid number {s:?}: {e}"))),
    }
}
