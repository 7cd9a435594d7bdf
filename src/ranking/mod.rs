//! The ranking core: ASN classification, CPU normalization, and
//! per-organization aggregation into an ordered ranking.

pub mod aggregate;
pub mod classify;
pub mod join;
pub mod types;

pub use aggregate::generate_ranking;
pub use types::{CpuBand, RankingEntry};
