pub mod countries;
pub mod isp;
pub mod medians;
pub mod query;
pub mod ranking;
pub mod records;
pub mod report;
pub mod stats;
pub mod telemetry;
