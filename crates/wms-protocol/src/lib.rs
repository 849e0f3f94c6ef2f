//! OGC WMS client-side protocol support.
//!
//! Supports:
//! - GetCapabilities parsing for WMS 1.1.1 and 1.3.0
//! - GetMap request construction (KVP binding)
//! - Service exception reports

pub mod capabilities;
pub mod client;
pub mod exceptions;
pub mod getmap;

pub use capabilities::{parse_capabilities, Capabilities};
pub use client::{HttpWmsClient, WmsService};
pub use exceptions::parse_exception_report;
pub use getmap::{capabilities_url, GetMapRequest, WmsVersion};
