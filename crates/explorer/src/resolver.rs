//! Expansion of declared time dimensions into selectable instants.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use wms_common::{LayerId, Period, TimeEntry, TimeExtent, WmsError, WmsResult};
use wms_protocol::Capabilities;

/// Resolves a layer's time positions into an ordered [`TimeExtent`].
#[derive(Debug, Clone)]
pub struct TimeDimensionResolver {
    capabilities: Arc<Capabilities>,
    max_time_steps: usize,
}

impl TimeDimensionResolver {
    pub fn new(capabilities: Arc<Capabilities>, max_time_steps: usize) -> Self {
        Self {
            capabilities,
            max_time_steps,
        }
    }

    #[instrument(skip(self), fields(layer = %layer))]
    pub fn resolve(&self, layer: &LayerId) -> WmsResult<TimeExtent> {
        let info = self
            .capabilities
            .layer(layer)
            .ok_or_else(|| WmsError::LayerNotFound(layer.to_string()))?;

        let extent = resolve_positions(&info.time_positions, self.max_time_steps)?;
        debug!(instants = extent.labels().len(), "Resolved time dimension");
        Ok(extent)
    }
}

/// Expand every `start/end/period` or single-instant entry and merge them.
///
/// No entries means [`TimeExtent::NoTime`]; any malformed entry fails the
/// whole resolution.
pub fn resolve_positions(positions: &[String], max_time_steps: usize) -> WmsResult<TimeExtent> {
    let mut instants = Vec::new();

    for position in positions {
        let entry = TimeEntry::parse(position).map_err(|e| WmsError::TimeEncoding {
            encoding: position.clone(),
            message: e.to_string(),
        })?;

        if let TimeEntry::Interval {
            period: Period::Unrecognized(token),
            ..
        } = &entry
        {
            warn!(encoding = %position, period = %token, "Unrecognized period, offering interval endpoints only");
        }

        instants.extend(entry.instants(max_time_steps));
    }

    Ok(TimeExtent::from_instants(instants, max_time_steps))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_three_daily_instants() {
        let extent =
            resolve_positions(&positions(&["2020-01-01T00:00:00Z/2020-01-03T00:00:00Z/P1D"]), 100)
                .unwrap();
        assert_eq!(
            extent.labels(),
            &[
                "2020-01-01T00:00:00Z",
                "2020-01-02T00:00:00Z",
                "2020-01-03T00:00:00Z"
            ]
        );
    }

    #[test]
    fn test_no_positions_is_no_time() {
        assert_eq!(resolve_positions(&[], 100).unwrap(), TimeExtent::NoTime);
    }

    #[test]
    fn test_two_field_entry_is_encoding_error() {
        let err = resolve_positions(&positions(&["2020-01-01/2020-01-02"]), 100).unwrap_err();
        match err {
            WmsError::TimeEncoding { encoding, .. } => assert_eq!(encoding, "2020-01-01/2020-01-02"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_overlapping_entries_merge() {
        let extent = resolve_positions(
            &positions(&["2015-01-01/2015-01-02/P1D", "2015-01-02/2015-01-03/P1D"]),
            100,
        )
        .unwrap();
        assert_eq!(extent.labels().len(), 3);
    }

    #[test]
    fn test_unrecognized_period_gives_endpoints() {
        let extent = resolve_positions(&positions(&["2020-01-01/2020-03-01/PXQ"]), 100).unwrap();
        assert_eq!(
            extent.labels(),
            &["2020-01-01T00:00:00Z", "2020-03-01T00:00:00Z"]
        );
    }

    #[test]
    fn test_max_steps_keeps_latest() {
        let extent = resolve_positions(&positions(&["2000-01-01/2020-01-01/P1D"]), 10).unwrap();
        assert_eq!(extent.labels().len(), 10);
        assert_eq!(extent.labels().last().unwrap(), "2020-01-01T00:00:00Z");
    }
}
