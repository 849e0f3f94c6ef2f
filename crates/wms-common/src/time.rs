//! Time dimension primitives: instants, ISO-8601 periods and extents.

use chrono::{DateTime, Duration, Months, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Label format for every instant offered to the user.
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Label shown when a layer has no time dimension.
pub const NOT_APPLICABLE_LABEL: &str = "N/A";

/// Parse an ISO 8601 instant, assuming UTC when no offset is given.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    // Try full datetime with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try without timezone (assume UTC)
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    // Try date only
    if let Ok(ndt) = NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Format an instant as a second-precision label with trailing `Z`.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.format(INSTANT_FORMAT).to_string()
}

/// Step between consecutive instants of a declared interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    /// Fixed-length ISO-8601 duration (weeks, days, hours, minutes, seconds).
    Fixed(Duration),
    /// Calendar step in whole months (`P1M`, `P3M`, `P1Y`).
    Calendar { months: u32 },
    /// Token that decodes as neither of the above.
    Unrecognized(String),
}

impl Period {
    pub fn parse(token: &str) -> Self {
        if let Some(duration) = decode_fixed(token) {
            return Period::Fixed(duration);
        }
        if let Some(months) = decode_calendar(token) {
            return Period::Calendar { months };
        }
        Period::Unrecognized(token.to_string())
    }
}

/// One designator of an ISO-8601 duration, e.g. `12H`.
#[derive(Debug, Clone, Copy)]
struct DurationComponent {
    designator: char,
    in_time: bool,
    value: f64,
}

/// Split `PnYnMnWnDTnHnMnS` into components. `None` if the grammar is violated.
fn duration_components(token: &str) -> Option<Vec<DurationComponent>> {
    let body = token.strip_prefix('P')?;
    let mut components = Vec::new();
    let mut number = String::new();
    let mut in_time = false;

    for c in body.chars() {
        match c {
            '0'..='9' | '.' | ',' => number.push(if c == ',' { '.' } else { c }),
            'T' if !in_time && number.is_empty() => in_time = true,
            'Y' | 'M' | 'W' | 'D' | 'H' | 'S' => {
                let allowed = if in_time {
                    matches!(c, 'H' | 'M' | 'S')
                } else {
                    matches!(c, 'Y' | 'M' | 'W' | 'D')
                };
                if !allowed || number.is_empty() {
                    return None;
                }
                let value: f64 = number.parse().ok()?;
                components.push(DurationComponent {
                    designator: c,
                    in_time,
                    value,
                });
                number.clear();
            }
            _ => return None,
        }
    }

    if !number.is_empty() || components.is_empty() {
        return None;
    }
    Some(components)
}

fn decode_fixed(token: &str) -> Option<Duration> {
    let mut millis = 0f64;
    for component in duration_components(token)? {
        let unit_ms = match (component.designator, component.in_time) {
            ('W', false) => 7.0 * 86_400_000.0,
            ('D', false) => 86_400_000.0,
            ('H', true) => 3_600_000.0,
            ('M', true) => 60_000.0,
            ('S', true) => 1_000.0,
            _ => return None,
        };
        millis += component.value * unit_ms;
    }

    let millis = millis.round();
    if millis < 1.0 || millis > i64::MAX as f64 {
        return None;
    }
    Some(Duration::milliseconds(millis as i64))
}

fn decode_calendar(token: &str) -> Option<u32> {
    let mut months = 0u32;
    for component in duration_components(token)? {
        if component.in_time || component.value.fract() != 0.0 {
            return None;
        }
        let per_unit = match component.designator {
            'Y' => 12,
            'M' => 1,
            _ => return None,
        };
        months = months.checked_add((component.value as u32).checked_mul(per_unit)?)?;
    }
    (months > 0).then_some(months)
}

/// One comma-separated item of a declared time extent.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeEntry {
    /// A bare instant
    Single(DateTime<Utc>),
    /// `start/end/period`
    Interval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        period: Period,
    },
}

impl TimeEntry {
    /// Parse `start/end/period` or a single instant.
    pub fn parse(entry: &str) -> Result<Self, TimeParseError> {
        let fields: Vec<&str> = entry.trim().split('/').collect();
        match fields.as_slice() {
            [single] => Ok(TimeEntry::Single(parse_instant(single.trim())?)),
            [start, end, period] => Ok(TimeEntry::Interval {
                start: parse_instant(start.trim())?,
                end: parse_instant(end.trim())?,
                period: Period::parse(period.trim()),
            }),
            _ => Err(TimeParseError::MalformedEntry(entry.to_string())),
        }
    }

    /// Instants of the closed interval, at most `max_steps` of the latest ones.
    ///
    /// An unrecognized period yields just the endpoints.
    pub fn instants(&self, max_steps: usize) -> Vec<DateTime<Utc>> {
        match self {
            TimeEntry::Single(dt) => vec![*dt],
            TimeEntry::Interval { start, end, .. } if start > end => Vec::new(),
            TimeEntry::Interval { start, end, period } => match period {
                Period::Fixed(step) => fixed_steps(*start, *end, *step, max_steps),
                Period::Calendar { months } => calendar_steps(*start, *end, *months, max_steps),
                Period::Unrecognized(_) => {
                    let mut endpoints = vec![*start];
                    if end != start {
                        endpoints.push(*end);
                    }
                    endpoints
                }
            },
        }
    }
}

fn fixed_steps(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    max_steps: usize,
) -> Vec<DateTime<Utc>> {
    let step_ms = step.num_milliseconds();
    if step_ms <= 0 || max_steps == 0 {
        return Vec::new();
    }

    let span_ms = (end - start).num_milliseconds();
    let count = (span_ms / step_ms) as u64 + 1;
    let skip = count.saturating_sub(max_steps as u64);

    (skip..count)
        .map(|k| start + Duration::milliseconds(k as i64 * step_ms))
        .collect()
}

fn calendar_steps(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    months: u32,
    max_steps: usize,
) -> Vec<DateTime<Utc>> {
    let mut instants = Vec::new();
    let mut k: u32 = 0;

    // Offsets are taken from `start` each time so clamped month ends do not drift.
    while let Some(dt) = k
        .checked_mul(months)
        .and_then(|offset| start.checked_add_months(Months::new(offset)))
    {
        if dt > end {
            break;
        }
        instants.push(dt);
        k += 1;
    }

    if instants.len() > max_steps {
        instants.drain(..instants.len() - max_steps);
    }
    instants
}

/// The selectable instants of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeExtent {
    /// The layer declares no usable time positions.
    NoTime,
    /// Ordered, deduplicated instant labels.
    Instants(Vec<String>),
}

impl TimeExtent {
    /// Build from arbitrary instants: sorted, deduplicated, latest `max_steps` kept.
    pub fn from_instants(
        instants: impl IntoIterator<Item = DateTime<Utc>>,
        max_steps: usize,
    ) -> Self {
        let mut instants: Vec<DateTime<Utc>> = instants.into_iter().collect();
        instants.sort();

        let mut labels: Vec<String> = instants.iter().map(format_instant).collect();
        labels.dedup();
        if labels.len() > max_steps {
            labels.drain(..labels.len() - max_steps);
        }

        if labels.is_empty() {
            TimeExtent::NoTime
        } else {
            TimeExtent::Instants(labels)
        }
    }

    pub fn is_no_time(&self) -> bool {
        matches!(self, TimeExtent::NoTime)
    }

    pub fn labels(&self) -> &[String] {
        match self {
            TimeExtent::NoTime => &[],
            TimeExtent::Instants(labels) => labels,
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels().iter().any(|l| l == label)
    }
}

/// Value held by the time widget.
///
/// `NotApplicable` stands in for "no time dimension" so the widget never
/// holds an empty or null value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeValue {
    Instant(String),
    NotApplicable,
}

impl TimeValue {
    /// Value for the GetMap `TIME` parameter.
    pub fn as_param(&self) -> Option<&str> {
        match self {
            TimeValue::Instant(label) => Some(label),
            TimeValue::NotApplicable => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            TimeValue::Instant(label) => label,
            TimeValue::NotApplicable => NOT_APPLICABLE_LABEL,
        }
    }

    /// Widget options for an extent.
    pub fn options_for(extent: &TimeExtent) -> Vec<TimeValue> {
        match extent {
            TimeExtent::NoTime => vec![TimeValue::NotApplicable],
            TimeExtent::Instants(labels) => {
                labels.iter().cloned().map(TimeValue::Instant).collect()
            }
        }
    }
}

impl From<String> for TimeValue {
    fn from(s: String) -> Self {
        if s == NOT_APPLICABLE_LABEL {
            TimeValue::NotApplicable
        } else {
            TimeValue::Instant(s)
        }
    }
}

impl From<TimeValue> for String {
    fn from(value: TimeValue) -> Self {
        value.label().to_string()
    }
}

impl std::fmt::Display for TimeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Expected 'start/end/period' or a single instant, got '{0}'")]
    MalformedEntry(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_instant_forms() {
        let dt = parse_instant("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.hour(), 12);

        assert_eq!(parse_instant("2024-01-15").unwrap(), utc(2024, 1, 15));
        assert_eq!(parse_instant("2024-01-15T00:00:00").unwrap(), utc(2024, 1, 15));
        assert!(parse_instant("yesterday").is_err());
    }

    #[test]
    fn test_fixed_periods() {
        assert_eq!(Period::parse("P1D"), Period::Fixed(Duration::days(1)));
        assert_eq!(Period::parse("PT10M"), Period::Fixed(Duration::minutes(10)));
        assert_eq!(Period::parse("P1W"), Period::Fixed(Duration::weeks(1)));
        assert_eq!(
            Period::parse("P1DT12H"),
            Period::Fixed(Duration::hours(36))
        );
        assert_eq!(
            Period::parse("PT0.5S"),
            Period::Fixed(Duration::milliseconds(500))
        );
    }

    #[test]
    fn test_calendar_periods() {
        assert_eq!(Period::parse("P1M"), Period::Calendar { months: 1 });
        assert_eq!(Period::parse("P3M"), Period::Calendar { months: 3 });
        assert_eq!(Period::parse("P1Y"), Period::Calendar { months: 12 });
        assert_eq!(Period::parse("P1Y6M"), Period::Calendar { months: 18 });
    }

    #[test]
    fn test_unrecognized_periods() {
        for token in ["PXYZ", "P0D", "P", "1D", "P1M1D", "PT1D", "P1.5M"] {
            assert_eq!(
                Period::parse(token),
                Period::Unrecognized(token.to_string()),
                "token {}",
                token
            );
        }
    }

    #[test]
    fn test_daily_interval_is_closed() {
        let entry = TimeEntry::parse("2020-01-01T00:00:00Z/2020-01-03T00:00:00Z/P1D").unwrap();
        let labels: Vec<String> = entry.instants(100).iter().map(format_instant).collect();
        assert_eq!(
            labels,
            vec![
                "2020-01-01T00:00:00Z",
                "2020-01-02T00:00:00Z",
                "2020-01-03T00:00:00Z"
            ]
        );
    }

    #[test]
    fn test_interval_end_not_on_step() {
        let entry = TimeEntry::parse("2020-01-01T00:00:00Z/2020-01-01T01:05:00Z/PT30M").unwrap();
        assert_eq!(entry.instants(100).len(), 3);
    }

    #[test]
    fn test_fixed_steps_keep_latest_when_capped() {
        let entry = TimeEntry::parse("2020-01-01/2020-01-10/P1D").unwrap();
        let instants = entry.instants(3);
        assert_eq!(instants, vec![utc(2020, 1, 8), utc(2020, 1, 9), utc(2020, 1, 10)]);
    }

    #[test]
    fn test_monthly_steps_do_not_drift() {
        let entry = TimeEntry::parse("2021-01-31/2021-05-31/P1M").unwrap();
        let days: Vec<u32> = entry.instants(100).iter().map(|dt| dt.day()).collect();
        // Jan 31, Feb 28, Mar 31, Apr 30, May 31
        assert_eq!(days, vec![31, 28, 31, 30, 31]);
    }

    #[test]
    fn test_yearly_steps() {
        let entry = TimeEntry::parse("2000-01-01/2003-06-01/P1Y").unwrap();
        let years: Vec<i32> = entry.instants(100).iter().map(|dt| dt.year()).collect();
        assert_eq!(years, vec![2000, 2001, 2002, 2003]);
    }

    #[test]
    fn test_unrecognized_period_yields_endpoints() {
        let entry = TimeEntry::parse("2020-01-01/2020-02-01/PQ").unwrap();
        assert_eq!(entry.instants(100), vec![utc(2020, 1, 1), utc(2020, 2, 1)]);
    }

    #[test]
    fn test_reversed_interval_is_empty() {
        let entry = TimeEntry::parse("2020-02-01/2020-01-01/P1D").unwrap();
        assert!(entry.instants(100).is_empty());
    }

    #[test]
    fn test_malformed_entries() {
        assert!(matches!(
            TimeEntry::parse("2020-01-01/2020-01-02"),
            Err(TimeParseError::MalformedEntry(_))
        ));
        assert!(matches!(
            TimeEntry::parse("a/b/P1D"),
            Err(TimeParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_extent_sorted_and_deduplicated() {
        let extent = TimeExtent::from_instants(
            vec![utc(2020, 1, 3), utc(2020, 1, 1), utc(2020, 1, 3)],
            10,
        );
        assert_eq!(
            extent.labels(),
            &["2020-01-01T00:00:00Z".to_string(), "2020-01-03T00:00:00Z".to_string()]
        );
        assert!(TimeExtent::from_instants(Vec::new(), 10).is_no_time());
    }

    #[test]
    fn test_time_value_sentinel() {
        let options = TimeValue::options_for(&TimeExtent::NoTime);
        assert_eq!(options, vec![TimeValue::NotApplicable]);
        assert_eq!(options[0].as_param(), None);
        assert_eq!(options[0].label(), "N/A");

        let json = serde_json::to_string(&TimeValue::NotApplicable).unwrap();
        assert_eq!(json, "\"N/A\"");
        let back: TimeValue = serde_json::from_str("\"2020-01-01T00:00:00Z\"").unwrap();
        assert_eq!(back.as_param(), Some("2020-01-01T00:00:00Z"));
    }
}
