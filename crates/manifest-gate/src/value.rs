//! Typed interpretation of string parameter values.

use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

static RE_TIMESPAN_CONSTRUCTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^From(Ticks|Milliseconds|Seconds|Minutes|Hours|Days)\((-?\d+(?:\.\d+)?)\)$")
        .unwrap()
});

static RE_DRIVE_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[\\/]").unwrap());

/// Expected type of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    UInt,
    Double,
    /// Seconds, possibly fractional, or `MaxValue` / `MinValue`.
    TimeSpan,
    Guid,
    Path,
    String,
    Enum(&'static [&'static str]),
}

impl ValueKind {
    pub fn describe(&self) -> String {
        match self {
            ValueKind::Bool => "a boolean".to_string(),
            ValueKind::Int => "an integer".to_string(),
            ValueKind::UInt => "an unsigned integer".to_string(),
            ValueKind::Double => "a number".to_string(),
            ValueKind::TimeSpan => "a duration in seconds".to_string(),
            ValueKind::Guid => "a GUID".to_string(),
            ValueKind::Path => "an absolute path".to_string(),
            ValueKind::String => "a string".to_string(),
            ValueKind::Enum(values) => format!("one of [{}]", values.join(", ")),
        }
    }

    /// Checks that `value` can be read as this kind. Empty strings are
    /// accepted for string-like kinds only.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ValueKind::Bool => parse_bool(value).is_some(),
            ValueKind::Int => parse_int(value).is_some(),
            ValueKind::UInt => parse_uint(value).is_some(),
            ValueKind::Double => parse_double(value).is_some(),
            ValueKind::TimeSpan => parse_timespan(value).is_some(),
            ValueKind::Guid => value.is_empty() || parse_guid(value).is_some(),
            ValueKind::Path => value.is_empty() || is_rooted_path(value),
            ValueKind::String => true,
            ValueKind::Enum(values) => values.iter().any(|v| v.eq_ignore_ascii_case(value)),
        }
    }

    /// Numeric reading of a value, used by range constraints.
    pub fn numeric(&self, value: &str) -> Option<f64> {
        match self {
            ValueKind::Int => parse_int(value).map(f64::from),
            ValueKind::UInt => parse_uint(value).map(f64::from),
            ValueKind::Double => parse_double(value),
            ValueKind::TimeSpan => parse_timespan(value),
            _ => None,
        }
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

pub fn parse_int(value: &str) -> Option<i32> {
    value.parse::<i32>().ok()
}

pub fn parse_uint(value: &str) -> Option<u32> {
    if value.starts_with('+') {
        return None;
    }
    value.parse::<u32>().ok()
}

pub fn parse_double(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Durations are written in seconds. `MaxValue` and `MinValue` map to the
/// extremes of `f64` so that range checks treat them as unbounded.
pub fn parse_timespan(value: &str) -> Option<f64> {
    if value.eq_ignore_ascii_case("MaxValue") {
        return Some(f64::MAX);
    }
    if value.eq_ignore_ascii_case("MinValue") {
        return Some(f64::MIN);
    }
    parse_double(value)
}

pub fn parse_guid(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value).ok()
}

/// True for `/x`, `\x`, `\\server\share` and `C:\x` style paths.
pub fn is_rooted_path(value: &str) -> bool {
    value.starts_with('/') || value.starts_with('\\') || RE_DRIVE_ROOT.is_match(value)
}

/// True when the value is made of ASCII digits only and fits an `i32`.
pub fn is_digits_only(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) && parse_int(value).is_some()
}

/// Reads a duration default literal and returns its length in seconds.
///
/// Accepted forms are `Zero`, `MinValue`, `MaxValue` and
/// `FromTicks|FromMilliseconds|FromSeconds|FromMinutes|FromHours|FromDays(n)`.
pub fn parse_timespan_literal(literal: &str) -> Option<f64> {
    match literal {
        "Zero" => return Some(0.0),
        "MaxValue" => return Some(f64::MAX),
        "MinValue" => return Some(f64::MIN),
        _ => {}
    }

    let caps = RE_TIMESPAN_CONSTRUCTOR.captures(literal)?;
    let amount: f64 = caps[2].parse().ok()?;
    let scale = match &caps[1] {
        "Ticks" => 1e-7,
        "Milliseconds" => 1e-3,
        "Seconds" => 1.0,
        "Minutes" => 60.0,
        "Hours" => 3600.0,
        "Days" => 86400.0,
        _ => return None,
    };
    Some(amount * scale)
}

/// Renders seconds the way a parameter value would be written, so that an
/// explicit `60` and a default of `FromSeconds(60)` compare equal.
pub fn canonical_seconds(seconds: f64) -> String {
    if seconds == f64::MAX {
        "MaxValue".to_string()
    } else if seconds == f64::MIN {
        "MinValue".to_string()
    } else {
        // Ticks are 100ns; round away float noise from the scale factors.
        let rounded = (seconds * 1e7).round() / 1e7;
        format!("{}", rounded)
    }
}
