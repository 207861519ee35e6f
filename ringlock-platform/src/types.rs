// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use ringlock_engine::time::{PS_PER_MS, PS_PER_NS, PS_PER_S, PS_PER_US};
use serde::{Deserialize, Serialize, de};
use serde_yaml::Value;

/// Convert a duration string to picoseconds.
///
/// The value can be an integer or a decimal followed by one of the units
/// `ps`, `ns`, `us`, `ms` or `s`. Some examples are:
///  1ps
///  3ms
///  0.5s
///  2.5 us
///
/// The result must be a whole number of picoseconds.
pub fn duration_ps(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| format!("'{s}': missing unit (ps, ns, us, ms or s)"))?;
    let (number, unit) = trimmed.split_at(split);
    let number = number.trim();

    let scale = match unit {
        "ps" => 1,
        "ns" => PS_PER_NS,
        "us" => PS_PER_US,
        "ms" => PS_PER_MS,
        "s" => PS_PER_S,
        _ => return Err(format!("'{s}': unknown unit '{unit}'")),
    };

    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(format!("'{s}': missing value"));
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(format!("'{s}': value is not a non-negative number"));
    }

    let overflow = || format!("'{s}': too large");
    let whole_ps = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .map_err(|_| overflow())?
            .checked_mul(scale)
            .ok_or_else(overflow)?
    };

    let mut fraction_ps = 0;
    let mut place = scale;
    for digit in fraction.chars().filter_map(|c| c.to_digit(10)) {
        if place % 10 != 0 {
            if digit != 0 {
                return Err(format!("'{s}': finer than one picosecond"));
            }
            continue;
        }
        place /= 10;
        fraction_ps += u64::from(digit) * place;
    }

    whole_ps.checked_add(fraction_ps).ok_or_else(overflow)
}

/// Parse a duration string and return the value in picoseconds.
pub fn parse_duration_str<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: de::Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    match value.as_str() {
        Some(s) => duration_ps(s).map_err(de::Error::custom),
        None => Err(de::Error::custom(format!(
            "'{value:?}': Unsupported type for a duration (should be a String such as \"3ms\")"
        ))),
    }
}

pub fn parse_optional_duration_str<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: de::Deserializer<'de>,
{
    Ok(Some(parse_duration_str(deserializer)?))
}

/// Write picoseconds back as the shortest exact duration string.
pub fn serialize_duration<S>(value_ps: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format_duration(*value_ps))
}

pub fn serialize_optional_duration<S>(value_ps: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value_ps {
        Some(value_ps) => serialize_duration(value_ps, serializer),
        None => serializer.serialize_none(),
    }
}

#[must_use]
pub fn format_duration(value_ps: u64) -> String {
    const UNITS: [(u64, &str); 4] = [
        (PS_PER_S, "s"),
        (PS_PER_MS, "ms"),
        (PS_PER_US, "us"),
        (PS_PER_NS, "ns"),
    ];
    for (scale, unit) in UNITS {
        if value_ps != 0 && value_ps % scale == 0 {
            return format!("{}{unit}", value_ps / scale);
        }
    }
    format!("{value_ps}ps")
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Mixed with each node id to seed its random number generator.
    pub seed: Option<u64>,

    pub nodes: Vec<NodeSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logger: Option<LoggerSection>,

    /// Delay of every ring link when `links` is not given.
    #[serde(
        default,
        deserialize_with = "parse_optional_duration_str",
        serialize_with = "serialize_optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub ring_delay: Option<u64>,

    /// Delay of every report link when `report_links` is not given.
    #[serde(
        default,
        deserialize_with = "parse_optional_duration_str",
        serialize_with = "serialize_optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub report_delay: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<LinkSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_links: Option<Vec<ReportLinkSection>>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSection {
    pub name: String,
    pub queue_max_size: Option<usize>,
    #[serde(
        default,
        deserialize_with = "parse_optional_duration_str",
        serialize_with = "serialize_optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub tick_freq: Option<u64>,
    pub message_gen: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_quota: Option<usize>,

    /// `uniform` or the name of a node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_control: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_credit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preload: Option<PreloadSection>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PreloadSection {
    pub count: usize,
    pub destination: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerSection {
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "parse_optional_duration_str",
        serialize_with = "serialize_optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub tick_freq: Option<u64>,
    pub num_nodes: usize,
    pub idle_threshold: Option<u64>,
    pub request_threshold: Option<u64>,
    #[serde(
        default,
        deserialize_with = "parse_optional_duration_str",
        serialize_with = "serialize_optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub grace_window: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSection {
    pub from: String,
    pub to: String,
    #[serde(
        deserialize_with = "parse_duration_str",
        serialize_with = "serialize_duration"
    )]
    pub delay: u64,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportLinkSection {
    pub node: String,
    pub port: usize,
    #[serde(
        default,
        deserialize_with = "parse_optional_duration_str",
        serialize_with = "serialize_optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub delay: Option<u64>,
}
