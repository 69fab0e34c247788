// Copyright 2025 Fan-Out Aggregator Contributors
// SPDX-License-Identifier: Apache-2.0

//! Wire types shared by the service, the CLI and the benchmark reports.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Identifies one of the three legs of a fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegName {
    /// Data-source query
    Db,
    /// Outbound call to the remote API
    Api,
    /// Loopback call to the sibling `/internal` endpoint
    Internal,
}

impl LegName {
    /// All legs, in response order.
    pub const ALL: [LegName; 3] = [LegName::Db, LegName::Api, LegName::Internal];

    /// Key used in the benchmark record and as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Db => "db",
            Self::Api => "api",
            Self::Internal => "internal",
        }
    }

    /// Human-readable label used by the text summary and chart.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Db => "DB",
            Self::Api => "API",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for LegName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Elapsed milliseconds rounded to two decimal places.
///
/// Serialized as a decimal string with exactly two fraction digits
/// (`"12.30"`); deserializes from that string or from a plain JSON number.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Millis(f64);

impl Millis {
    /// Round a duration to hundredths of a millisecond.
    pub fn from_duration(duration: Duration) -> Self {
        Self::from_f64(duration.as_secs_f64() * 1000.0)
    }

    /// Round a raw millisecond value to hundredths. Negative input clamps to zero.
    pub fn from_f64(ms: f64) -> Self {
        Self((ms.max(0.0) * 100.0).round() / 100.0)
    }

    /// The value in milliseconds.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Serialize for Millis {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Millis {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        let ms = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| de::Error::custom(format!("invalid millisecond value {s:?}: {e}")))?,
        };
        if !ms.is_finite() || ms < 0.0 {
            return Err(de::Error::custom(format!("millisecond value out of range: {ms}")));
        }
        Ok(Self::from_f64(ms))
    }
}

/// Per-leg elapsed time for one fan-out request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Data-source query duration
    pub db: Millis,
    /// Remote API call duration
    pub api: Millis,
    /// Internal endpoint call duration
    pub internal: Millis,
}

impl BenchmarkRecord {
    /// Duration recorded for `leg`.
    pub fn get(&self, leg: LegName) -> Millis {
        match leg {
            LegName::Db => self.db,
            LegName::Api => self.api,
            LegName::Internal => self.internal,
        }
    }

    /// Record the duration of `leg`.
    pub fn set(&mut self, leg: LegName, elapsed: Millis) {
        match leg {
            LegName::Db => self.db = elapsed,
            LegName::Api => self.api = elapsed,
            LegName::Internal => self.internal = elapsed,
        }
    }

    /// The slowest leg's duration; a concurrent fan-out should take about this long.
    pub fn slowest(&self) -> Millis {
        LegName::ALL
            .iter()
            .map(|leg| self.get(*leg))
            .fold(Millis::default(), |a, b| if b > a { b } else { a })
    }

    /// Sum of all leg durations; what a sequential run would cost.
    pub fn sum(&self) -> Millis {
        Millis::from_f64(LegName::ALL.iter().map(|leg| self.get(*leg).as_f64()).sum())
    }
}

/// Merged output of a successful fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    /// Per-leg durations
    pub benchmark: BenchmarkRecord,
    /// Output of the data-source query
    pub db_result: serde_json::Value,
    /// Parsed body of the remote API response
    pub api_result: serde_json::Value,
    /// Parsed body of the internal endpoint response
    pub internal_result: serde_json::Value,
}

/// One row of the seeded `items` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Row id assigned by the store
    pub id: i64,
    /// Item name
    pub name: String,
}

/// Body returned by `GET /internal`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InternalReply {
    /// Echo variant: the input reversed and uppercased
    Echo {
        /// Input as received
        original: String,
        /// Input with characters reversed, then uppercased
        transformed: String,
        /// Number of characters in the input
        length: usize,
    },
    /// Acknowledge variant: a static message
    Acknowledge {
        /// Fixed acknowledgement text
        message: String,
    },
}

impl InternalReply {
    /// Message returned by the acknowledge variant.
    pub const ACKNOWLEDGEMENT: &'static str = "Internal endpoint reached";

    /// Build the echo reply for `input`.
    pub fn echo(input: &str) -> Self {
        let transformed = input.chars().rev().collect::<String>().to_uppercase();
        Self::Echo {
            original: input.to_string(),
            transformed,
            length: input.chars().count(),
        }
    }

    /// Build the acknowledge reply.
    pub fn acknowledge() -> Self {
        Self::Acknowledge {
            message: Self::ACKNOWLEDGEMENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_millis_rounds_to_hundredths() {
        let ms = Millis::from_duration(Duration::from_micros(12_346));
        assert_eq!(ms.as_f64(), 12.35);
        assert_eq!(ms.to_string(), "12.35");
        assert_eq!(Millis::from_f64(7.0).to_string(), "7.00");
        assert_eq!(Millis::from_f64(-3.0).as_f64(), 0.0);
    }

    #[test]
    fn test_millis_wire_format() {
        let value = serde_json::to_value(Millis::from_f64(12.3)).unwrap();
        assert_eq!(value, json!("12.30"));

        let from_text: Millis = serde_json::from_value(json!("48.07")).unwrap();
        assert_eq!(from_text.as_f64(), 48.07);

        let from_number: Millis = serde_json::from_value(json!(5.5)).unwrap();
        assert_eq!(from_number.to_string(), "5.50");

        assert!(serde_json::from_value::<Millis>(json!("fast")).is_err());
        assert!(serde_json::from_value::<Millis>(json!("-1.00")).is_err());
    }

    #[test]
    fn test_benchmark_record_keys() {
        let mut record = BenchmarkRecord::default();
        record.set(LegName::Db, Millis::from_f64(1.0));
        record.set(LegName::Api, Millis::from_f64(250.456));
        record.set(LegName::Internal, Millis::from_f64(52.1));

        let value = serde_json::to_value(record).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 3);
        assert_eq!(value, json!({"db": "1.00", "api": "250.46", "internal": "52.10"}));

        assert_eq!(record.slowest().as_f64(), 250.46);
        assert_eq!(record.sum().as_f64(), 303.56);
    }

    #[test]
    fn test_aggregated_result_field_names() {
        let result = AggregatedResult {
            benchmark: BenchmarkRecord::default(),
            db_result: json!([]),
            api_result: json!({"id": 1}),
            internal_result: json!({"message": "hi"}),
        };

        let value = serde_json::to_value(&result).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("benchmark"));
        assert!(obj.contains_key("dbResult"));
        assert!(obj.contains_key("apiResult"));
        assert!(obj.contains_key("internalResult"));
    }

    #[test]
    fn test_echo_reply() {
        let reply = InternalReply::echo("hello");
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({"original": "hello", "transformed": "OLLEH", "length": 5})
        );
    }

    #[test]
    fn test_echo_counts_characters_not_bytes() {
        match InternalReply::echo("ñam") {
            InternalReply::Echo { transformed, length, .. } => {
                assert_eq!(transformed, "MAÑ");
                assert_eq!(length, 3);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_reply_variants_deserialize() {
        let echo: InternalReply =
            serde_json::from_value(json!({"original": "a", "transformed": "A", "length": 1}))
                .unwrap();
        assert_eq!(echo, InternalReply::echo("a"));

        let ack: InternalReply =
            serde_json::from_value(json!({"message": InternalReply::ACKNOWLEDGEMENT})).unwrap();
        assert_eq!(ack, InternalReply::acknowledge());
    }
}
