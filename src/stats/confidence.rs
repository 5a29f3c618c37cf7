use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// ConfidenceLevel – the supported two-sided normal intervals
// ---------------------------------------------------------------------------

/// A supported confidence level for normal-approximation intervals on the
/// mean. Parses from and serializes to its label (`"95%"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfidenceLevel {
    P80,
    P85,
    P90,
    P95,
    P99,
    P99_5,
    P99_9,
}

impl ConfidenceLevel {
    /// Every supported level, ascending.
    pub const ALL: [ConfidenceLevel; 7] = [
        ConfidenceLevel::P80,
        ConfidenceLevel::P85,
        ConfidenceLevel::P90,
        ConfidenceLevel::P95,
        ConfidenceLevel::P99,
        ConfidenceLevel::P99_5,
        ConfidenceLevel::P99_9,
    ];

    /// The label used in output column names, e.g. `"95%"`.
    pub fn label(self) -> &'static str {
        match self {
            ConfidenceLevel::P80 => "80%",
            ConfidenceLevel::P85 => "85%",
            ConfidenceLevel::P90 => "90%",
            ConfidenceLevel::P95 => "95%",
            ConfidenceLevel::P99 => "99%",
            ConfidenceLevel::P99_5 => "99.5%",
            ConfidenceLevel::P99_9 => "99.9%",
        }
    }

    /// Two-sided standard normal critical value.
    pub fn z(self) -> f64 {
        match self {
            ConfidenceLevel::P80 => 1.282,
            ConfidenceLevel::P85 => 1.440,
            ConfidenceLevel::P90 => 1.645,
            ConfidenceLevel::P95 => 1.960,
            ConfidenceLevel::P99 => 2.576,
            ConfidenceLevel::P99_5 => 2.807,
            ConfidenceLevel::P99_9 => 3.291,
        }
    }

    /// Labels of every supported level, ascending.
    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|l| l.label()).collect()
    }

    /// Name of the lower-bound column, e.g. `"95% Confidence Interval Low"`.
    pub fn low_column(self) -> String {
        format!("{} Confidence Interval Low", self.label())
    }

    /// Name of the upper-bound column.
    pub fn high_column(self) -> String {
        format!("{} Confidence Interval High", self.label())
    }

    /// `(mean - z*std/sqrt(n), mean + z*std/sqrt(n))`.
    pub fn interval(self, mean: f64, std: f64, count: usize) -> (f64, f64) {
        let half_width = self.z() * std / (count as f64).sqrt();
        (mean - half_width, mean + half_width)
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a label is not one of the supported levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported confidence level '{}'; use one of: {}",
            self.0,
            ConfidenceLevel::labels().join(", ")
        )
    }
}

impl std::error::Error for UnknownLevel {}

impl FromStr for ConfidenceLevel {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.label() == wanted)
            .ok_or_else(|| UnknownLevel(s.to_string()))
    }
}

impl Serialize for ConfidenceLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for ConfidenceLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_every_label() {
        for level in ConfidenceLevel::ALL {
            assert_eq!(level.label().parse::<ConfidenceLevel>(), Ok(level));
        }
        assert!("97%".parse::<ConfidenceLevel>().is_err());
        assert!("0.95".parse::<ConfidenceLevel>().is_err());
    }

    #[test]
    fn interval_is_symmetric_around_mean() {
        let (low, high) = ConfidenceLevel::P95.interval(10.0, 2.0, 4);
        assert_relative_eq!(low, 10.0 - 1.96, epsilon = 1e-12);
        assert_relative_eq!(high, 10.0 + 1.96, epsilon = 1e-12);
    }

    #[test]
    fn column_names_embed_label() {
        assert_eq!(
            ConfidenceLevel::P99_5.low_column(),
            "99.5% Confidence Interval Low"
        );
        assert_eq!(
            ConfidenceLevel::P80.high_column(),
            "80% Confidence Interval High"
        );
    }
}
