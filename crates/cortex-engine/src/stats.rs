//! Small numeric helpers shared by the analytics of every game.

use serde::Serialize;

/// Round to two decimal places.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 for fewer than two values.
pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// `part / whole` as a percentage rounded to 2dp; 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

/// Either a finished report or the reason there is not enough data for one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report<T> {
    Ready(T),
    Insufficient { message: String },
}

impl<T> Report<T> {
    pub fn insufficient(message: impl Into<String>) -> Self {
        Self::Insufficient {
            message: message.into(),
        }
    }

    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(v) => Some(v),
            Self::Insufficient { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stddev_matches_sample_formula() {
        assert_eq!(round2(sample_stddev(&[1.0, 2.0, 3.0, 4.0])), 1.29);
        assert_eq!(sample_stddev(&[7.0]), 0.0);
    }

    #[test]
    fn percent_handles_empty() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(2, 3), 66.67);
    }

    #[test]
    fn insufficient_report_serializes_as_message() {
        let r: Report<u32> = Report::insufficient("No rounds played yet.");
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            serde_json::json!({ "message": "No rounds played yet." })
        );
        assert_eq!(serde_json::to_value(Report::Ready(3)).unwrap(), 3);
    }
}
