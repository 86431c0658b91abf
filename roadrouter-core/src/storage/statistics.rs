use serde::Serialize;

use crate::model::{CalculationRecord, CalculationStatus};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Success, failure and latency figures over a window of calculation records.
///
/// Rates are percentages rounded to two decimals; latencies are milliseconds
/// over completed calculations only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationStatistics {
    pub total_calculations: usize,
    pub successful_calculations: usize,
    pub failed_calculations: usize,
    pub cached_calculations: usize,
    pub success_rate: f64,
    pub error_rate: f64,
    pub cache_hit_rate: f64,
    pub average_calculation_time: f64,
    pub p95_calculation_time: f64,
}

impl CalculationStatistics {
    #[allow(clippy::cast_precision_loss)]
    pub fn from_records(records: &[CalculationRecord]) -> Self {
        let count = |status| records.iter().filter(|r| r.status == status).count();
        let total = records.len();
        let successful = count(CalculationStatus::Completed);
        let failed = count(CalculationStatus::Failed);
        let cached = count(CalculationStatus::Cached);

        let mut times: Vec<f64> = records
            .iter()
            .filter(|r| r.status == CalculationStatus::Completed)
            .filter_map(|r| r.calculation_time)
            .collect();
        times.sort_by(f64::total_cmp);

        let average = if times.is_empty() {
            0.0
        } else {
            times.iter().sum::<f64>() / times.len() as f64
        };
        // floor(n * 0.95) as an index; clamps to the last sample for small n
        let p95 = if times.is_empty() {
            0.0
        } else {
            let index = (times.len() * 95 / 100).min(times.len() - 1);
            times[index]
        };

        let rate = |part: usize| {
            if total == 0 {
                0.0
            } else {
                round2(part as f64 / total as f64 * 100.0)
            }
        };

        Self {
            total_calculations: total,
            successful_calculations: successful,
            failed_calculations: failed,
            cached_calculations: cached,
            success_rate: rate(successful),
            error_rate: rate(failed),
            cache_hit_rate: rate(cached),
            average_calculation_time: round2(average),
            p95_calculation_time: round2(p95),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::model::{Coordinate, RouteOptions};

    fn finished(status: CalculationStatus, time: f64) -> CalculationRecord {
        let now = Utc::now();
        let mut record = CalculationRecord::pending(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            &RouteOptions::default(),
            now,
        );
        match status {
            CalculationStatus::Completed => {
                record.mark_in_progress(now).unwrap();
                record.mark_completed(time, 2, Uuid::new_v4(), now).unwrap();
            }
            CalculationStatus::Failed => {
                record.mark_in_progress(now).unwrap();
                record.mark_failed(time, "no route", now).unwrap();
            }
            CalculationStatus::Cached => record.mark_cached(time, now).unwrap(),
            CalculationStatus::InProgress => record.mark_in_progress(now).unwrap(),
            CalculationStatus::Pending => {}
        }
        record
    }

    #[test]
    fn test_empty_window() {
        let stats = CalculationStatistics::from_records(&[]);
        assert_eq!(stats.total_calculations, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.p95_calculation_time, 0.0);
    }

    #[test]
    fn test_rates_and_latency() {
        let records = vec![
            finished(CalculationStatus::Completed, 100.0),
            finished(CalculationStatus::Failed, 5.0),
            finished(CalculationStatus::Cached, 1.0),
        ];
        let stats = CalculationStatistics::from_records(&records);

        assert_eq!(stats.total_calculations, 3);
        assert_eq!(stats.successful_calculations, 1);
        assert_eq!(stats.failed_calculations, 1);
        assert_eq!(stats.cached_calculations, 1);
        assert_eq!(stats.success_rate, 33.33);
        assert_eq!(stats.error_rate, 33.33);
        assert_eq!(stats.cache_hit_rate, 33.33);
        assert_eq!(stats.average_calculation_time, 100.0);
        assert_eq!(stats.p95_calculation_time, 100.0);
    }

    #[test]
    fn test_p95_index() {
        let records: Vec<CalculationRecord> = (1..=20)
            .map(|ms| finished(CalculationStatus::Completed, f64::from(ms)))
            .collect();
        let stats = CalculationStatistics::from_records(&records);
        // floor(20 * 0.95) = 19 -> the 20th sample
        assert_eq!(stats.p95_calculation_time, 20.0);
        assert_eq!(stats.average_calculation_time, 10.5);
    }
}
