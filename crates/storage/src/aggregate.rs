//! Age distribution over the `users` table.
//!
//! Bucket bounds are inclusive on both ends, so age 40 falls in both `20 to 40`
//! and `40 to 60`. Percentages are rounded independently and need not sum to 100.

use std::fmt::Write as _;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::info;

use crate::error::StoreError;
use crate::store::UserStore;

pub const NO_DATA_MESSAGE: &str = "No users found in the database";

/// One inclusive age range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBucket {
    pub label: &'static str,
    pub min: i32,
    pub max: i32,
}

pub const AGE_BUCKETS: [AgeBucket; 4] = [
    AgeBucket { label: "< 20", min: 0, max: 19 },
    AgeBucket { label: "20 to 40", min: 20, max: 40 },
    AgeBucket { label: "40 to 60", min: 40, max: 60 },
    AgeBucket { label: "> 60", min: 61, max: i32::MAX },
];

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("failed to count users in bucket '{bucket}': {source}")]
    Query {
        bucket: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Rounded percentage per bucket, keyed by the bucket labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeDistribution {
    #[serde(rename = "< 20")]
    pub under_20: u32,
    #[serde(rename = "20 to 40")]
    pub from_20_to_40: u32,
    #[serde(rename = "40 to 60")]
    pub from_40_to_60: u32,
    #[serde(rename = "> 60")]
    pub over_60: u32,
}

impl AgeDistribution {
    pub fn entries(&self) -> [(&'static str, u32); 4] {
        [
            (AGE_BUCKETS[0].label, self.under_20),
            (AGE_BUCKETS[1].label, self.from_20_to_40),
            (AGE_BUCKETS[2].label, self.from_40_to_60),
            (AGE_BUCKETS[3].label, self.over_60),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistributionReport {
    /// The table is empty.
    NoData,
    Distribution {
        total: i64,
        percentages: AgeDistribution,
    },
}

impl DistributionReport {
    pub fn total(&self) -> i64 {
        match self {
            DistributionReport::NoData => 0,
            DistributionReport::Distribution { total, .. } => *total,
        }
    }
}

impl Serialize for DistributionReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DistributionReport::NoData => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("message", NO_DATA_MESSAGE)?;
                map.end()
            }
            DistributionReport::Distribution { percentages, .. } => percentages.serialize(serializer),
        }
    }
}

/// Count rows per bucket and convert to percentages of the table total.
pub async fn calculate_distribution<S>(store: &mut S) -> Result<DistributionReport, AggregateError>
where
    S: UserStore + ?Sized,
{
    let total = store
        .count_users()
        .await
        .map_err(|source| AggregateError::Query { bucket: "total", source })?;

    if total == 0 {
        info!("{}", NO_DATA_MESSAGE);
        return Ok(DistributionReport::NoData);
    }

    let mut counts = [0i64; 4];
    for (count, bucket) in counts.iter_mut().zip(AGE_BUCKETS.iter()) {
        *count = store
            .count_in_age_range(bucket.min, bucket.max)
            .await
            .map_err(|source| AggregateError::Query { bucket: bucket.label, source })?;
    }

    info!("{} records in database", total);

    Ok(DistributionReport::Distribution {
        total,
        percentages: AgeDistribution {
            under_20: percent(counts[0], total),
            from_20_to_40: percent(counts[1], total),
            from_40_to_60: percent(counts[2], total),
            over_60: percent(counts[3], total),
        },
    })
}

/// `round(count / total * 100)`, halves rounding up.
fn percent(count: i64, total: i64) -> u32 {
    ((count as f64 / total as f64) * 100.0).round() as u32
}

/// Plain-text table for logs and the CLI.
pub fn render_report(report: &DistributionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "========= Age Distribution Report =========");
    let _ = writeln!(out, "Age-Group    % Distribution");
    let _ = writeln!(out, "-----------------------------");
    match report {
        DistributionReport::NoData => {
            let _ = writeln!(out, "{}", NO_DATA_MESSAGE);
        }
        DistributionReport::Distribution { percentages, .. } => {
            for (label, pct) in percentages.entries() {
                let _ = writeln!(out, "{:<12} {}", label, pct);
            }
        }
    }
    let _ = write!(out, "===========================================");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryUserStore;
    use async_trait::async_trait;
    use roster_core::PersistableRecord;
    use serde_json::json;

    async fn store_with_ages(ages: &[i32]) -> MemoryUserStore {
        let mut store = MemoryUserStore::new();
        for &age in ages {
            store
                .insert_user(&PersistableRecord {
                    name: "x".into(),
                    age,
                    address: None,
                    additional_info: None,
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn overlap_at_forty_is_double_counted() {
        let mut store = store_with_ages(&[10, 25, 40, 40, 65]).await;
        let report = calculate_distribution(&mut store).await.unwrap();

        assert_eq!(
            report,
            DistributionReport::Distribution {
                total: 5,
                percentages: AgeDistribution {
                    under_20: 20,
                    from_20_to_40: 60,
                    from_40_to_60: 40,
                    over_60: 20,
                },
            }
        );
    }

    #[tokio::test]
    async fn age_sixty_counts_in_forty_to_sixty() {
        let mut store = store_with_ages(&[60, 30]).await;
        let report = calculate_distribution(&mut store).await.unwrap();
        let DistributionReport::Distribution { percentages, .. } = report else {
            panic!("expected a distribution");
        };
        assert_eq!(percentages.from_40_to_60, 50);
        assert_eq!(percentages.over_60, 0);
        assert_eq!(percentages.from_20_to_40, 50);
    }

    #[tokio::test]
    async fn empty_table_is_no_data() {
        let mut store = MemoryUserStore::new();
        let report = calculate_distribution(&mut store).await.unwrap();
        assert_eq!(report, DistributionReport::NoData);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({ "message": "No users found in the database" })
        );
    }

    #[tokio::test]
    async fn percentages_round_half_up() {
        // 1/8 = 12.5% rounds to 13; 7/8 = 87.5% rounds to 88.
        let mut store = store_with_ages(&[5, 70, 70, 70, 70, 70, 70, 70]).await;
        let report = calculate_distribution(&mut store).await.unwrap();
        let DistributionReport::Distribution { percentages, .. } = report else {
            panic!("expected a distribution");
        };
        assert_eq!(percentages.under_20, 13);
        assert_eq!(percentages.over_60, 88);
    }

    #[tokio::test]
    async fn distribution_serializes_with_bucket_labels() {
        let mut store = store_with_ages(&[10, 25, 40, 40, 65]).await;
        let report = calculate_distribution(&mut store).await.unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value, json!({ "< 20": 20, "20 to 40": 60, "40 to 60": 40, "> 60": 20 }));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["< 20", "20 to 40", "40 to 60", "> 60"]);
    }

    struct BrokenCounts;

    #[async_trait]
    impl UserStore for BrokenCounts {
        async fn begin(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
        async fn insert_user(&mut self, _: &PersistableRecord) -> Result<(), StoreError> {
            Ok(())
        }
        async fn commit(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
        async fn rollback(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
        async fn count_users(&mut self) -> Result<i64, StoreError> {
            Ok(3)
        }
        async fn count_in_age_range(&mut self, min: i32, _: i32) -> Result<i64, StoreError> {
            if min == 40 {
                return Err(StoreError::Other("connection reset".into()));
            }
            Ok(1)
        }
    }

    #[tokio::test]
    async fn query_failure_names_the_bucket() {
        let err = calculate_distribution(&mut BrokenCounts).await.unwrap_err();
        let AggregateError::Query { bucket, .. } = err;
        assert_eq!(bucket, "40 to 60");
    }

    #[test]
    fn report_table_layout() {
        let report = DistributionReport::Distribution {
            total: 5,
            percentages: AgeDistribution {
                under_20: 20,
                from_20_to_40: 40,
                from_40_to_60: 40,
                over_60: 20,
            },
        };
        let text = render_report(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "========= Age Distribution Report =========");
        assert_eq!(lines[3], "< 20         20");
        assert_eq!(lines[4], "20 to 40     40");
        assert_eq!(lines[6], "> 60         20");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn no_data_report() {
        let text = render_report(&DistributionReport::NoData);
        assert!(text.contains(NO_DATA_MESSAGE));
    }
}
