use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Destination for per-beat timing measurements.
pub trait TimingSink {
    fn record(&mut self, action: &str, planned: f64, actual: f64);
}

/// Planned versus actual run-time of one beat, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub action: String,
    pub planned: f64,
    pub actual: f64,
}

impl TimingRecord {
    pub fn delta(&self) -> f64 {
        self.actual - self.planned
    }
}

/// In-memory [`TimingSink`] with CSV and JSON export.
#[derive(Debug, Clone, Default)]
pub struct TimingTracker {
    records: Vec<TimingRecord>,
}

impl TimingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[TimingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_planned(&self) -> f64 {
        self.records.iter().map(|r| r.planned).sum()
    }

    pub fn total_actual(&self) -> f64 {
        self.records.iter().map(|r| r.actual).sum()
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("action,planned,actual,delta\n");
        for record in &self.records {
            out.push_str(&format!(
                "{},{:.3},{:.3},{:.3}\n",
                csv_field(&record.action),
                record.planned,
                record.actual,
                record.delta()
            ));
        }
        out
    }

    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }

    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl TimingSink for TimingTracker {
    fn record(&mut self, action: &str, planned: f64, actual: f64) {
        self.records.push(TimingRecord {
            action: action.to_string(),
            planned,
            actual,
        });
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
