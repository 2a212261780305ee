use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::domain::{event::Side, result::Agreement};


pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn population_stdev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Standard score of `x`. Missing inputs and a zero spread yield 0.
pub fn z_score(x: Option<f64>, mean: Option<f64>, stdev: Option<f64>) -> f64 {
    match (x, mean, stdev) {
        (Some(x), Some(mean), Some(stdev)) if stdev != 0.0 => {
            let z = (x - mean) / stdev;
            if z.is_finite() { z } else { 0.0 }
        },
        _ => 0.0,
    }
}

/// `weight_percent` of `b` and the remainder of `a`.
pub fn weighted_avg(a: f64, b: f64, weight_percent: f64) -> f64 {
    let weight = weight_percent / 100.0;
    a * (1.0 - weight) + b * weight
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    pub values: Vec<f64>,
    pub mean: Option<f64>,
    pub stdev: Option<f64>,
}

impl CohortStats {
    pub fn from_values(values: Vec<f64>) -> Self {
        let mean = mean(&values);
        let stdev = population_stdev(&values);
        CohortStats { values, mean, stdev }
    }

    pub fn z(&self, x: Option<f64>) -> f64 {
        z_score(x, self.mean, self.stdev)
    }
}

/// Spread of one side's scores in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    pub round: u32,
    pub side: Side,
    /// `process_and_relationship` of every entry with a usable survey
    pub survey: CohortStats,
    /// Agreement scores of every non-disqualified entry that has one
    pub agreement: CohortStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
}

/// Observed numeric range of every agreement parameter. Text values are skipped.
pub fn parameter_ranges<'a, I>(agreements: I) -> BTreeMap<String, ParameterRange> where I: IntoIterator<Item = &'a Agreement> {
    let mut ranges: BTreeMap<String, ParameterRange> = BTreeMap::new();
    for agreement in agreements {
        for (key, value) in agreement.iter() {
            let value = match value.as_number() {
                Some(value) => value,
                None => continue,
            };
            ranges.entry(key.clone())
                .and_modify(|r| {
                    r.min = r.min.min(value);
                    r.max = r.max.max(value);
                })
                .or_insert(ParameterRange { min: value, max: value });
        }
    }
    ranges
}
