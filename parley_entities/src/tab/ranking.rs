use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde::{Serialize, Deserialize};


/// Ranking precedence inside one round and side, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankClass {
    Scored,
    DealWithoutSurvey,
    NoDeal,
    Disqualified,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankInput {
    pub class: RankClass,
    pub total_z_score: f64,
}

/// Orders a cohort and assigns ranks. Returns `(input index, rank)` in ranking order.
///
/// Scored entries get dense ranks by descending score. Deals without a survey all share
/// the rank after the number of scored entries, no-deals stay unranked and disqualified
/// entries come last.
pub fn rank_cohort(entries: &[RankInput]) -> Vec<(usize, Option<u32>)> {
    let mut order = (0..entries.len()).collect::<Vec<_>>();
    order.sort_by(|a, b| {
        let (a, b) = (&entries[*a], &entries[*b]);
        match a.class.cmp(&b.class) {
            Ordering::Equal => OrderedFloat(b.total_z_score).cmp(&OrderedFloat(a.total_z_score)),
            other => other,
        }
    });

    let num_scored = entries.iter().filter(|e| e.class == RankClass::Scored).count() as u32;

    let mut prev_val = None;
    let mut prev_rank = 0;
    let mut max_rank = 0;
    let mut out = Vec::with_capacity(order.len());
    for idx in order {
        let entry = &entries[idx];
        let rank = match entry.class {
            RankClass::Scored => {
                match prev_val {
                    Some(prev_val) if prev_val == entry.total_z_score => {},
                    _ => {
                        prev_rank += 1;
                    }
                }
                prev_val = Some(entry.total_z_score);
                Some(prev_rank)
            },
            RankClass::DealWithoutSurvey => Some(num_scored + 1),
            RankClass::NoDeal => None,
            RankClass::Disqualified => Some(max_rank + 1),
        };
        if entry.class != RankClass::Disqualified {
            max_rank = max_rank.max(rank.unwrap_or(0));
        }
        out.push((idx, rank));
    }
    out
}
