use std::collections::{BTreeMap, HashMap};

use sea_orm::prelude::Uuid;
use serde::{Serialize, Deserialize};

use crate::domain::{case::Case, event::{Event, MatchParty, Side}, result::NegotiationResult};
use crate::services::ScoreEvaluator;
use crate::ResultError;

pub mod survey;
pub mod stats;
pub mod ranking;

pub use survey::SurveyComposite;
pub use stats::{CohortStats, ParameterRange, RoundStats};
pub use ranking::{RankClass, RankInput};


/// A result together with its derived scores and its rank within its round and side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedResult {
    #[serde(flatten)]
    pub result: NegotiationResult,
    pub side: Option<Side>,
    pub opponent: Option<MatchParty>,
    pub survey_scores: SurveyComposite,
    pub has_svi: bool,
    pub agreement_score: Option<f64>,
    pub agreement_z_score: f64,
    pub pr_z_score: f64,
    /// The opponent's process and relationship z-score
    pub rel_score: Option<f64>,
    pub total_z_score: f64,
    pub no_enemy_svi: bool,
    pub rank: Option<u32>,
}

impl EnrichedResult {
    fn rank_class(&self) -> RankClass {
        if self.result.is_disqualified() {
            RankClass::Disqualified
        }
        else if !self.result.has_deal() {
            RankClass::NoDeal
        }
        else if self.has_svi {
            RankClass::Scored
        }
        else {
            RankClass::DealWithoutSurvey
        }
    }
}

fn enrich(result: NegotiationResult, event: &Event, case: &Case, evaluator: &dyn ScoreEvaluator) -> EnrichedResult {
    let position = event.round(result.round).and_then(|r| r.position_of(result.team_id));
    let survey_scores = SurveyComposite::from_survey(&result.survey);

    let agreement_score = match position {
        Some(position) if case.scorable && !result.agreement.is_empty() && !result.is_disqualified() => {
            Some(evaluator.evaluate(case.formula_for(position.side), &result.agreement))
        },
        _ => None,
    };

    EnrichedResult {
        side: position.map(|p| p.side),
        opponent: position.map(|p| p.opponent),
        has_svi: survey_scores.has_svi(),
        survey_scores,
        agreement_score,
        agreement_z_score: 0.0,
        pr_z_score: 0.0,
        rel_score: None,
        total_z_score: 0.0,
        no_enemy_svi: true,
        rank: None,
        result,
    }
}

fn round_stats(round: u32, side: Side, members: &[&EnrichedResult]) -> RoundStats {
    let survey = members.iter()
        .filter(|e| e.has_svi)
        .filter_map(|e| e.survey_scores.process_and_relationship)
        .collect();
    let agreement = members.iter()
        .filter(|e| !e.result.is_disqualified())
        .filter_map(|e| e.agreement_score)
        .collect();

    RoundStats {
        round,
        side,
        survey: CohortStats::from_values(survey),
        agreement: CohortStats::from_values(agreement),
    }
}

/// Scores and ranks results per round and side.
///
/// Output is grouped by round, then side A before side B, each group in ranking order.
/// Results whose team is not drawn in their round come last in their round, unranked.
pub fn rank_results(
    results: Vec<NegotiationResult>,
    event: &Event,
    cases: &HashMap<Uuid, Case>,
    evaluator: &dyn ScoreEvaluator,
) -> Result<Vec<EnrichedResult>, ResultError> {
    let mut weights = Vec::with_capacity(results.len());
    let mut entries = results.into_iter().map(|result| {
        let case = cases.get(&result.case_id).ok_or(ResultError::CaseNotFound(result.case_id))?;
        let entry = enrich(result, event, case, evaluator);
        weights.push(entry.side.map(|side| case.relation_weight(side)).unwrap_or(0.0));
        Ok(entry)
    }).collect::<Result<Vec<_>, ResultError>>()?;

    let mut groups: BTreeMap<(u32, usize), Vec<usize>> = BTreeMap::new();
    for (idx, entry) in entries.iter().enumerate() {
        let side_key = entry.side.map(|s| s.index()).unwrap_or(2);
        groups.entry((entry.result.round, side_key)).or_default().push(idx);
    }

    for ((round, _), members) in groups.iter() {
        let side = match entries[members[0]].side {
            Some(side) => side,
            None => continue,
        };
        let stats = round_stats(*round, side, &members.iter().map(|i| &entries[*i]).collect::<Vec<_>>());
        for idx in members {
            let entry = &mut entries[*idx];
            entry.pr_z_score = if entry.has_svi {
                stats.survey.z(entry.survey_scores.process_and_relationship)
            } else {
                0.0
            };
            entry.agreement_z_score = if entry.result.is_disqualified() {
                0.0
            } else {
                stats.agreement.z(entry.agreement_score)
            };
        }
    }

    let by_team = entries.iter().enumerate()
        .map(|(idx, e)| ((e.result.round, e.result.team_id), idx))
        .collect::<HashMap<_, _>>();

    for idx in 0..entries.len() {
        let enemy = match entries[idx].opponent {
            Some(MatchParty::Team(team)) => by_team.get(&(entries[idx].result.round, team)).map(|j| &entries[*j]),
            _ => None,
        };
        let rel_score = enemy.filter(|e| e.has_svi).map(|e| e.pr_z_score);

        let entry = &mut entries[idx];
        entry.rel_score = rel_score;
        match rel_score {
            Some(rel_score) => {
                entry.total_z_score = stats::weighted_avg(entry.agreement_z_score, rel_score, weights[idx]);
                entry.no_enemy_svi = false;
            },
            None => {
                entry.total_z_score = entry.agreement_z_score;
                entry.no_enemy_svi = true;
            }
        }
    }

    let mut slots = entries.into_iter().map(Some).collect::<Vec<_>>();
    let mut out = Vec::with_capacity(slots.len());
    for ((_, side_key), members) in groups {
        let order = if side_key < 2 {
            let inputs = members.iter().filter_map(|i| slots[*i].as_ref()).map(|e| RankInput {
                class: e.rank_class(),
                total_z_score: e.total_z_score,
            }).collect::<Vec<_>>();
            ranking::rank_cohort(&inputs).into_iter().map(|(pos, rank)| (members[pos], rank)).collect::<Vec<_>>()
        }
        else {
            members.into_iter().map(|idx| (idx, None)).collect()
        };

        for (idx, rank) in order {
            if let Some(mut entry) = slots[idx].take() {
                entry.rank = rank;
                out.push(entry);
            }
        }
    }

    Ok(out)
}


#[cfg(test)]
mod test {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::domain::{case::ScoreFormula, event::{Match, Round}, result::{AgreementValue, ResultKey, ResultState, Survey, SurveyField, Agreement}};

    /// Scores an agreement by the value of its `points` parameter.
    struct PointsEvaluator;

    impl ScoreEvaluator for PointsEvaluator {
        fn evaluate(&self, _formula: &ScoreFormula, agreement: &Agreement) -> f64 {
            agreement.get("points").and_then(|v| v.as_number()).unwrap_or(0.0)
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn case(relation_ratio: [f64; 2]) -> Case {
        Case {
            uuid: Uuid::from_u128(50),
            name: "Case".into(),
            score_formula_a: ScoreFormula::new("1*points"),
            score_formula_b: ScoreFormula::new("1*points"),
            relation_ratio,
            agree_match: false,
            scorable: true,
        }
    }

    fn cases(relation_ratio: [f64; 2]) -> HashMap<Uuid, Case> {
        HashMap::from([(Uuid::from_u128(50), case(relation_ratio))])
    }

    /// Teams 1000..1000+n play side A against 2000..2000+n on side B.
    fn event(n: u128) -> Event {
        Event {
            uuid: Uuid::from_u128(1),
            name: "Event".into(),
            rounds: vec![Round {
                index: 1,
                case_id: Uuid::from_u128(50),
                end_time: None,
                matches: (0..n).map(|i| Match::between_teams(Uuid::from_u128(1000 + i), Uuid::from_u128(2000 + i))).collect(),
            }],
            teams: vec![],
            participants: vec![],
        }
    }

    fn result(team: u128, points: Option<f64>, pr: Option<f64>) -> NegotiationResult {
        let mut result = NegotiationResult::new(ResultKey::new(Uuid::from_u128(1), 1, Uuid::from_u128(team)), Uuid::from_u128(50), now());
        if let Some(points) = points {
            result.agreement.insert("points".into(), AgreementValue::Number(points));
            result.state = ResultState::Deal;
        }
        if let Some(pr) = pr {
            result.survey = Survey::from_answers(vec![(SurveyField::Listened, pr), (SurveyField::Trust, pr)]);
        }
        result
    }

    fn find(results: &[EnrichedResult], team: u128) -> &EnrichedResult {
        results.iter().find(|r| r.result.team_id == Uuid::from_u128(team)).unwrap()
    }

    #[test]
    fn test_agreement_z_scores_have_zero_mean_per_side() {
        let results = vec![
            result(1000, Some(10.0), Some(4.0)),
            result(1001, Some(20.0), Some(5.0)),
            result(1002, Some(60.0), Some(6.0)),
            result(2000, Some(3.0), Some(1.0)),
            result(2001, Some(3.5), Some(2.0)),
            result(2002, Some(1.0), Some(7.0)),
        ];
        let ranked = rank_results(results, &event(3), &cases([0.0, 0.0]), &PointsEvaluator).unwrap();

        for side in [Side::A, Side::B] {
            let cohort = ranked.iter().filter(|r| r.side == Some(side)).collect::<Vec<_>>();
            assert_eq!(cohort.len(), 3);
            let total: f64 = cohort.iter().map(|r| r.agreement_z_score).sum();
            assert!(total.abs() < 1e-9);
            let pr_total: f64 = cohort.iter().map(|r| r.pr_z_score).sum();
            assert!(pr_total.abs() < 1e-9);
        }
    }

    #[test]
    fn test_output_grouped_by_side_in_rank_order() {
        let results = vec![
            result(2000, Some(1.0), Some(4.0)),
            result(1000, Some(10.0), Some(4.0)),
            result(1001, Some(30.0), Some(4.0)),
            result(2001, Some(5.0), Some(4.0)),
        ];
        let ranked = rank_results(results, &event(2), &cases([0.0, 0.0]), &PointsEvaluator).unwrap();

        let order = ranked.iter().map(|r| (r.result.team_id, r.rank)).collect::<Vec<_>>();
        assert_eq!(order, vec![
            (Uuid::from_u128(1001), Some(1)),
            (Uuid::from_u128(1000), Some(2)),
            (Uuid::from_u128(2001), Some(1)),
            (Uuid::from_u128(2000), Some(2)),
        ]);
    }

    #[test]
    fn test_relationship_weight_uses_opponent_rating() {
        let results = vec![
            result(1000, Some(10.0), Some(1.0)),
            result(1001, Some(10.0), Some(1.0)),
            result(2000, Some(10.0), Some(7.0)),
            result(2001, Some(10.0), Some(1.0)),
        ];
        let ranked = rank_results(results, &event(2), &cases([50.0, 0.0]), &PointsEvaluator).unwrap();

        let a0 = find(&ranked, 1000);
        let b0 = find(&ranked, 2000);
        assert_eq!(a0.rel_score, Some(b0.pr_z_score));
        assert!(!a0.no_enemy_svi);
        assert!((a0.total_z_score - 0.5 * b0.pr_z_score).abs() < 1e-9);
        assert_eq!(a0.rank, Some(1));
        assert_eq!(find(&ranked, 1001).rank, Some(2));
    }

    #[test]
    fn test_missing_enemy_survey_falls_back_to_agreement_score() {
        let results = vec![
            result(1000, Some(10.0), Some(3.0)),
            result(1001, Some(20.0), Some(3.0)),
            result(2000, Some(10.0), None),
            result(2001, Some(20.0), Some(5.0)),
        ];
        let ranked = rank_results(results, &event(2), &cases([50.0, 50.0]), &PointsEvaluator).unwrap();

        let a0 = find(&ranked, 1000);
        assert!(a0.no_enemy_svi);
        assert_eq!(a0.rel_score, None);
        assert_eq!(a0.total_z_score, a0.agreement_z_score);
        assert!(!find(&ranked, 1001).no_enemy_svi);
    }

    #[test]
    fn test_deal_without_survey_ranks_after_scored_entries() {
        let results = vec![
            result(1000, Some(10.0), Some(3.0)),
            result(1001, Some(20.0), Some(3.0)),
            result(1002, Some(90.0), None),
            result(1003, None, Some(3.0)),
        ];
        let ranked = rank_results(results, &event(4), &cases([0.0, 0.0]), &PointsEvaluator).unwrap();

        assert_eq!(find(&ranked, 1001).rank, Some(1));
        assert_eq!(find(&ranked, 1000).rank, Some(2));
        assert_eq!(find(&ranked, 1002).rank, Some(3));
        assert_eq!(find(&ranked, 1003).rank, None);
    }

    #[test]
    fn test_disqualified_rank_last() {
        let mut no_show = result(1002, None, None);
        no_show.state = ResultState::Disqualified;
        let results = vec![
            no_show,
            result(1000, Some(10.0), Some(3.0)),
            result(1001, Some(20.0), Some(3.0)),
        ];
        let ranked = rank_results(results, &event(3), &cases([0.0, 0.0]), &PointsEvaluator).unwrap();

        let side_a = ranked.iter().filter(|r| r.side == Some(Side::A)).collect::<Vec<_>>();
        assert_eq!(side_a.last().map(|r| r.result.team_id), Some(Uuid::from_u128(1002)));
        assert_eq!(side_a.last().and_then(|r| r.rank), Some(3));
        assert_eq!(side_a.last().and_then(|r| r.agreement_score), None);
    }

    #[test]
    fn test_missing_case_is_an_error() {
        let results = vec![result(1000, Some(10.0), None)];
        let err = rank_results(results, &event(1), &HashMap::new(), &PointsEvaluator).unwrap_err();
        assert!(matches!(err, ResultError::CaseNotFound(id) if id == Uuid::from_u128(50)));
    }
}
