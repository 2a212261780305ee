use chrono::{NaiveDate, NaiveDateTime, Duration};
use itertools::Itertools;
use rand::{Rng, SeedableRng, rngs::StdRng};
use sea_orm::prelude::Uuid;

use crate::domain::{
    case::{Case, ScoreFormula},
    event::{Event, Match, Round, Team},
    result::{AgreementValue, NegotiationResult, ResultKey, ResultState, Survey, SurveyField},
};


#[derive(Debug)]
pub struct MockOption {
    pub deterministic_uuids: bool,
    pub num_matches: u32,
    pub num_rounds: u32,
    pub members_per_team: u32,
    /// Fraction of teams that report no deal
    pub no_deal_rate: f64,
    pub with_surveys: bool,
    pub seed: u64,
}

impl Default for MockOption {
    fn default() -> Self {
        Self {
            deterministic_uuids: false,
            num_matches: 6,
            num_rounds: 2,
            members_per_team: 2,
            no_deal_rate: 0.2,
            with_surveys: true,
            seed: 0,
        }
    }
}

pub struct MockEvent {
    pub event: Event,
    pub case: Case,
    pub results: Vec<NegotiationResult>,
}

fn mock_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

pub fn make_mock_event() -> MockEvent {
    make_mock_event_with_options(Default::default())
}

pub fn make_mock_event_with_options(options: MockOption) -> MockEvent {
    /*
    Event: 1
    Case: 50
    Teams: 1000
    Participants: 2000
    */
    let uuid = |deterministic: u128| if options.deterministic_uuids { Uuid::from_u128(deterministic) } else { Uuid::new_v4() };
    let mut rng = StdRng::seed_from_u64(options.seed);
    let event_id = uuid(1);

    let case = Case {
        uuid: uuid(50),
        name: "Used car".into(),
        score_formula_a: ScoreFormula::new("1*price - 500*delivery"),
        score_formula_b: ScoreFormula::new("-1*price + 300*delivery + 1000"),
        relation_ratio: [30.0, 30.0],
        agree_match: true,
        scorable: true,
    };

    let teams = (0..options.num_matches * 2).map(|i| {
        let members = (0..options.members_per_team).map(|m| uuid(2000 + i as u128 * 10 + m as u128)).collect_vec();
        Team {
            uuid: uuid(1000 + i as u128),
            name: format!("Team {}", i),
            members,
        }
    }).collect_vec();

    let start = mock_time();
    let rounds = (0..options.num_rounds).map(|r| {
        let n = teams.len();
        let matches = (0..options.num_matches as usize).map(|m| {
            // Rotate side B so teams meet new opponents every round
            let b = options.num_matches as usize + (m + r as usize) % options.num_matches.max(1) as usize;
            Match::between_teams(teams[m].uuid, teams[b.min(n - 1)].uuid)
        }).collect_vec();
        Round {
            index: r + 1,
            case_id: case.uuid,
            end_time: Some(start + Duration::hours(r as i64 + 1)),
            matches,
        }
    }).collect_vec();

    let mut results = vec![];
    for round in rounds.iter() {
        for m in round.matches.iter() {
            let made_deal = !rng.gen_bool(options.no_deal_rate.clamp(0.0, 1.0));
            let price = rng.gen_range(8000..12000) as f64;
            let delivery = rng.gen_range(1..5) as f64;

            for team_id in [m.side_a.team(), m.side_b.team()].into_iter().flatten() {
                let mut result = NegotiationResult::new(
                    ResultKey::new(event_id, round.index, team_id),
                    case.uuid,
                    start + Duration::minutes(rng.gen_range(0..60)),
                );
                if made_deal {
                    result.agreement.insert("price".into(), AgreementValue::Number(price));
                    result.agreement.insert("delivery".into(), AgreementValue::Number(delivery));
                    result.state = ResultState::Final { made_deal: Some(true) };
                }
                else {
                    result.state = ResultState::Final { made_deal: Some(false) };
                }
                if options.with_surveys {
                    result.survey = Survey::from_answers(
                        SurveyField::ALL.iter().map(|f| (*f, rng.gen_range(1..8) as f64)).collect_vec()
                    );
                }
                if let Some(team) = teams.iter().find(|t| t.uuid == team_id) {
                    result.participants = team.members.iter().cloned().collect();
                }
                results.push(result);
            }
        }
    }

    let participants = teams.iter().flat_map(|t| t.members.iter().cloned()).collect_vec();
    let event = Event {
        uuid: event_id,
        name: "Mock Event".into(),
        rounds,
        teams,
        participants,
    };

    MockEvent { event, case, results }
}
