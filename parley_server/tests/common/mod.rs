use std::{borrow::BorrowMut, time::Duration};

use axum::{response::Response, http::{Request, request::Builder}, body::Body};
use chrono::Duration as ChronoDuration;
use http_body::Body as _;
use parley_entities::{prelude::*, services::StaticCatalog, Uuid};
use parley_server::state::AppState;
use tower::Service;


pub const EVENT_ID: u128 = 1;
pub const CASE_ID: u128 = 50;

/// Round 1 is open, round 2 closed a day ago.
///
/// Round 1: 1000 vs 1001, 1002 vs 1003. Round 2: 1000 vs 1002, 1001 vs AI.
/// Team 1000 has members 2000 and 2001.
pub fn test_catalog() -> StaticCatalog {
    let now = chrono::Utc::now().naive_utc();
    let team = |id: u128, members: Vec<u128>| Team {
        uuid: Uuid::from_u128(id),
        name: format!("Team {}", id),
        members: members.into_iter().map(Uuid::from_u128).collect(),
    };

    let event = Event {
        uuid: Uuid::from_u128(EVENT_ID),
        name: "Test Event".into(),
        rounds: vec![
            Round {
                index: 1,
                case_id: Uuid::from_u128(CASE_ID),
                end_time: Some(now + ChronoDuration::days(1)),
                matches: vec![
                    Match::between_teams(Uuid::from_u128(1000), Uuid::from_u128(1001)),
                    Match::between_teams(Uuid::from_u128(1002), Uuid::from_u128(1003)),
                ],
            },
            Round {
                index: 2,
                case_id: Uuid::from_u128(CASE_ID),
                end_time: Some(now - ChronoDuration::days(1)),
                matches: vec![
                    Match::between_teams(Uuid::from_u128(1000), Uuid::from_u128(1002)),
                    Match::new(MatchParty::Team(Uuid::from_u128(1001)), MatchParty::Ai),
                ],
            },
        ],
        teams: vec![
            team(1000, vec![2000, 2001]),
            team(1001, vec![2010]),
            team(1002, vec![2020]),
            team(1003, vec![2030]),
        ],
        participants: vec![],
    };

    let case = Case {
        uuid: Uuid::from_u128(CASE_ID),
        name: "Used car".into(),
        score_formula_a: ScoreFormula::new("1*price"),
        score_formula_b: ScoreFormula::new("-1*price + 200"),
        relation_ratio: [20.0, 20.0],
        agree_match: true,
        scorable: true,
    };

    StaticCatalog::new(vec![event], vec![case])
}

pub struct Fixture {
    pub app: axum::Router,
}

pub struct APIResponse {
    response: Response,
    buffer: String,
}

impl APIResponse {
    pub fn status(&self) -> axum::http::StatusCode {
        self.response.status()
    }

    pub async fn json<T: serde::de::DeserializeOwned>(&mut self) -> T {
        let mut buf = Vec::new();

        let body = self.response.body_mut();

        while let Some(next) = body.data().await {
            buf.extend_from_slice(&next.unwrap());
        }
        serde_json::from_slice(&buf).unwrap()
    }

    /// Reads a streaming body until `needle` shows up, returning everything read so far.
    #[allow(dead_code)]
    pub async fn read_until(&mut self, needle: &str, timeout: Duration) -> Option<String> {
        let body = self.response.body_mut();
        let buffer = &mut self.buffer;

        let found = tokio::time::timeout(timeout, async {
            while !buffer.contains(needle) {
                match body.data().await {
                    Some(Ok(chunk)) => buffer.push_str(&String::from_utf8_lossy(&chunk)),
                    _ => return false,
                }
            }
            true
        }).await.unwrap_or(false);

        if found { Some(self.buffer.clone()) } else { None }
    }
}

impl From<Response> for APIResponse {
    fn from(response: Response) -> Self {
        Self {
            response,
            buffer: String::new(),
        }
    }
}

impl Fixture {
    pub async fn new() -> Self {
        Self::new_with_catalog(test_catalog()).await
    }

    pub async fn new_with_catalog(catalog: StaticCatalog) -> Self {
        let app = parley_server::app_with_state(AppState::new_test_app(catalog).await).await;
        Self { app }
    }

    fn get_base_request(&self) -> Builder {
        Request::builder()
    }

    #[allow(dead_code)]
    pub async fn get(&mut self, path: &str) -> APIResponse {
        let request = self.get_base_request()
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.app.borrow_mut()
            .call(request)
            .await
            .unwrap().into()
    }

    #[allow(dead_code)]
    pub async fn post_json<T>(&mut self, path: &str, body: T) -> APIResponse where T: serde::Serialize
    {
        let request = self.get_base_request()
            .method("POST")
            .header("Content-Type", "application/json")
            .uri(path)
            .body(
                Body::from(
                    serde_json::to_string(&body).unwrap()
                )
            )
            .unwrap();
        self.app.borrow_mut()
            .call(request)
            .await
            .unwrap().into()
    }

    /// Submits a result for round `round` on behalf of `participant` and returns the result id.
    #[allow(dead_code)]
    pub async fn submit(&mut self, participant: u128, round: u32, price: Option<&str>, made_deal: Option<bool>) -> Uuid {
        let request = parley_server::results::SaveResultRequest {
            participant_id: Uuid::from_u128(participant),
            overwrite: false,
            result: Submission {
                agreement: price.map(|p| RawValues::from([("price".to_string(), AgreementValue::Text(p.to_string()))])).into(),
                made_deal: made_deal.into(),
                ..Submission::for_round(round)
            },
        };
        let mut response = self.post_json(&format!("/api/events/{}/results", Uuid::from_u128(EVENT_ID)), request).await;
        assert_eq!(response.status(), 200);
        response.json::<parley_server::results::SaveResultResponse>().await.result_id
    }

    #[allow(dead_code)]
    pub async fn results(&mut self, round: u32) -> Vec<EnrichedResult> {
        let mut response = self.get(&format!("/api/events/{}/results?round={}", Uuid::from_u128(EVENT_ID), round)).await;
        assert_eq!(response.status(), 200);
        response.json().await
    }
}

#[allow(dead_code)]
pub fn find(results: &[EnrichedResult], team: u128) -> &EnrichedResult {
    results.iter().find(|r| r.result.team_id == Uuid::from_u128(team)).expect("team missing from results")
}
