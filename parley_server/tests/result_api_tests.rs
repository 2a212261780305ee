mod common;

use assert_matches::assert_matches;
use parley_entities::{prelude::*, Uuid};
use parley_server::{results::SaveResultRequest, service::ResultRange};
use tracing_test::traced_test;

use crate::common::{find, Fixture, EVENT_ID, CASE_ID};


#[tokio::test]
#[traced_test]
async fn test_save_by_member_is_stored_for_team() {
    let mut fixture = Fixture::new().await;

    let result_id = fixture.submit(2000, 1, Some("100"), Some(true)).await;
    assert_eq!(result_id, ResultKey::new(Uuid::from_u128(EVENT_ID), 1, Uuid::from_u128(1000)).result_id());

    let results = fixture.results(1).await;
    assert_eq!(results.len(), 4);

    let own = find(&results, 1000);
    assert_eq!(own.result.agreement.get("price"), Some(&AgreementValue::Number(100.0)));
    assert_eq!(own.result.state, ResultState::Deal);
    assert!(own.result.participants.contains(&Uuid::from_u128(2000)));
    assert_eq!(own.side, Some(Side::A));
    assert_eq!(own.agreement_score, Some(100.0));
}

#[tokio::test]
#[traced_test]
async fn test_repeated_saves_merge_into_one_record() {
    let mut fixture = Fixture::new().await;

    let first = fixture.submit(2000, 1, Some("100"), Some(true)).await;
    let second = fixture.submit(2001, 1, None, Some(true)).await;
    assert_eq!(first, second);

    let results = fixture.results(1).await;
    let own = find(&results, 1000);
    assert_eq!(own.result.agreement.get("price"), Some(&AgreementValue::Number(100.0)));
    assert_eq!(own.result.participants.len(), 2);
    assert_eq!(results.iter().filter(|r| r.result.team_id == Uuid::from_u128(1000)).count(), 1);
}

#[tokio::test]
#[traced_test]
async fn test_no_deal_clears_agreement() {
    let mut fixture = Fixture::new().await;

    fixture.submit(1000, 1, Some("100"), Some(true)).await;
    fixture.submit(1000, 1, Some("120"), Some(false)).await;

    let results = fixture.results(1).await;
    let own = find(&results, 1000);
    assert!(own.result.agreement.is_empty());
    assert_eq!(own.result.made_deal(), Some(false));
    assert_eq!(own.rank, None);
}

#[tokio::test]
#[traced_test]
async fn test_open_round_no_shows_are_pending() {
    let mut fixture = Fixture::new().await;
    fixture.submit(1000, 1, Some("100"), Some(true)).await;

    let results = fixture.results(1).await;
    for team in [1001, 1002, 1003] {
        let no_show = find(&results, team);
        assert!(no_show.result.pending);
        assert!(!no_show.result.is_disqualified());
    }
}

#[tokio::test]
#[traced_test]
async fn test_closed_round_no_shows_are_disqualified() {
    let mut fixture = Fixture::new().await;

    let results = fixture.results(2).await;
    assert_eq!(results.len(), 3);
    for team in [1000, 1001, 1002] {
        let no_show = find(&results, team);
        assert!(no_show.result.is_disqualified());
        assert!(!no_show.result.pending);
    }
    assert!(results.iter().all(|r| r.result.team_id != Uuid::from_u128(1003)));

    let request = SaveResultRequest {
        participant_id: Uuid::from_u128(1000),
        overwrite: false,
        result: Submission {
            is_final: Patch::Value(true),
            ..Submission::for_round(2)
        },
    };
    let response = fixture.post_json(&format!("/api/events/{}/results", Uuid::from_u128(EVENT_ID)), request).await;
    assert_eq!(response.status(), 200);

    let results = fixture.results(2).await;
    let late = find(&results, 1000);
    assert!(late.result.is_disqualified());
    assert!(late.rank.is_some());
}

#[tokio::test]
#[traced_test]
async fn test_closed_round_needs_overwrite() {
    let mut fixture = Fixture::new().await;

    fixture.submit(1000, 2, Some("100"), Some(true)).await;
    let results = fixture.results(2).await;
    assert!(find(&results, 1000).result.agreement.is_empty());
    assert!(find(&results, 1000).result.is_disqualified());

    let request = SaveResultRequest {
        participant_id: Uuid::from_u128(1000),
        overwrite: true,
        result: Submission {
            agreement: Patch::Value(RawValues::from([("price".to_string(), AgreementValue::Number(80.0))])),
            made_deal: Patch::Value(true),
            ..Submission::for_round(2)
        },
    };
    let response = fixture.post_json(&format!("/api/events/{}/results", Uuid::from_u128(EVENT_ID)), request).await;
    assert_eq!(response.status(), 200);

    let results = fixture.results(2).await;
    let own = find(&results, 1000);
    assert_eq!(own.result.agreement.get("price"), Some(&AgreementValue::Number(80.0)));
    assert!(!own.result.is_disqualified());
}

#[tokio::test]
#[traced_test]
async fn test_unknown_event_and_team_are_not_found() {
    let mut fixture = Fixture::new().await;

    let response = fixture.get(&format!("/api/events/{}/results", Uuid::from_u128(99))).await;
    assert_eq!(response.status(), 404);

    let request = SaveResultRequest {
        participant_id: Uuid::from_u128(4242),
        overwrite: false,
        result: Submission::for_round(1),
    };
    let response = fixture.post_json(&format!("/api/events/{}/results", Uuid::from_u128(EVENT_ID)), request).await;
    assert_eq!(response.status(), 404);

    let response = fixture.get(&format!("/api/events/{}/results?round=7", Uuid::from_u128(EVENT_ID))).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_check_conflict() {
    let mut fixture = Fixture::new().await;
    let path = format!("/api/events/{}/rounds/1/teams/{}/conflict", Uuid::from_u128(EVENT_ID), Uuid::from_u128(1000));

    fixture.submit(1000, 1, Some("100"), Some(true)).await;
    let mut response = fixture.get(&path).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.json::<Option<AgreementConflict>>().await, None);

    fixture.submit(1001, 1, Some("90"), Some(true)).await;
    let mut response = fixture.get(&path).await;
    let conflict = response.json::<Option<AgreementConflict>>().await.unwrap();
    assert_matches!(conflict.conflict_type, ConflictType::ValueMismatch);
    assert_eq!(conflict.enemy_team, Uuid::from_u128(1001));
    assert_eq!(conflict.mismatched_parameters, vec!["price".to_string()]);

    fixture.submit(1001, 1, Some("100.0"), Some(true)).await;
    let mut response = fixture.get(&path).await;
    assert_eq!(response.json::<Option<AgreementConflict>>().await, None);
}

#[tokio::test]
#[traced_test]
async fn test_ranking_over_api() {
    let mut fixture = Fixture::new().await;

    fixture.submit(1000, 1, Some("150"), Some(true)).await;
    fixture.submit(1001, 1, Some("150"), Some(true)).await;
    fixture.submit(1002, 1, Some("100"), Some(true)).await;
    fixture.submit(1003, 1, Some("100"), Some(true)).await;

    let results = fixture.results(1).await;
    let order = results.iter().map(|r| (r.result.team_id, r.side)).collect::<Vec<_>>();
    assert_eq!(order, vec![
        (Uuid::from_u128(1000), Some(Side::A)),
        (Uuid::from_u128(1002), Some(Side::A)),
        (Uuid::from_u128(1003), Some(Side::B)),
        (Uuid::from_u128(1001), Some(Side::B)),
    ]);

    // Nobody filled in a survey, so every deal shares the rank after zero scored entries
    assert!(results.iter().all(|r| r.rank == Some(1)));
    assert!(results.iter().all(|r| r.no_enemy_svi));
}

#[tokio::test]
#[traced_test]
async fn test_result_range() {
    let mut fixture = Fixture::new().await;

    fixture.submit(1000, 1, Some("150"), Some(true)).await;
    fixture.submit(1002, 1, Some("90"), Some(true)).await;
    fixture.submit(1003, 1, None, Some(false)).await;

    let mut response = fixture.get(&format!("/api/cases/{}/results/range", Uuid::from_u128(CASE_ID))).await;
    assert_eq!(response.status(), 200);
    let range = response.json::<ResultRange>().await;
    assert_eq!(range.agreements.len(), 2);
    assert_eq!(range.parameters["price"].min, 90.0);
    assert_eq!(range.parameters["price"].max, 150.0);

    let response = fixture.get(&format!("/api/cases/{}/results/range", Uuid::from_u128(77))).await;
    assert_eq!(response.status(), 404);
}
