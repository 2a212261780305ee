use chrono::NaiveDateTime;
use sea_orm::prelude::Uuid;
use serde::{de::Error, Serialize, Deserialize, Deserializer};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn index(&self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// Written as `{ team: <uuid> }` or `ai`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchParty {
    Team(Uuid),
    Ai,
}

impl<'de> Deserialize<'de> for MatchParty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Team { team: Uuid },
            Named(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Team { team } => Ok(MatchParty::Team(team)),
            Repr::Named(name) if name == "ai" => Ok(MatchParty::Ai),
            Repr::Named(name) => Err(D::Error::custom(format!("unknown match party {}", name))),
        }
    }
}

impl MatchParty {
    pub fn team(&self) -> Option<Uuid> {
        match self {
            MatchParty::Team(team) => Some(*team),
            MatchParty::Ai => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub side_a: MatchParty,
    pub side_b: MatchParty,
}

impl Match {
    pub fn new(side_a: MatchParty, side_b: MatchParty) -> Self {
        Match { side_a, side_b }
    }

    pub fn between_teams(side_a: Uuid, side_b: Uuid) -> Self {
        Match { side_a: MatchParty::Team(side_a), side_b: MatchParty::Team(side_b) }
    }

    pub fn party(&self, side: Side) -> MatchParty {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPosition {
    pub side: Side,
    pub opponent: MatchParty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// 1-indexed
    pub index: u32,
    pub case_id: Uuid,
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub matches: Vec<Match>,
}

impl Round {
    pub fn has_ended(&self, now: NaiveDateTime) -> bool {
        self.end_time.map(|end| now >= end).unwrap_or(false)
    }

    pub fn position_of(&self, team_id: Uuid) -> Option<MatchPosition> {
        self.matches.iter().find_map(|m| {
            if m.side_a == MatchParty::Team(team_id) {
                Some(MatchPosition { side: Side::A, opponent: m.side_b })
            }
            else if m.side_b == MatchParty::Team(team_id) {
                Some(MatchPosition { side: Side::B, opponent: m.side_a })
            }
            else {
                None
            }
        })
    }

    /// Teams playing in this round, AI placeholders excluded, in match table order.
    pub fn active_teams(&self) -> Vec<(Uuid, Side)> {
        self.matches.iter().flat_map(|m| {
            [Side::A, Side::B].into_iter().filter_map(move |side| m.party(side).team().map(|team| (team, side)))
        }).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub members: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    pub rounds: Vec<Round>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub participants: Vec<Uuid>,
}

impl Event {
    pub fn round(&self, index: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.index == index)
    }

    /// Submissions may name either the team or one of its members.
    pub fn resolve_team(&self, participant_or_team: Uuid) -> Option<Uuid> {
        if self.teams.iter().any(|t| t.uuid == participant_or_team) {
            return Some(participant_or_team);
        }
        if let Some(team) = self.teams.iter().find(|t| t.members.contains(&participant_or_team)) {
            return Some(team.uuid);
        }
        // Solo participants against the AI play as their own team.
        let plays_alone = self.participants.contains(&participant_or_team)
            || self.rounds.iter().any(|r| r.position_of(participant_or_team).is_some());
        if plays_alone {
            Some(participant_or_team)
        }
        else {
            None
        }
    }

    pub fn team_name(&self, team_id: Uuid) -> Option<&str> {
        self.teams.iter().find(|t| t.uuid == team_id).map(|t| t.name.as_str())
    }

    pub fn round_indices(&self) -> Vec<u32> {
        let mut indices = self.rounds.iter().map(|r| r.index).collect::<Vec<_>>();
        indices.sort();
        indices
    }
}


#[cfg(test)]
mod test {
    use super::*;

    fn make_round() -> Round {
        Round {
            index: 1,
            case_id: Uuid::from_u128(50),
            end_time: None,
            matches: vec![
                Match::between_teams(Uuid::from_u128(1000), Uuid::from_u128(1001)),
                Match::new(MatchParty::Ai, MatchParty::Team(Uuid::from_u128(1002))),
            ]
        }
    }

    #[test]
    fn test_position_of_team() {
        let round = make_round();
        assert_eq!(round.position_of(Uuid::from_u128(1001)), Some(MatchPosition { side: Side::B, opponent: MatchParty::Team(Uuid::from_u128(1000)) }));
        assert_eq!(round.position_of(Uuid::from_u128(1002)), Some(MatchPosition { side: Side::B, opponent: MatchParty::Ai }));
        assert_eq!(round.position_of(Uuid::from_u128(1003)), None);
    }

    #[test]
    fn test_active_teams_skip_ai() {
        let round = make_round();
        assert_eq!(round.active_teams(), vec![
            (Uuid::from_u128(1000), Side::A),
            (Uuid::from_u128(1001), Side::B),
            (Uuid::from_u128(1002), Side::B),
        ]);
    }

    #[test]
    fn test_resolve_team_from_member() {
        let event = Event {
            uuid: Uuid::from_u128(1),
            name: "Test".into(),
            rounds: vec![make_round()],
            teams: vec![Team { uuid: Uuid::from_u128(1000), name: "A".into(), members: vec![Uuid::from_u128(2000)] }],
            participants: vec![Uuid::from_u128(2000)],
        };

        assert_eq!(event.resolve_team(Uuid::from_u128(2000)), Some(Uuid::from_u128(1000)));
        assert_eq!(event.resolve_team(Uuid::from_u128(1000)), Some(Uuid::from_u128(1000)));
        assert_eq!(event.resolve_team(Uuid::from_u128(1002)), Some(Uuid::from_u128(1002)));
        assert_eq!(event.resolve_team(Uuid::from_u128(9999)), None);
    }

    #[test]
    fn test_match_parties_read_from_catalog_form() {
        let m: Match = serde_json::from_str(r#"{"side_a": {"team": "00000000-0000-0000-0000-0000000003e8"}, "side_b": "ai"}"#).unwrap();
        assert_eq!(m, Match::new(MatchParty::Team(Uuid::from_u128(1000)), MatchParty::Ai));
        assert_eq!(serde_json::to_value(m.side_a).unwrap(), serde_json::json!({"team": "00000000-0000-0000-0000-0000000003e8"}));
        assert!(serde_json::from_str::<MatchParty>(r#""human""#).is_err());
    }
}
