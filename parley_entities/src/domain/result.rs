use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use sea_orm::prelude::Uuid;
use serde::{Serialize, Deserialize, Serializer, Deserializer};

/// Namespace for the deterministic ids of the (event, round, team) composite key.
const RESULT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x5d2c_9a61_3f0e_4b7a_8c11_0f6e_2a94_d3b7);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgreementValue {
    Number(f64),
    Text(String),
}

impl AgreementValue {
    /// Numeric-looking strings become numbers, everything else passes through.
    pub fn cleaned(&self) -> AgreementValue {
        match self {
            AgreementValue::Number(n) => AgreementValue::Number(*n),
            AgreementValue::Text(text) => match text.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => AgreementValue::Number(n),
                _ => AgreementValue::Text(text.clone()),
            },
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self.cleaned() {
            AgreementValue::Number(n) => Some(n),
            AgreementValue::Text(_) => None,
        }
    }
}

pub type RawValues = BTreeMap<String, AgreementValue>;
pub type Agreement = BTreeMap<String, AgreementValue>;

pub fn clean_values(raw: &RawValues) -> Agreement {
    raw.iter().map(|(key, value)| (key.clone(), value.cleaned())).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyField {
    Satisfaction,
    Balance,
    Forfeited,
    Legitimacy,
    LoseFace,
    Competence,
    Principles,
    SelfImage,
    Listened,
    Fairness,
    Ease,
    Considered,
    Impression,
    RelationshipSatisfaction,
    Trust,
    FutureRelationship,
}

impl SurveyField {
    pub const ALL: [SurveyField; 16] = [
        SurveyField::Satisfaction,
        SurveyField::Balance,
        SurveyField::Forfeited,
        SurveyField::Legitimacy,
        SurveyField::LoseFace,
        SurveyField::Competence,
        SurveyField::Principles,
        SurveyField::SelfImage,
        SurveyField::Listened,
        SurveyField::Fairness,
        SurveyField::Ease,
        SurveyField::Considered,
        SurveyField::Impression,
        SurveyField::RelationshipSatisfaction,
        SurveyField::Trust,
        SurveyField::FutureRelationship,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SurveyField::Satisfaction => "satisfaction",
            SurveyField::Balance => "balance",
            SurveyField::Forfeited => "forfeited",
            SurveyField::Legitimacy => "legitimacy",
            SurveyField::LoseFace => "lose_face",
            SurveyField::Competence => "competence",
            SurveyField::Principles => "principles",
            SurveyField::SelfImage => "self_image",
            SurveyField::Listened => "listened",
            SurveyField::Fairness => "fairness",
            SurveyField::Ease => "ease",
            SurveyField::Considered => "considered",
            SurveyField::Impression => "impression",
            SurveyField::RelationshipSatisfaction => "relationship_satisfaction",
            SurveyField::Trust => "trust",
            SurveyField::FutureRelationship => "future_relationship",
        }
    }

    pub fn from_key(key: &str) -> Option<SurveyField> {
        Self::ALL.iter().find(|f| f.key() == key).copied()
    }
}

/// Answers on the 1-7 Likert scale. Unanswered fields are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Survey(BTreeMap<SurveyField, f64>);

impl Survey {
    /// Unknown keys, non-numeric answers and zeroes are dropped.
    pub fn from_raw(raw: &RawValues) -> Survey {
        Survey(
            raw.iter().filter_map(|(key, value)| {
                let field = SurveyField::from_key(key)?;
                let answer = value.as_number()?;
                if answer == 0.0 {
                    None
                }
                else {
                    Some((field, answer))
                }
            }).collect()
        )
    }

    pub fn from_answers<I>(answers: I) -> Survey where I: IntoIterator<Item = (SurveyField, f64)> {
        Survey(answers.into_iter().filter(|(_, answer)| *answer != 0.0).collect())
    }

    pub fn get(&self, field: SurveyField) -> Option<f64> {
        self.0.get(&field).copied()
    }

    pub fn answered(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SurveyField, &f64)> {
        self.0.iter()
    }
}

/// Lifecycle of a result record.
///
/// `Disqualified` is terminal: once a no-show has been recorded no later write can revive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResultState {
    #[default]
    Open,
    Deal,
    NoDeal,
    Final { made_deal: Option<bool> },
    Disqualified,
}

impl ResultState {
    pub fn from_flags(made_deal: Option<bool>, is_final: bool, disqualified: bool) -> ResultState {
        if disqualified {
            ResultState::Disqualified
        }
        else if is_final {
            ResultState::Final { made_deal }
        }
        else {
            Self::open_with(made_deal)
        }
    }

    fn open_with(made_deal: Option<bool>) -> ResultState {
        match made_deal {
            None => ResultState::Open,
            Some(true) => ResultState::Deal,
            Some(false) => ResultState::NoDeal,
        }
    }

    pub fn made_deal(&self) -> Option<bool> {
        match self {
            ResultState::Open => None,
            ResultState::Deal => Some(true),
            ResultState::NoDeal => Some(false),
            ResultState::Final { made_deal } => *made_deal,
            ResultState::Disqualified => Some(false),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, ResultState::Final { .. } | ResultState::Disqualified)
    }

    pub fn is_disqualified(&self) -> bool {
        matches!(self, ResultState::Disqualified)
    }

    /// `None` leaves the state untouched.
    pub fn apply_made_deal(self, made_deal: Option<bool>) -> ResultState {
        match (self, made_deal) {
            (state, None) => state,
            (ResultState::Disqualified, _) => ResultState::Disqualified,
            (ResultState::Final { .. }, made_deal) => ResultState::Final { made_deal },
            (_, made_deal) => Self::open_with(made_deal),
        }
    }

    pub fn apply_final(self, is_final: Option<bool>) -> ResultState {
        match (self, is_final) {
            (state, None) => state,
            (ResultState::Disqualified, _) => ResultState::Disqualified,
            (ResultState::Final { made_deal }, Some(false)) => Self::open_with(made_deal),
            (state @ ResultState::Final { .. }, Some(true)) => state,
            (state, Some(true)) => ResultState::Final { made_deal: state.made_deal() },
            (state, Some(false)) => state,
        }
    }

    pub fn disqualify(self) -> ResultState {
        ResultState::Disqualified
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResultKey {
    pub event_id: Uuid,
    pub round: u32,
    pub team_id: Uuid,
}

impl ResultKey {
    pub fn new(event_id: Uuid, round: u32, team_id: Uuid) -> Self {
        ResultKey { event_id, round, team_id }
    }

    pub fn result_id(&self) -> Uuid {
        Uuid::new_v5(
            &RESULT_ID_NAMESPACE,
            format!("{}:{}:{}", self.event_id, self.round, self.team_id).as_bytes()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationResult {
    pub uuid: Uuid,
    pub event_id: Uuid,
    pub round: u32,
    pub team_id: Uuid,
    pub case_id: Uuid,
    #[serde(default)]
    pub participants: BTreeSet<Uuid>,
    #[serde(default)]
    pub agreement: Agreement,
    #[serde(default)]
    pub survey: Survey,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub state: ResultState,
    /// Set on synthesized no-shows whose round has not closed yet. Never persisted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
    pub last_modified: NaiveDateTime,
}

impl NegotiationResult {
    pub fn new(key: ResultKey, case_id: Uuid, last_modified: NaiveDateTime) -> Self {
        NegotiationResult {
            uuid: key.result_id(),
            event_id: key.event_id,
            round: key.round,
            team_id: key.team_id,
            case_id,
            participants: BTreeSet::new(),
            agreement: Agreement::new(),
            survey: Survey::default(),
            comment: None,
            state: ResultState::Open,
            pending: false,
            last_modified,
        }
    }

    pub fn key(&self) -> ResultKey {
        ResultKey::new(self.event_id, self.round, self.team_id)
    }

    pub fn made_deal(&self) -> Option<bool> {
        self.state.made_deal()
    }

    pub fn is_final(&self) -> bool {
        self.state.is_final()
    }

    pub fn is_disqualified(&self) -> bool {
        self.state.is_disqualified()
    }

    /// An explicit deal flag wins; otherwise a recorded agreement counts as a deal.
    pub fn has_deal(&self) -> bool {
        match self.made_deal() {
            Some(made_deal) => made_deal,
            None => !self.agreement.is_empty(),
        }
    }
}

/// A field of an incoming submission: absent, explicitly null, or carrying a value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Unset,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Patch::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> Patch<T> where T: Copy {
    pub fn copied(&self) -> Option<T> {
        self.value().copied()
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T> where T: Deserialize<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        // Missing fields never reach this point, they become `Unset` through `#[serde(default)]`.
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

impl<T> Serialize for Patch<T> where T: Serialize {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where S: Serializer {
        match self {
            Patch::Value(v) => v.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

/// One write from one side of a negotiation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub round: u32,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub agreement: Patch<RawValues>,
    #[serde(default, skip_serializing_if = "Patch::is_unset", deserialize_with = "deserialize_answers")]
    pub survey: Patch<RawValues>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub comment: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub made_deal: Patch<bool>,
    #[serde(rename = "final", default, skip_serializing_if = "Patch::is_unset")]
    pub is_final: Patch<bool>,
}

impl Submission {
    pub fn for_round(round: u32) -> Self {
        Submission { round, ..Default::default() }
    }
}


/// Survey answers may be sent as `null` when left unanswered.
fn deserialize_answers<'de, D>(deserializer: D) -> Result<Patch<RawValues>, D::Error> where D: Deserializer<'de> {
    let answers = Patch::<BTreeMap<String, Option<AgreementValue>>>::deserialize(deserializer)?;
    Ok(match answers {
        Patch::Value(answers) => Patch::Value(
            answers.into_iter().filter_map(|(key, value)| Some((key, value?))).collect()
        ),
        Patch::Null => Patch::Null,
        Patch::Unset => Patch::Unset,
    })
}
