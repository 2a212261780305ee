use sea_orm::prelude::Uuid;
use serde::{Serialize, Deserialize};

use super::event::Side;


#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreFormula(pub String);

impl ScoreFormula {
    pub fn new<S: Into<String>>(formula: S) -> Self {
        ScoreFormula(formula.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub uuid: Uuid,
    #[serde(default)]
    pub name: String,
    pub score_formula_a: ScoreFormula,
    pub score_formula_b: ScoreFormula,
    /// Percentage of the total score taken from the opponent's relationship rating, per side.
    #[serde(default)]
    pub relation_ratio: [f64; 2],
    #[serde(default)]
    pub agree_match: bool,
    #[serde(default = "default_scorable")]
    pub scorable: bool,
}

fn default_scorable() -> bool {
    true
}

impl Case {
    pub fn formula_for(&self, side: Side) -> &ScoreFormula {
        match side {
            Side::A => &self.score_formula_a,
            Side::B => &self.score_formula_b,
        }
    }

    pub fn relation_weight(&self, side: Side) -> f64 {
        self.relation_ratio[side.index()]
    }
}
