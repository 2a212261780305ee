use parley_entities::prelude::{Agreement, ScoreEvaluator, ScoreFormula};


/// Evaluates sums of products, e.g. `"2*price - 500*delivery + 1000"`.
///
/// Parameters missing from the agreement, non-numeric values and unparseable terms count as 0.
#[derive(Debug, Default, Clone)]
pub struct LinearScoreEvaluator;

impl LinearScoreEvaluator {
    fn factor(factor: &str, agreement: &Agreement) -> f64 {
        if let Ok(value) = factor.parse::<f64>() {
            return value;
        }
        let (sign, name) = match factor.strip_prefix('-') {
            Some(name) => (-1.0, name),
            None => (1.0, factor),
        };
        sign * agreement.get(name).and_then(|v| v.as_number()).unwrap_or(0.0)
    }

    fn term(term: &str, agreement: &Agreement) -> f64 {
        term.split('*').map(|f| Self::factor(f, agreement)).product()
    }
}

impl ScoreEvaluator for LinearScoreEvaluator {
    fn evaluate(&self, formula: &ScoreFormula, agreement: &Agreement) -> f64 {
        let normalized = formula.as_str().chars().filter(|c| !c.is_whitespace()).collect::<String>();
        let total = normalized
            .replace('-', "+-")
            .split('+')
            .filter(|t| !t.is_empty())
            .map(|t| Self::term(t, agreement))
            .sum::<f64>();

        if total.is_finite() { total } else { 0.0 }
    }
}
