use serde::{Serialize, Deserialize};

use crate::domain::result::{Survey, SurveyField};


/// Subjective value scores derived from the 16 survey answers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurveyComposite {
    pub instrumental: Option<f64>,
    #[serde(rename = "self")]
    pub self_: Option<f64>,
    pub process: Option<f64>,
    pub relationship: Option<f64>,
    pub process_and_relationship: Option<f64>,
}

fn avg<I>(values: I) -> Option<f64> where I: IntoIterator<Item = Option<f64>> {
    let present = values.into_iter().flatten().collect::<Vec<_>>();
    if present.is_empty() {
        None
    }
    else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

fn reversed(value: Option<f64>) -> Option<f64> {
    value.map(|v| 8.0 - v)
}

impl SurveyComposite {
    pub fn from_survey(survey: &Survey) -> Self {
        let get = |field| survey.get(field);

        let instrumental = avg([
            get(SurveyField::Satisfaction),
            get(SurveyField::Balance),
            reversed(get(SurveyField::Forfeited)),
            get(SurveyField::Legitimacy),
        ]);
        let self_ = avg([
            reversed(get(SurveyField::LoseFace)),
            get(SurveyField::Competence),
            get(SurveyField::Principles),
            get(SurveyField::SelfImage),
        ]);
        let process = avg([
            get(SurveyField::Listened),
            get(SurveyField::Fairness),
            get(SurveyField::Ease),
            get(SurveyField::Considered),
        ]);
        let relationship = avg([
            get(SurveyField::Impression),
            get(SurveyField::RelationshipSatisfaction),
            get(SurveyField::Trust),
            get(SurveyField::FutureRelationship),
        ]);

        SurveyComposite {
            instrumental,
            self_,
            process,
            relationship,
            process_and_relationship: avg([process, relationship]),
        }
    }

    pub fn has_svi(&self) -> bool {
        matches!(self.process_and_relationship, Some(v) if v != 0.0 && v.is_finite())
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_composites_reverse_negative_items() {
        let survey = Survey::from_answers(vec![
            (SurveyField::Satisfaction, 6.0),
            (SurveyField::Balance, 6.0),
            (SurveyField::Forfeited, 2.0),
            (SurveyField::Legitimacy, 6.0),
            (SurveyField::LoseFace, 7.0),
            (SurveyField::Competence, 1.0),
        ]);
        let composite = SurveyComposite::from_survey(&survey);
        assert_eq!(composite.instrumental, Some(6.0));
        assert_eq!(composite.self_, Some(1.0));
        assert_eq!(composite.process, None);
        assert_eq!(composite.process_and_relationship, None);
        assert!(!composite.has_svi());
    }

    #[test]
    fn test_process_and_relationship() {
        let survey = Survey::from_answers(vec![
            (SurveyField::Listened, 4.0),
            (SurveyField::Fairness, 6.0),
            (SurveyField::Trust, 7.0),
            (SurveyField::Impression, 5.0),
        ]);
        let composite = SurveyComposite::from_survey(&survey);
        assert_eq!(composite.process, Some(5.0));
        assert_eq!(composite.relationship, Some(6.0));
        assert_eq!(composite.process_and_relationship, Some(5.5));
        assert!(composite.has_svi());
    }
}
