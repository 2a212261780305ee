pub use crate::domain::result::{NegotiationResult, ResultKey, ResultState, Agreement, AgreementValue, Survey, SurveyField, Submission, Patch, RawValues};
pub use crate::domain::event::{Event, Round, Match, MatchParty, MatchPosition, Side, Team};
pub use crate::domain::case::{Case, ScoreFormula};
pub use crate::conflict::{AgreementConflict, ConflictType};
pub use crate::store::{ResultStore, ResultFilter};
pub use crate::services::{EventProvider, CaseProvider, ScoreEvaluator, ProficiencyService};
pub use crate::tab::EnrichedResult;
