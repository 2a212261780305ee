use async_trait::async_trait;
use parley_entities::{prelude::ProficiencyService, Uuid};
use tracing::info;


/// Records that a participant's proficiency is due for recalculation.
///
/// Deployments with a skill model plug in their own `ProficiencyService`.
#[derive(Debug, Default, Clone)]
pub struct LoggingProficiencyService;

#[async_trait]
impl ProficiencyService for LoggingProficiencyService {
    async fn recalculate(&self, participant_id: Uuid) -> Result<(), anyhow::Error> {
        info!("Proficiency recalculation requested for participant {}", participant_id);
        Ok(())
    }
}
