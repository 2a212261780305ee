use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum NegotiationResult {
    Table,
    Uuid,
    EventId,
    RoundIndex,
    TeamId,
    CaseId,
    Participants,
    Agreement,
    Survey,
    Comment,
    MadeDeal,
    IsFinal,
    Disqualified,
    LastModified,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(NegotiationResult::Table)
                    .col(ColumnDef::new(NegotiationResult::Uuid).uuid().not_null().primary_key())
                    .col(ColumnDef::new(NegotiationResult::EventId).uuid().not_null())
                    .col(ColumnDef::new(NegotiationResult::RoundIndex).integer().not_null())
                    .col(ColumnDef::new(NegotiationResult::TeamId).uuid().not_null())
                    .col(ColumnDef::new(NegotiationResult::CaseId).uuid().not_null())
                    .col(ColumnDef::new(NegotiationResult::Participants).text().not_null().default("[]"))
                    .col(ColumnDef::new(NegotiationResult::Agreement).text().not_null().default("{}"))
                    .col(ColumnDef::new(NegotiationResult::Survey).text().not_null().default("{}"))
                    .col(ColumnDef::new(NegotiationResult::Comment).text())
                    .col(ColumnDef::new(NegotiationResult::MadeDeal).boolean())
                    .col(ColumnDef::new(NegotiationResult::IsFinal).boolean().not_null().default(false))
                    .col(ColumnDef::new(NegotiationResult::Disqualified).boolean().not_null().default(false))
                    .col(ColumnDef::new(NegotiationResult::LastModified).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // Not unique: rows imported from older deployments may repeat a key and are
        // folded together on the next write.
        manager.create_index(
            IndexCreateStatement::new()
            .name("idx-negotiation_result-event-round-team")
            .table(NegotiationResult::Table)
            .col(NegotiationResult::EventId)
            .col(NegotiationResult::RoundIndex)
            .col(NegotiationResult::TeamId)
            .to_owned()
        ).await?;

        manager.create_index(
            IndexCreateStatement::new()
            .name("idx-negotiation_result-case")
            .table(NegotiationResult::Table)
            .col(NegotiationResult::CaseId)
            .to_owned()
        ).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NegotiationResult::Table).to_owned())
            .await
    }
}
