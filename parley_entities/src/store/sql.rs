use std::collections::BTreeSet;

use async_trait::async_trait;
use sea_orm::{prelude::*, ActiveValue, Condition, QueryOrder, QuerySelect, Select, sea_query::OnConflict};

use crate::{domain::result::{Agreement, NegotiationResult, ResultState, Survey}, schema, ResultError};

use super::{ResultFilter, ResultStore};


pub struct SqlResultStore<C> {
    db: C,
}

impl<C> SqlResultStore<C> where C: ConnectionTrait {
    pub fn new(db: C) -> Self {
        SqlResultStore { db }
    }

    fn select(filter: &ResultFilter) -> Select<schema::negotiation_result::Entity> {
        let mut condition = Condition::all();
        if let Some(event_id) = filter.event_id {
            condition = condition.add(schema::negotiation_result::Column::EventId.eq(event_id));
        }
        if let Some(round) = filter.round {
            condition = condition.add(schema::negotiation_result::Column::RoundIndex.eq(round as i32));
        }
        if let Some(team_id) = filter.team_id {
            condition = condition.add(schema::negotiation_result::Column::TeamId.eq(team_id));
        }
        if let Some(case_id) = filter.case_id {
            condition = condition.add(schema::negotiation_result::Column::CaseId.eq(case_id));
        }
        if filter.only_with_agreement {
            condition = condition.add(schema::negotiation_result::Column::Agreement.ne("{}"));
        }

        schema::negotiation_result::Entity::find()
            .filter(condition)
            .order_by_asc(schema::negotiation_result::Column::RoundIndex)
            .order_by_asc(schema::negotiation_result::Column::TeamId)
            .order_by_asc(schema::negotiation_result::Column::Uuid)
    }
}

impl TryFrom<schema::negotiation_result::Model> for NegotiationResult {
    type Error = ResultError;

    fn try_from(model: schema::negotiation_result::Model) -> Result<Self, Self::Error> {
        let participants: BTreeSet<Uuid> = serde_json::from_str(&model.participants)?;
        let agreement: Agreement = serde_json::from_str(&model.agreement)?;
        let survey: Survey = serde_json::from_str(&model.survey)?;

        Ok(NegotiationResult {
            uuid: model.uuid,
            event_id: model.event_id,
            round: model.round_index as u32,
            team_id: model.team_id,
            case_id: model.case_id,
            participants,
            agreement,
            survey,
            comment: model.comment,
            state: ResultState::from_flags(model.made_deal, model.is_final, model.disqualified),
            pending: false,
            last_modified: model.last_modified,
        })
    }
}

fn to_active_model(result: &NegotiationResult) -> Result<schema::negotiation_result::ActiveModel, ResultError> {
    Ok(schema::negotiation_result::ActiveModel {
        uuid: ActiveValue::Set(result.uuid),
        event_id: ActiveValue::Set(result.event_id),
        round_index: ActiveValue::Set(result.round as i32),
        team_id: ActiveValue::Set(result.team_id),
        case_id: ActiveValue::Set(result.case_id),
        participants: ActiveValue::Set(serde_json::to_string(&result.participants)?),
        agreement: ActiveValue::Set(serde_json::to_string(&result.agreement)?),
        survey: ActiveValue::Set(serde_json::to_string(&result.survey)?),
        comment: ActiveValue::Set(result.comment.clone()),
        made_deal: ActiveValue::Set(result.made_deal()),
        is_final: ActiveValue::Set(result.is_final()),
        disqualified: ActiveValue::Set(result.is_disqualified()),
        last_modified: ActiveValue::Set(result.last_modified),
    })
}

#[async_trait]
impl<C> ResultStore for SqlResultStore<C> where C: ConnectionTrait + Send + Sync {
    async fn query(&self, filter: &ResultFilter) -> Result<Vec<NegotiationResult>, ResultError> {
        Self::select(filter).all(&self.db).await?.into_iter().map(NegotiationResult::try_from).collect()
    }

    async fn query_page(&self, filter: &ResultFilter, offset: u64, limit: u64) -> Result<Vec<NegotiationResult>, ResultError> {
        Self::select(filter)
            .offset(offset)
            .limit(limit)
            .all(&self.db).await?
            .into_iter()
            .map(NegotiationResult::try_from)
            .collect()
    }

    async fn upsert(&self, result: &NegotiationResult) -> Result<Uuid, ResultError> {
        let model = to_active_model(result)?;
        schema::negotiation_result::Entity::insert(model)
            .on_conflict(
                OnConflict::column(schema::negotiation_result::Column::Uuid)
                    .update_columns([
                        schema::negotiation_result::Column::EventId,
                        schema::negotiation_result::Column::RoundIndex,
                        schema::negotiation_result::Column::TeamId,
                        schema::negotiation_result::Column::CaseId,
                        schema::negotiation_result::Column::Participants,
                        schema::negotiation_result::Column::Agreement,
                        schema::negotiation_result::Column::Survey,
                        schema::negotiation_result::Column::Comment,
                        schema::negotiation_result::Column::MadeDeal,
                        schema::negotiation_result::Column::IsFinal,
                        schema::negotiation_result::Column::Disqualified,
                        schema::negotiation_result::Column::LastModified,
                    ])
                    .to_owned()
            )
            .exec(&self.db).await?;
        Ok(result.uuid)
    }

    async fn delete(&self, uuid: Uuid) -> Result<(), ResultError> {
        schema::negotiation_result::Entity::delete_by_id(uuid).exec(&self.db).await?;
        Ok(())
    }
}
