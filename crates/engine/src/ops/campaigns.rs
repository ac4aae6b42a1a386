//! Campaign reads with cursor-based pagination.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{AccountRole, Campaign, EngineError, ResultEngine, campaigns};

use super::{Engine, with_tx};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CampaignsCursor {
    created_at: DateTime<Utc>,
    campaign_id: String,
}

impl CampaignsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid campaigns cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid campaigns cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid campaigns cursor".to_string()))
    }
}

impl Engine {
    /// Return a campaign by id.
    ///
    /// Visible to its owner and to admins; anyone else gets the same
    /// `KeyNotFound` as a missing campaign, so existence is not leaked.
    pub async fn campaign(&self, campaign_id: Uuid, actor_id: &str) -> ResultEngine<Campaign> {
        with_tx!(self, |db_tx| {
            let model = campaigns::Entity::find_by_id(campaign_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("campaign not exists".to_string()))?;

            if model.created_by != actor_id {
                let actor = self.require_account(&db_tx, actor_id).await?;
                if actor.role != AccountRole::Admin {
                    return Err(EngineError::KeyNotFound("campaign not exists".to_string()));
                }
            }

            Campaign::try_from(model)
        })
    }

    /// Lists an account's campaigns, with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(created_at DESC, id DESC)`.
    pub async fn list_campaigns_page(
        &self,
        account_id: &str,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<(Vec<Campaign>, Option<String>)> {
        with_tx!(self, |db_tx| {
            self.require_account(&db_tx, account_id).await?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = campaigns::Entity::find()
                .filter(campaigns::Column::CreatedBy.eq(account_id.to_string()))
                .order_by_desc(campaigns::Column::CreatedAt)
                .order_by_desc(campaigns::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = CampaignsCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(campaigns::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(campaigns::Column::CreatedAt.eq(cursor.created_at))
                                .add(campaigns::Column::Id.lt(cursor.campaign_id)),
                        ),
                );
            }

            let rows: Vec<campaigns::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<Campaign> = Vec::with_capacity(rows.len().min(limit as usize));
            for model in rows.into_iter().take(limit as usize) {
                out.push(Campaign::try_from(model)?);
            }

            let next_cursor = out.last().map(|campaign| CampaignsCursor {
                created_at: campaign.created_at,
                campaign_id: campaign.id.to_string(),
            });
            let next_cursor = if has_more {
                next_cursor.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }
}
