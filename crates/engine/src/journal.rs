//! Journal primitives.
//!
//! A `JournalEntry` is an immutable record of a single balance mutation,
//! carrying before/after snapshots of the mutated account. The journal is
//! append-only: no update or delete exists anywhere in the engine.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Credit,
    Debit,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl TryFrom<&str> for EntryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid journal entry kind: {other}"
            ))),
        }
    }
}

/// Outcome recorded on a journal row.
///
/// The funding flow only ever writes `Success`: a failure aborts the whole
/// unit of work before any row exists, so no `Failed` row is produced there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Success,
    Failed,
}

impl EntryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for EntryStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid journal entry status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    /// The account whose balance this entry describes.
    pub account_id: String,
    pub kind: EntryKind,
    pub status: EntryStatus,
    /// Points moved. Always positive; the direction lives in `kind`.
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    /// The campaign this debit paid for, if any.
    pub campaign_id: Option<Uuid>,
    /// The other account of a point grant, if any.
    pub counterparty: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(
        account_id: String,
        kind: EntryKind,
        amount: i64,
        balance_before: i64,
        balance_after: i64,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount <= 0 {
            return Err(EngineError::InvalidArgument(
                "amount must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            status: EntryStatus::Success,
            amount,
            balance_before,
            balance_after,
            campaign_id: None,
            counterparty: None,
            created_at,
        })
    }

    #[must_use]
    pub fn campaign(mut self, campaign_id: Uuid) -> Self {
        self.campaign_id = Some(campaign_id);
        self
    }

    #[must_use]
    pub fn counterparty(mut self, account_id: impl Into<String>) -> Self {
        self.counterparty = Some(account_id.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub status: String,
    pub amount: i64,
    pub balance_before: i64,
    pub balance_after: i64,
    pub campaign_id: Option<String>,
    pub counterparty: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::campaigns::Entity",
        from = "Column::CampaignId",
        to = "super::campaigns::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Campaigns,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::campaigns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&JournalEntry> for ActiveModel {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            account_id: ActiveValue::Set(entry.account_id.clone()),
            kind: ActiveValue::Set(entry.kind.as_str().to_string()),
            status: ActiveValue::Set(entry.status.as_str().to_string()),
            amount: ActiveValue::Set(entry.amount),
            balance_before: ActiveValue::Set(entry.balance_before),
            balance_after: ActiveValue::Set(entry.balance_after),
            campaign_id: ActiveValue::Set(entry.campaign_id.map(|id| id.to_string())),
            counterparty: ActiveValue::Set(entry.counterparty.clone()),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for JournalEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("journal entry not exists".to_string()))?,
            account_id: model.account_id,
            kind: EntryKind::try_from(model.kind.as_str())?,
            status: EntryStatus::try_from(model.status.as_str())?,
            amount: model.amount,
            balance_before: model.balance_before,
            balance_after: model.balance_after,
            campaign_id: model.campaign_id.and_then(|s| Uuid::parse_str(&s).ok()),
            counterparty: model.counterparty,
            created_at: model.created_at,
        })
    }
}
