//! The module contains the `Account` struct and its implementation.
//!
//! An account is the balance-holding entity behind every login: the points
//! it carries pay for campaign recipients, one point per recipient.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{EngineError, ResultEngine};

/// Role of an account in the reseller hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountRole {
    Admin,
    Reseller,
    User,
}

impl AccountRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Reseller => "reseller",
            Self::User => "user",
        }
    }

    /// Roles this role is allowed to provision.
    pub(crate) fn can_create(self, target: AccountRole) -> bool {
        match self {
            Self::Admin => true,
            Self::Reseller => matches!(target, Self::User),
            Self::User => false,
        }
    }
}

impl TryFrom<&str> for AccountRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "reseller" => Ok(Self::Reseller),
            "user" => Ok(Self::User),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid account role: {other}"
            ))),
        }
    }
}

/// How an account pays for campaign recipients.
///
/// The role enum is translated into a policy exactly once, when the account
/// is loaded; funding arithmetic dispatches on the policy and never looks at
/// the role again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FundingPolicy {
    /// Every funded recipient consumes one point of `balance`.
    Metered { balance: i64 },
    /// Recipients are funded without consuming balance (admin accounts).
    Unmetered,
}

impl FundingPolicy {
    /// How many of `requested` recipients this policy can pay for.
    pub fn fundable_count(self, requested: usize) -> usize {
        match self {
            Self::Unmetered => requested,
            // A balance driven negative by external means funds nothing.
            Self::Metered { balance } => requested.min(balance.max(0) as usize),
        }
    }
}

/// A ledger account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    /// Stable identifier, also the login username.
    pub username: String,
    pub password: String,
    pub role: AccountRole,
    /// Spendable points. One point funds one campaign recipient.
    pub balance: i64,
    /// Number of campaigns funded by this account.
    pub campaign_count: i64,
    /// The account that provisioned this one (None for bootstrap accounts).
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        username: String,
        password: String,
        role: AccountRole,
        balance: i64,
        created_by: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if balance < 0 {
            return Err(EngineError::InvalidArgument(
                "balance must be >= 0".to_string(),
            ));
        }
        Ok(Self {
            username,
            password,
            role,
            balance,
            campaign_count: 0,
            created_by,
            created_at,
        })
    }

    pub fn funding_policy(&self) -> FundingPolicy {
        match self.role {
            AccountRole::Admin => FundingPolicy::Unmetered,
            AccountRole::Reseller | AccountRole::User => FundingPolicy::Metered {
                balance: self.balance,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub role: String,
    pub balance: i64,
    pub campaign_count: i64,
    pub created_by: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::campaigns::Entity")]
    Campaigns,
    #[sea_orm(has_many = "super::journal::Entity")]
    Journal,
}

impl Related<super::campaigns::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl Related<super::journal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            username: ActiveValue::Set(value.username.clone()),
            password: ActiveValue::Set(value.password.clone()),
            role: ActiveValue::Set(value.role.as_str().to_string()),
            balance: ActiveValue::Set(value.balance),
            campaign_count: ActiveValue::Set(value.campaign_count),
            created_by: ActiveValue::Set(value.created_by.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            username: model.username,
            password: model.password,
            role: AccountRole::try_from(model.role.as_str())?,
            balance: model.balance,
            campaign_count: model.campaign_count,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}
