//! Command structs for engine operations.
//!
//! These types group parameters for write operations (campaign funding,
//! point grants, account provisioning), keeping call sites readable and
//! avoiding long argument lists.

use chrono::{DateTime, Utc};

use crate::{AccountRole, LinkButton, Media, PhoneButton};

/// Fund and persist a campaign.
#[derive(Clone, Debug)]
pub struct FundCampaignCmd {
    /// Account paying for the recipients (the authenticated caller).
    pub payer_id: String,
    pub name: String,
    pub message: String,
    pub country_code: String,
    /// Requested recipients, as submitted: order kept, duplicates kept.
    pub recipients: Vec<String>,
    pub phone_button: Option<PhoneButton>,
    pub link_button: Option<LinkButton>,
    pub media: Option<Media>,
    pub created_at: DateTime<Utc>,
}

impl FundCampaignCmd {
    #[must_use]
    pub fn new(
        payer_id: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
        country_code: impl Into<String>,
        recipients: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            payer_id: payer_id.into(),
            name: name.into(),
            message: message.into(),
            country_code: country_code.into(),
            recipients,
            phone_button: None,
            link_button: None,
            media: None,
            created_at,
        }
    }

    #[must_use]
    pub fn phone_button(mut self, button: PhoneButton) -> Self {
        self.phone_button = Some(button);
        self
    }

    #[must_use]
    pub fn link_button(mut self, button: LinkButton) -> Self {
        self.link_button = Some(button);
        self
    }

    #[must_use]
    pub fn media(mut self, media: Media) -> Self {
        self.media = Some(media);
        self
    }
}

/// Move points from one account to another.
#[derive(Clone, Debug)]
pub struct GrantPointsCmd {
    /// Account giving the points (the authenticated caller).
    pub grantor_id: String,
    /// Account receiving the points.
    pub receiver_id: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl GrantPointsCmd {
    #[must_use]
    pub fn new(
        grantor_id: impl Into<String>,
        receiver_id: impl Into<String>,
        amount: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            grantor_id: grantor_id.into(),
            receiver_id: receiver_id.into(),
            amount,
            created_at,
        }
    }
}

/// Provision a new account under an existing one.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    /// Account performing the provisioning (the authenticated caller).
    pub actor_id: String,
    pub username: String,
    pub password: String,
    pub role: AccountRole,
    /// Starting balance, granted by the actor.
    pub balance: i64,
    pub created_at: DateTime<Utc>,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(
        actor_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        role: AccountRole,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            username: username.into(),
            password: password.into(),
            role,
            balance: 0,
            created_at,
        }
    }

    #[must_use]
    pub fn balance(mut self, balance: i64) -> Self {
        self.balance = balance;
        self
    }
}
