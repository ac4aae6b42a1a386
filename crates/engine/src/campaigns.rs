//! The module contains the `Campaign` struct and its implementation.
//!
//! A campaign is the funded artifact itself: message content, the recipient
//! list the funding protocol actually paid for, and optional buttons/media.
//! "Sending" a campaign only persists and funds it; delivery to a messaging
//! provider is not part of this system.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Call-to-action button dialing a phone number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneButton {
    pub text: String,
    pub number: String,
}

/// Call-to-action button opening a URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    pub text: String,
    pub url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Pdf,
}

/// Descriptor of an already-uploaded media attachment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    pub url: String,
    pub filename: String,
    pub size_bytes: i64,
    pub mime_type: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub message: String,
    pub country_code: String,
    pub phone_button: Option<PhoneButton>,
    pub link_button: Option<LinkButton>,
    pub media: Option<Media>,
    /// The funded subset of the requested recipients, original order,
    /// duplicates preserved.
    pub recipients: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(
        name: String,
        message: String,
        country_code: String,
        recipients: Vec<String>,
        created_by: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if recipients.is_empty() {
            return Err(EngineError::InvalidArgument(
                "at least one recipient required".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            message,
            country_code,
            phone_button: None,
            link_button: None,
            media: None,
            recipients,
            created_by,
            created_at,
        })
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

    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub message: String,
    pub country_code: String,
    /// JSON-encoded [`PhoneButton`].
    pub phone_button: Option<String>,
    /// JSON-encoded [`LinkButton`].
    pub link_button: Option<String>,
    /// JSON-encoded [`Media`].
    pub media: Option<String>,
    /// JSON-encoded array of recipient numbers.
    pub recipients: String,
    pub recipient_count: i64,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::CreatedBy",
        to = "super::accounts::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
    #[sea_orm(has_many = "super::journal::Entity")]
    Journal,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::journal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Journal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn encode_json<T: Serialize>(value: &T, label: &str) -> ResultEngine<String> {
    serde_json::to_string(value)
        .map_err(|_| EngineError::InvalidArgument(format!("invalid {label}")))
}

fn decode_json<T: for<'de> Deserialize<'de>>(value: &str, label: &str) -> ResultEngine<T> {
    serde_json::from_str(value)
        .map_err(|_| EngineError::InvalidArgument(format!("invalid stored {label}")))
}

impl TryFrom<&Campaign> for ActiveModel {
    type Error = EngineError;

    fn try_from(campaign: &Campaign) -> Result<Self, Self::Error> {
        let phone_button = campaign
            .phone_button
            .as_ref()
            .map(|b| encode_json(b, "phone button"))
            .transpose()?;
        let link_button = campaign
            .link_button
            .as_ref()
            .map(|b| encode_json(b, "link button"))
            .transpose()?;
        let media = campaign
            .media
            .as_ref()
            .map(|m| encode_json(m, "media"))
            .transpose()?;

        Ok(Self {
            id: ActiveValue::Set(campaign.id.to_string()),
            name: ActiveValue::Set(campaign.name.clone()),
            message: ActiveValue::Set(campaign.message.clone()),
            country_code: ActiveValue::Set(campaign.country_code.clone()),
            phone_button: ActiveValue::Set(phone_button),
            link_button: ActiveValue::Set(link_button),
            media: ActiveValue::Set(media),
            recipients: ActiveValue::Set(encode_json(&campaign.recipients, "recipients")?),
            recipient_count: ActiveValue::Set(campaign.recipients.len() as i64),
            created_by: ActiveValue::Set(campaign.created_by.clone()),
            created_at: ActiveValue::Set(campaign.created_at),
        })
    }
}

impl TryFrom<Model> for Campaign {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("campaign not exists".to_string()))?,
            name: model.name,
            message: model.message,
            country_code: model.country_code,
            phone_button: model
                .phone_button
                .as_deref()
                .map(|raw| decode_json(raw, "phone button"))
                .transpose()?,
            link_button: model
                .link_button
                .as_deref()
                .map(|raw| decode_json(raw, "link button"))
                .transpose()?,
            media: model
                .media
                .as_deref()
                .map(|raw| decode_json(raw, "media"))
                .transpose()?,
            recipients: decode_json(&model.recipients, "recipients")?,
            created_by: model.created_by,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn round_trips_buttons_and_recipients_through_model() {
        let campaign = Campaign::new(
            "Spring sale".to_string(),
            "50% off".to_string(),
            "+39".to_string(),
            vec!["111".to_string(), "222".to_string(), "111".to_string()],
            "acme".to_string(),
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap()
        .phone_button(PhoneButton {
            text: "Call us".to_string(),
            number: "+390001".to_string(),
        });

        let model_id = campaign.id;
        let active = ActiveModel::try_from(&campaign).unwrap();
        let model = Model {
            id: model_id.to_string(),
            name: active.name.unwrap(),
            message: active.message.unwrap(),
            country_code: active.country_code.unwrap(),
            phone_button: active.phone_button.unwrap(),
            link_button: active.link_button.unwrap(),
            media: active.media.unwrap(),
            recipients: active.recipients.unwrap(),
            recipient_count: active.recipient_count.unwrap(),
            created_by: active.created_by.unwrap(),
            created_at: active.created_at.unwrap(),
        };

        let restored = Campaign::try_from(model).unwrap();
        assert_eq!(restored, campaign);
        assert_eq!(restored.recipient_count(), 3);
    }

    #[test]
    fn rejects_empty_recipient_list() {
        let err = Campaign::new(
            "Spring sale".to_string(),
            "50% off".to_string(),
            "+39".to_string(),
            Vec::new(),
            "acme".to_string(),
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidArgument("at least one recipient required".to_string())
        );
    }
}
