//! Campaigns API endpoints

use api_types::campaign::{
    CampaignCreated, CampaignData, CampaignList, CampaignListResponse, CampaignNew, CampaignView,
    LinkButtonView, MediaDescriptor, MediaKind as ApiMediaKind, MediaView, MobileNumberEntryType,
    MobileNumbers, PhoneButtonView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{FixedOffset, Utc};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{Campaign, FundCampaignCmd, LinkButton, Media, MediaKind, PhoneButton};

/// Upload ceiling enforced before the funding protocol runs.
const MAX_MEDIA_BYTES: i64 = 5 * 1024 * 1024;

fn media_kind_for_mime(mime_type: &str) -> Option<MediaKind> {
    match mime_type {
        "image/jpeg" | "image/png" | "image/gif" | "image/webp" => Some(MediaKind::Image),
        "video/mp4" | "video/mpeg" | "video/webm" | "video/quicktime" => Some(MediaKind::Video),
        "application/pdf" => Some(MediaKind::Pdf),
        _ => None,
    }
}

fn validate_media(descriptor: MediaDescriptor) -> Result<Media, ServerError> {
    if descriptor.size_bytes <= 0 {
        return Err(ServerError::Generic(
            "media size must be > 0".to_string(),
        ));
    }
    if descriptor.size_bytes > MAX_MEDIA_BYTES {
        return Err(ServerError::Generic(
            "media exceeds the 5MB limit".to_string(),
        ));
    }
    let Some(kind) = media_kind_for_mime(&descriptor.mime_type) else {
        return Err(ServerError::Generic(format!(
            "unsupported media type: {}",
            descriptor.mime_type
        )));
    };

    Ok(Media {
        kind,
        url: descriptor.url,
        filename: descriptor.filename,
        size_bytes: descriptor.size_bytes,
        mime_type: descriptor.mime_type,
    })
}

/// Both halves of a button must be present, or neither.
fn optional_pair(
    first: Option<String>,
    second: Option<String>,
    label: &str,
) -> Result<Option<(String, String)>, ServerError> {
    match (first, second) {
        (Some(first), Some(second)) => Ok(Some((first, second))),
        (None, None) => Ok(None),
        _ => Err(ServerError::Generic(format!(
            "{label} requires both fields"
        ))),
    }
}

fn split_numbers(numbers: MobileNumbers) -> (Vec<String>, MobileNumberEntryType) {
    match numbers {
        MobileNumbers::Raw(raw) => (
            raw.split(',')
                .map(str::trim)
                .filter(|number| !number.is_empty())
                .map(ToString::to_string)
                .collect(),
            MobileNumberEntryType::Text,
        ),
        MobileNumbers::List(list) => (list, MobileNumberEntryType::List),
    }
}

fn funding_message(funded: usize, excluded: usize) -> String {
    if excluded == 0 {
        format!("Campaign created with {funded} numbers.")
    } else {
        format!(
            "Campaign created with {funded} numbers (limited by balance). \
             {excluded} numbers were excluded."
        )
    }
}

fn map_phone_button(button: PhoneButton) -> PhoneButtonView {
    PhoneButtonView {
        text: button.text,
        number: button.number,
    }
}

fn map_link_button(button: LinkButton) -> LinkButtonView {
    LinkButtonView {
        text: button.text,
        url: button.url,
    }
}

fn map_media(media: Media) -> MediaView {
    MediaView {
        kind: match media.kind {
            MediaKind::Image => ApiMediaKind::Image,
            MediaKind::Video => ApiMediaKind::Video,
            MediaKind::Pdf => ApiMediaKind::Pdf,
        },
        url: media.url,
        filename: media.filename,
        size_bytes: media.size_bytes,
        mime_type: media.mime_type,
    }
}

fn map_campaign(campaign: Campaign, utc: FixedOffset) -> CampaignView {
    CampaignView {
        id: campaign.id,
        name: campaign.name,
        message: campaign.message,
        country_code: campaign.country_code,
        phone_button: campaign.phone_button.map(map_phone_button),
        link_button: campaign.link_button.map(map_link_button),
        media: campaign.media.map(map_media),
        recipient_count: campaign.recipients.len(),
        recipients: campaign.recipients,
        created_at: campaign.created_at.with_timezone(&utc),
    }
}

fn utc_offset() -> Result<FixedOffset, ServerError> {
    FixedOffset::east_opt(0).ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))
}

pub async fn create(
    Extension(account): Extension<engine::Account>,
    State(state): State<ServerState>,
    Json(payload): Json<CampaignNew>,
) -> Result<(StatusCode, Json<CampaignCreated>), ServerError> {
    let (numbers, entry_type) = split_numbers(payload.mobile_numbers);
    let phone_button = optional_pair(
        payload.phone_button_text,
        payload.phone_button_number,
        "phone button",
    )?
    .map(|(text, number)| PhoneButton { text, number });
    let link_button = optional_pair(
        payload.link_button_text,
        payload.link_button_url,
        "link button",
    )?
    .map(|(text, url)| LinkButton { text, url });
    let media = payload.media.map(validate_media).transpose()?;

    let payer = account.username;
    let mut cmd = FundCampaignCmd::new(
        payer.clone(),
        payload.campaign_name,
        payload.message,
        payload.country_code,
        numbers,
        Utc::now(),
    );
    if let Some(button) = phone_button {
        cmd = cmd.phone_button(button);
    }
    if let Some(button) = link_button {
        cmd = cmd.link_button(button);
    }
    if let Some(media) = media {
        cmd = cmd.media(media);
    }

    let outcome = state.engine.fund_campaign(cmd).await?;
    let campaign = state.engine.campaign(outcome.campaign_id, &payer).await?;

    let utc = utc_offset()?;
    let message = funding_message(outcome.funded_count, outcome.excluded_count);
    let data = CampaignData {
        campaign_id: campaign.id,
        campaign_name: campaign.name,
        message: campaign.message,
        phone_button: campaign.phone_button.map(map_phone_button),
        link_button: campaign.link_button.map(map_link_button),
        media: campaign.media.map(map_media),
        mobile_number_entry_type: entry_type,
        requested_number_count: outcome.requested_count,
        actual_number_count: outcome.funded_count,
        points_deducted: outcome.points_deducted,
        remaining_balance: outcome.remaining_balance,
        country_code: campaign.country_code,
        created_at: campaign.created_at.with_timezone(&utc),
        transaction_id: outcome.transaction_id,
    };

    Ok((
        StatusCode::CREATED,
        Json(CampaignCreated {
            success: true,
            message,
            data,
        }),
    ))
}

pub async fn list(
    Extension(account): Extension<engine::Account>,
    State(state): State<ServerState>,
    Json(payload): Json<CampaignList>,
) -> Result<Json<CampaignListResponse>, ServerError> {
    let limit = payload.limit.unwrap_or(50);
    let (campaigns, next_cursor) = state
        .engine
        .list_campaigns_page(&account.username, limit, payload.cursor.as_deref())
        .await?;

    let utc = utc_offset()?;
    Ok(Json(CampaignListResponse {
        campaigns: campaigns
            .into_iter()
            .map(|campaign| map_campaign(campaign, utc))
            .collect(),
        next_cursor,
    }))
}

pub async fn get_detail(
    Extension(account): Extension<engine::Account>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignView>, ServerError> {
    let campaign = state.engine.campaign(id, &account.username).await?;
    let utc = utc_offset()?;
    Ok(Json(map_campaign(campaign, utc)))
}
