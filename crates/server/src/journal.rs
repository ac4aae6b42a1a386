//! Journal API endpoints

use api_types::journal::{
    EntryKind as ApiEntryKind, EntryStatus as ApiEntryStatus, JournalEntryView, JournalList,
    JournalListResponse,
};
use axum::{Extension, Json, extract::State};
use chrono::{FixedOffset, Utc};

use crate::{ServerError, server::ServerState};
use engine::{EntryKind, EntryStatus, JournalListFilter};

fn map_kind(kind: EntryKind) -> ApiEntryKind {
    match kind {
        EntryKind::Credit => ApiEntryKind::Credit,
        EntryKind::Debit => ApiEntryKind::Debit,
    }
}

fn map_status(status: EntryStatus) -> ApiEntryStatus {
    match status {
        EntryStatus::Success => ApiEntryStatus::Success,
        EntryStatus::Failed => ApiEntryStatus::Failed,
    }
}

pub async fn list(
    Extension(account): Extension<engine::Account>,
    State(state): State<ServerState>,
    Json(payload): Json<JournalList>,
) -> Result<Json<JournalListResponse>, ServerError> {
    let limit = payload.limit.unwrap_or(50);
    let account_id = payload
        .account_id
        .unwrap_or_else(|| account.username.clone());

    let filter = JournalListFilter {
        from: payload.from.map(|dt| dt.with_timezone(&Utc)),
        to: payload.to.map(|dt| dt.with_timezone(&Utc)),
        kinds: payload.kinds.map(|kinds| {
            kinds
                .into_iter()
                .map(|kind| match kind {
                    ApiEntryKind::Credit => EntryKind::Credit,
                    ApiEntryKind::Debit => EntryKind::Debit,
                })
                .collect()
        }),
    };

    let (entries, next_cursor) = state
        .engine
        .list_journal_page(
            &account_id,
            &account.username,
            limit,
            payload.cursor.as_deref(),
            &filter,
        )
        .await?;

    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    let entries = entries
        .into_iter()
        .map(|entry| JournalEntryView {
            id: entry.id,
            kind: map_kind(entry.kind),
            status: map_status(entry.status),
            amount: entry.amount,
            balance_before: entry.balance_before,
            balance_after: entry.balance_after,
            campaign_id: entry.campaign_id,
            counterparty: entry.counterparty,
            created_at: entry.created_at.with_timezone(&utc),
        })
        .collect();

    Ok(Json(JournalListResponse {
        entries,
        next_cursor,
    }))
}
