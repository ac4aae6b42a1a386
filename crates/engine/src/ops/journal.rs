//! Journal reads with cursor-based pagination.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};

use crate::{AccountRole, EngineError, EntryKind, JournalEntry, ResultEngine, journal};

use super::{Engine, with_tx};

/// Filters for listing journal entries.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct JournalListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<EntryKind>>,
}

fn validate_list_filter(filter: &JournalListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidArgument(
            "invalid range: from must be < to".to_string(),
        ));
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(EngineError::InvalidArgument(
            "kinds must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct JournalCursor {
    created_at: DateTime<Utc>,
    entry_id: String,
}

impl JournalCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid journal cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid journal cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid journal cursor".to_string()))
    }
}

impl Engine {
    /// Lists journal entries for an account, with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(created_at DESC, id DESC)`. The
    /// actor must be the account itself, its creator, or an admin.
    pub async fn list_journal_page(
        &self,
        account_id: &str,
        actor_id: &str,
        limit: u64,
        cursor: Option<&str>,
        filter: &JournalListFilter,
    ) -> ResultEngine<(Vec<JournalEntry>, Option<String>)> {
        with_tx!(self, |db_tx| {
            let account = self.require_account(&db_tx, account_id).await?;
            if actor_id != account.username {
                let actor = self.require_account(&db_tx, actor_id).await?;
                let allowed = actor.role == AccountRole::Admin
                    || account.created_by.as_deref() == Some(actor.username.as_str());
                if !allowed {
                    return Err(EngineError::KeyNotFound("account not exists".to_string()));
                }
            }
            validate_list_filter(filter)?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = journal::Entity::find()
                .filter(journal::Column::AccountId.eq(account_id.to_string()))
                .order_by_desc(journal::Column::CreatedAt)
                .order_by_desc(journal::Column::Id)
                .limit(limit_plus_one);

            if let Some(cursor) = cursor {
                let cursor = JournalCursor::decode(cursor)?;
                query = query.filter(
                    Condition::any()
                        .add(journal::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(journal::Column::CreatedAt.eq(cursor.created_at))
                                .add(journal::Column::Id.lt(cursor.entry_id)),
                        ),
                );
            }
            if let Some(from) = filter.from {
                query = query.filter(journal::Column::CreatedAt.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(journal::Column::CreatedAt.lt(to));
            }
            if let Some(kinds) = &filter.kinds {
                let kinds: Vec<String> = kinds.iter().map(|k| k.as_str().to_string()).collect();
                query = query.filter(journal::Column::Kind.is_in(kinds));
            }

            let rows: Vec<journal::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() > limit as usize;

            let mut out: Vec<JournalEntry> = Vec::with_capacity(rows.len().min(limit as usize));
            for model in rows.into_iter().take(limit as usize) {
                out.push(JournalEntry::try_from(model)?);
            }

            let next_cursor = out.last().map(|entry| JournalCursor {
                created_at: entry.created_at,
                entry_id: entry.id.to_string(),
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
