//! Account API endpoints

use api_types::AccountRole as ApiRole;
use api_types::account::{AccountNew, AccountView, CreditGranted, CreditNew};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::{FixedOffset, Utc};

use crate::{ServerError, server::ServerState};
use engine::{Account, AccountRole, GrantPointsCmd, NewAccountCmd};

fn map_role(role: AccountRole) -> ApiRole {
    match role {
        AccountRole::Admin => ApiRole::Admin,
        AccountRole::Reseller => ApiRole::Reseller,
        AccountRole::User => ApiRole::User,
    }
}

fn map_account(account: Account) -> Result<AccountView, ServerError> {
    let utc = FixedOffset::east_opt(0)
        .ok_or_else(|| ServerError::Generic("invalid UTC offset".to_string()))?;
    Ok(AccountView {
        username: account.username,
        role: map_role(account.role),
        balance: account.balance,
        campaign_count: account.campaign_count,
        created_by: account.created_by,
        created_at: account.created_at.with_timezone(&utc),
    })
}

/// Returns the authenticated caller's own account view.
///
/// The auth middleware already resolved the account, but balances move under
/// concurrent requests, so re-read instead of echoing the extension.
pub async fn get(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account(&account.username).await?;
    Ok(Json(map_account(account)?))
}

pub async fn create(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let role = match payload.role {
        ApiRole::Admin => AccountRole::Admin,
        ApiRole::Reseller => AccountRole::Reseller,
        ApiRole::User => AccountRole::User,
    };

    let mut cmd = NewAccountCmd::new(
        account.username,
        payload.username,
        payload.password,
        role,
        Utc::now(),
    );
    if let Some(balance) = payload.balance {
        cmd = cmd.balance(balance);
    }

    let created = state.engine.create_account(cmd).await?;
    Ok((StatusCode::CREATED, Json(map_account(created)?)))
}

pub async fn credit(
    Extension(account): Extension<Account>,
    State(state): State<ServerState>,
    Json(payload): Json<CreditNew>,
) -> Result<(StatusCode, Json<CreditGranted>), ServerError> {
    let outcome = state
        .engine
        .grant_points(GrantPointsCmd::new(
            account.username,
            payload.receiver,
            payload.amount,
            Utc::now(),
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreditGranted {
            debit_id: outcome.debit_id,
            credit_id: outcome.credit_id,
            grantor_balance: outcome.grantor_balance,
            receiver_balance: outcome.receiver_balance,
        }),
    ))
}
