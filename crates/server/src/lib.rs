use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::{run, run_with_listener, spawn_with_listener};

mod accounts;
mod campaigns;
mod journal;
mod server;

pub mod types {
    pub mod account {
        pub use api_types::account::{AccountNew, AccountView, CreditGranted, CreditNew};
    }

    pub mod campaign {
        pub use api_types::campaign::{
            CampaignCreated, CampaignData, CampaignList, CampaignListResponse, CampaignNew,
            CampaignView, MediaDescriptor, MobileNumbers,
        };
    }

    pub mod journal {
        pub use api_types::journal::{JournalEntryView, JournalList, JournalListResponse};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) | EngineError::BalanceConflict(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InsufficientBalance(_)
        | EngineError::InvalidArgument(_)
        | EngineError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::InsufficientBalance(account) => {
            format!("Insufficient balance: {account} has no points left")
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
