use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{accounts, campaigns, journal};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(auth_header) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let account = state
        .engine
        .account_with_credentials(auth_header.username(), auth_header.password())
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(account) = account else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/campaigns", post(campaigns::create).get(campaigns::list))
        .route("/campaigns/{id}", get(campaigns::get_detail))
        .route("/transactions", get(journal::list))
        .route("/account", get(accounts::get))
        .route("/accounts", post(accounts::create))
        .route("/credits", post(accounts::credit))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};
    use base64::Engine as _;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use migration::MigratorTrait;
    use sea_orm::{ConnectionTrait, Database, Statement};
    use tower::ServiceExt;

    use api_types::campaign::CampaignCreated;
    use engine::{AccountRole, NewAccountCmd};

    async fn test_router() -> Router {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let backend = db.get_database_backend();
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO accounts (username, password, role, balance, campaign_count, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
            vec![
                "root".into(),
                "password".into(),
                "admin".into(),
                0i64.into(),
                0i64.into(),
                Utc::now().into(),
            ],
        ))
        .await
        .unwrap();

        let engine = Engine::builder().database(db).build().await.unwrap();
        engine
            .create_account(
                NewAccountCmd::new("root", "acme", "secret", AccountRole::User, Utc::now())
                    .balance(7),
            )
            .await
            .unwrap();

        router(ServerState {
            engine: Arc::new(engine),
        })
    }

    fn basic_auth(username: &str, password: &str) -> String {
        let encoded =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        format!("Basic {encoded}")
    }

    fn post_campaign(auth: &str, body: serde_json::Value) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/campaigns")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, auth)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_missing_credentials() {
        let router = test_router().await;
        let response = router
            .oneshot(
                HttpRequest::builder()
                    .uri("/account")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_wrong_credentials() {
        let router = test_router().await;
        let response = router
            .oneshot(
                HttpRequest::builder()
                    .uri("/account")
                    .header(header::AUTHORIZATION, basic_auth("acme", "wrong"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn partial_funding_returns_created_with_counts() {
        let router = test_router().await;
        let body = serde_json::json!({
            "campaign_name": "Spring sale",
            "message": "50% off this week",
            "country_code": "+39",
            "mobile_numbers": "1,2,3,4,5,6,7,8,9,10",
        });

        let response = router
            .oneshot(post_campaign(&basic_auth("acme", "secret"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let created: CampaignCreated = serde_json::from_slice(&bytes).unwrap();
        assert!(created.success);
        assert!(created.message.contains("3 numbers were excluded"));
        assert_eq!(created.data.requested_number_count, 10);
        assert_eq!(created.data.actual_number_count, 7);
        assert_eq!(created.data.points_deducted, 7);
        assert_eq!(created.data.remaining_balance, 0);
    }

    #[tokio::test]
    async fn zero_balance_maps_to_bad_request() {
        let router = test_router().await;

        // Drain the balance first.
        let drain = serde_json::json!({
            "campaign_name": "Drain",
            "message": "use up all points",
            "country_code": "+39",
            "mobile_numbers": "1,2,3,4,5,6,7",
        });
        let response = router
            .clone()
            .oneshot(post_campaign(&basic_auth("acme", "secret"), drain))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = serde_json::json!({
            "campaign_name": "Spring sale",
            "message": "50% off this week",
            "country_code": "+39",
            "mobile_numbers": ["111", "222"],
        });
        let response = router
            .oneshot(post_campaign(&basic_auth("acme", "secret"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let error: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(
            error["error"]
                .as_str()
                .unwrap()
                .starts_with("Insufficient balance")
        );
    }

    #[tokio::test]
    async fn oversized_media_is_rejected_before_funding() {
        let router = test_router().await;
        let body = serde_json::json!({
            "campaign_name": "Spring sale",
            "message": "50% off this week",
            "country_code": "+39",
            "mobile_numbers": ["111"],
            "media": {
                "url": "https://cdn.example/banner.png",
                "filename": "banner.png",
                "size_bytes": 6 * 1024 * 1024,
                "mime_type": "image/png",
            },
        });

        let response = router
            .clone()
            .oneshot(post_campaign(&basic_auth("acme", "secret"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Nothing was funded: the whole balance is still available.
        let response = router
            .oneshot(
                HttpRequest::builder()
                    .uri("/account")
                    .header(header::AUTHORIZATION, basic_auth("acme", "secret"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let view: api_types::account::AccountView = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(view.balance, 7);
    }

    #[tokio::test]
    async fn unsupported_mime_type_is_rejected() {
        let router = test_router().await;
        let body = serde_json::json!({
            "campaign_name": "Spring sale",
            "message": "50% off this week",
            "country_code": "+39",
            "mobile_numbers": ["111"],
            "media": {
                "url": "https://cdn.example/app.zip",
                "filename": "app.zip",
                "size_bytes": 1024,
                "mime_type": "application/zip",
            },
        });

        let response = router
            .oneshot(post_campaign(&basic_auth("acme", "secret"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn half_specified_phone_button_is_rejected() {
        let router = test_router().await;
        let body = serde_json::json!({
            "campaign_name": "Spring sale",
            "message": "50% off this week",
            "country_code": "+39",
            "mobile_numbers": ["111"],
            "phone_button_text": "Call us",
        });

        let response = router
            .oneshot(post_campaign(&basic_auth("acme", "secret"), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
