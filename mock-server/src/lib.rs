use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

/// Body of a GraphQL call.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: Option<Value>,
}

/// One widget analytics beacon as received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnalyticsHit {
    pub kind: String,
    pub params: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MockState {
    /// Upserted users keyed by `(accountId, userId)`.
    pub users: HashMap<(String, String), Value>,
    pub events: Vec<Value>,
    pub analytics: Vec<AnalyticsHit>,
}

pub type Db = Arc<RwLock<MockState>>;

pub fn app() -> Router {
    app_with_state(Db::default())
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/api/v1/{tenant}/graphql", post(graphql))
        .route(
            "/api/v1/{tenant}/open/account/{account_id}/user/{user_id}",
            put(user_upsert),
        )
        .route(
            "/api/v1/{tenant}/widget/account/{account_id}/user/{user_id}/upsert",
            put(widget_upsert),
        )
        .route(
            "/api/v1/{tenant}/open/account/{account_id}/user/{user_id}/events",
            post(log_user_event),
        )
        .route("/a/{tenant}/widgets/analytics/{kind}", post(widget_analytics))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, Db::default()).await
}

pub async fn run_with_state(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(db)).await
}

/// The widget HTML the server renders for a widget type and locale.
pub fn widget_template(widget_type: &str, locale: &str) -> String {
    format!(
        "<html><head><title>widget</title></head><body data-widget-type=\"{widget_type}\" data-locale=\"{locale}\"></body></html>"
    )
}

fn require_bearer(headers: &HeaderMap) -> Result<(), StatusCode> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if token.trim().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

async fn graphql(Path(tenant): Path<String>, Json(input): Json<GraphQLRequest>) -> Json<Value> {
    debug!(%tenant, operation = ?input.operation_name, "graphql");
    let variables = input.variables.unwrap_or(Value::Null);
    if input.query.contains("renderWidget") {
        let widget_type = variables["widgetType"].as_str().unwrap_or("w/default");
        let locale = variables["locale"].as_str().unwrap_or_default();
        return Json(json!({
            "data": {"renderWidget": {"template": widget_template(widget_type, locale)}}
        }));
    }
    if input.query.trim() == "{ping}" {
        return Json(json!({"data": {"ping": "pong"}}));
    }
    Json(json!({"errors": [{"message": "Unknown query"}]}))
}

async fn user_upsert(
    State(db): State<Db>,
    Path((_tenant, account_id, user_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(user): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    require_bearer(&headers)?;
    db.write().await.users.insert((account_id, user_id), user.clone());
    Ok(Json(user))
}

async fn widget_upsert(
    State(db): State<Db>,
    Path((_tenant, account_id, user_id)): Path<(String, String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(user): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    require_bearer(&headers)?;
    db.write().await.users.insert((account_id, user_id), user.clone());
    let widget_type = params.get("widgetType").map(String::as_str).unwrap_or("w/default");
    Ok(Json(json!({
        "user": user,
        "template": widget_template(widget_type, ""),
    })))
}

async fn log_user_event(
    State(db): State<Db>,
    Path((_tenant, _account_id, _user_id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(event): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    require_bearer(&headers)?;
    db.write().await.events.push(event.clone());
    Ok(Json(event))
}

async fn widget_analytics(
    State(db): State<Db>,
    Path((_tenant, kind)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    require_bearer(&headers)?;
    if kind != "loaded" && kind != "shared" {
        return Err(StatusCode::NOT_FOUND);
    }
    db.write().await.analytics.push(AnalyticsHit { kind, params });
    Ok(StatusCode::OK)
}
