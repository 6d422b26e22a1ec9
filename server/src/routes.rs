use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use jedigpt::{ask_jedi, Client};
use serde_json::json;
use shared::{CompletionRequest, CompletionResponse, JEDI_ROUTE};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

const UPSTREAM_ERROR: &str = "Error calling AOAI";
const EMPTY_PROMPT_ERROR: &str = "Prompt must not be empty";
const INVALID_BODY_ERROR: &str = "Invalid request body";

#[derive(Clone)]
pub(crate) struct AppState {
    client: Client,
}

pub(crate) fn router(client: Client) -> Router {
    let cors = CorsLayer::new()
        // allow `GET` and `POST` when accessing the resource
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        // allow requests from any origin
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health))
        .route(JEDI_ROUTE, post(ask))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(AppState { client })
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

type JediResponse = (StatusCode, Json<CompletionResponse>);

fn bad_request(error: &str, details: Option<String>) -> JediResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(CompletionResponse::error(
            error,
            details.map(serde_json::Value::String),
        )),
    )
}

async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<CompletionRequest>, JsonRejection>,
) -> JediResponse {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(%rejection, "Rejected request body");
            return bad_request(INVALID_BODY_ERROR, Some(rejection.to_string()));
        }
    };

    let Some(prompt) = request.non_blank_prompt() else {
        warn!("Rejected empty prompt");
        return bad_request(EMPTY_PROMPT_ERROR, None);
    };

    info!(prompt_len = prompt.len(), "Received prompt");

    match ask_jedi(&state.client, prompt).await {
        Ok(reply) => (StatusCode::OK, Json(CompletionResponse::reply(reply))),
        Err(e) => {
            error!(error = %e, "Error calling AOAI");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CompletionResponse::error(UPSTREAM_ERROR, Some(e.details()))),
            )
        }
    }
}
