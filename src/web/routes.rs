//! REST endpoints for the compliance-check flow.
//!
//! Identity is established by the fronting OIDC proxy, which forwards the
//! signed-in user and their granted delegated scopes in trusted headers.
//! Both compliance endpoints (the interactive POST trigger and the GET
//! return leg of the consent redirect) converge on the same orchestrator
//! call; a consent challenge coming back out is answered with a redirect
//! into the interactive grant.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use crate::analysis::ComplianceRequest;
use crate::auth::{ConsentChallenge, Principal, PrincipalAuthGate};
use crate::compliance::{ComplianceOrchestrator, ComplianceView};

/// Header carrying the signed-in user's display name.
const USER_HEADER: &str = "x-auth-user";

/// Header carrying the space-separated granted delegated scopes.
const SCOPES_HEADER: &str = "x-auth-scopes";

/// Shared state for the compliance routes.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ComplianceOrchestrator>,
    /// Where to send the user to grant missing delegated scopes.
    pub consent_url: String,
    /// File analyzed when the trigger carries no explicit request body.
    pub default_file: String,
}

/// Build the Axum router for the compliance flow.
pub fn compliance_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/auth/consent", get(grant_consent))
        .route("/compliance/run", get(run_redirect_leg).post(run_trigger))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "compliance-assist"
    }))
}

// ── Index ───────────────────────────────────────────────────────────

/// GET /
///
/// Landing state: sign-in prompt for anonymous requests; for signed-in
/// users, a consent prompt. Scopes are actually verified when a run is
/// triggered.
async fn index(headers: HeaderMap) -> impl IntoResponse {
    match principal_from_headers(&headers) {
        None => {
            info!("User not authenticated, showing sign-in interface");
            Json(ComplianceView::sign_in_required())
        }
        Some(principal) => {
            info!(user = %principal.name, "User authenticated");
            Json(ComplianceView::consent_pending(principal.name))
        }
    }
}

// ── Consent ─────────────────────────────────────────────────────────

/// GET /auth/consent
///
/// Return leg of the interactive consent grant; the proxy has updated the
/// scope headers by the time the user lands here.
async fn grant_consent(headers: HeaderMap) -> impl IntoResponse {
    let user = principal_from_headers(&headers).map(|p| p.name);
    info!(user = user.as_deref().unwrap_or("unknown"), "Consent granted");
    Redirect::to("/")
}

// ── Compliance runs ─────────────────────────────────────────────────

/// POST /compliance/run
///
/// The interactive, state-changing trigger.
async fn run_trigger(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<ComplianceRequest>>,
) -> Response {
    let request = match body {
        Some(Json(request)) => request,
        None => ComplianceRequest::new(state.default_file.clone()),
    };
    process(state, headers, request).await
}

/// GET /compliance/run
///
/// The return leg after an interactive consent grant.
async fn run_redirect_leg(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let request = ComplianceRequest::new(state.default_file.clone());
    process(state, headers, request).await
}

async fn process(
    state: AppState,
    headers: HeaderMap,
    request: ComplianceRequest,
) -> Response {
    let gate = PrincipalAuthGate::new(principal_from_headers(&headers));

    match state.orchestrator.run(&gate, request).await {
        Ok(view) => Json(view).into_response(),
        Err(challenge) => {
            // 303 into the interactive grant; the user re-enters via the GET leg.
            Redirect::to(&consent_redirect_url(&state.consent_url, &challenge)).into_response()
        }
    }
}

/// Target of the consent redirect, carrying the scopes to request.
fn consent_redirect_url(consent_url: &str, challenge: &ConsentChallenge) -> String {
    format!("{consent_url}?scope={}", challenge.scopes().join("+"))
}

// ── Principal extraction ────────────────────────────────────────────

fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let name = headers
        .get(USER_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .to_string();
    if name.is_empty() {
        return None;
    }

    let scopes: Vec<String> = headers
        .get(SCOPES_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();

    Some(Principal::new(name).with_scopes(scopes))
}
