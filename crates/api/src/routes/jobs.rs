//! Manually triggered jobs.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

use lifecycle::{ReEngagement, SweepReport};

use crate::auth;
use crate::error::Result;
use crate::sender::GatewaySender;
use crate::state::AppState;

/// Run one re-engagement sweep and return what it did.
///
/// The sweep is externally triggered by design: a scheduler (or an
/// admin) calls this endpoint; nothing in the process self-schedules.
pub async fn reengage(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SweepReport>> {
    auth::check(&headers, &state.api_token)?;

    let sweep = ReEngagement::new(
        state.db.clone(),
        GatewaySender::new(state.gateway.clone()),
        state.reengage.clone(),
    );

    let report = sweep.run().await?;
    Ok(Json(report))
}
