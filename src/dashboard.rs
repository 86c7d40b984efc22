use axum::{Json, extract::State, http::StatusCode};
use time::Date;
use tower_sessions::Session;

use crate::accounts::list_accounts;
use crate::app::AppState;
use crate::auth::get_current_user;
use crate::database::Db;
use crate::reporting::{DashboardSummary, build_dashboard};
use crate::transactions::load_ledger;
use crate::utils::{ApiResult, get_user_database, today};

/// Loads the ledger and accounts in full, then aggregates in memory.
pub async fn compute_dashboard(db: &Db, today: Date) -> ApiResult<DashboardSummary> {
    let ledger = load_ledger(db).await?;
    let accounts = list_accounts(db).await?;

    build_dashboard(&ledger, &accounts, today).map_err(|e| {
        tracing::warn!(error = %e, "ledger snapshot rejected by aggregation");
        (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    })
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<(StatusCode, Json<DashboardSummary>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let summary = compute_dashboard(&user_db, today()).await?;
    Ok((StatusCode::OK, Json(summary)))
}
