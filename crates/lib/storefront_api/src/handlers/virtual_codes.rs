//! Public virtual-code lookup.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::MaybeUser;
use crate::models::CodeLookupResponse;
use crate::services::orders;

/// `GET /api/virtual-codes/{code}`: format validity, plus status for the owner.
pub async fn lookup_handler(
    State(state): State<AppState>,
    Extension(MaybeUser(claims)): Extension<MaybeUser>,
    Path(code): Path<String>,
) -> AppResult<Json<CodeLookupResponse>> {
    let resp = orders::lookup_code(&state, claims.as_ref(), &code).await?;
    Ok(Json(resp))
}
