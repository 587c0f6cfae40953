//! Orders, the profile page and virtual-code access.

use chrono::Utc;
use storefront_core::models::claims::TokenClaims;
use storefront_core::models::order::{Order, OrderItem};
use storefront_core::orders::{code_expiries, validate_items};
use tracing::{error, info};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    CodeListResponse, CodeLookupResponse, ConfirmOrderResponse, CreateOrderResponse,
    OrderResponse, ProfileResponse, RetrievalResponse, UserResponse,
};

/// Orders per profile page unless the caller asks otherwise.
pub const DEFAULT_PAGE_LIMIT: u64 = 10;
const MAX_PAGE_LIMIT: u64 = 100;

/// Place an order and issue one `pending` code per virtual unit.
///
/// The order and its codes land together: if issuance fails the order is
/// removed again.
pub async fn place_order(
    state: &AppState,
    claims: &TokenClaims,
    items: Vec<OrderItem>,
) -> AppResult<CreateOrderResponse> {
    validate_items(&items).map_err(|code| AppError::Validation(code.into()))?;

    let now = Utc::now();
    let expiries = code_expiries(&items, now, state.config.default_code_validity_days);
    let order = state.stores.orders.create(claims.id(), items).await?;
    let codes = if order.has_virtual_items() {
        match state.codes.issue(&order.id, &expiries).await {
            Ok(codes) => codes,
            Err(e) => {
                error!(order_id = %order.id, error = %e, "issuing virtual codes failed, removing order");
                if let Err(cleanup) = state.stores.orders.delete(&order.id).await {
                    error!(order_id = %order.id, error = %cleanup, "removing order failed");
                }
                return Err(e.into());
            }
        }
    } else {
        Vec::new()
    };

    info!(order_id = %order.id, user_id = claims.id(), codes = codes.len(), "order placed");
    Ok(CreateOrderResponse {
        success: true,
        order: OrderResponse::from(&order),
        virtual_codes: codes.len(),
    })
}

/// The order, if it belongs to the caller. Someone else's order is reported
/// as missing.
async fn owned_order(state: &AppState, claims: &TokenClaims, order_id: &str) -> AppResult<Order> {
    match state.stores.orders.find(order_id).await? {
        Some(order) if order.user_id == claims.id() => Ok(order),
        _ => Err(AppError::NotFound("order-not-found".into())),
    }
}

pub async fn list_codes(
    state: &AppState,
    claims: &TokenClaims,
    order_id: &str,
) -> AppResult<CodeListResponse> {
    let order = owned_order(state, claims, order_id).await?;
    let codes = state.codes.list(&order.id, Utc::now()).await?;
    Ok(CodeListResponse {
        success: true,
        codes,
    })
}

pub async fn retrieve_code(
    state: &AppState,
    claims: &TokenClaims,
    order_id: &str,
    code_id: &str,
    idempotency_key: Option<&str>,
) -> AppResult<RetrievalResponse> {
    let order = owned_order(state, claims, order_id).await?;
    let code = state
        .codes
        .retrieve(&order.id, code_id, idempotency_key, Utc::now())
        .await?;
    Ok(RetrievalResponse {
        success: true,
        code,
    })
}

/// Confirm an order and activate its pending codes.
///
/// Activation runs on every call, so a repeat reports zero activations.
pub async fn confirm_order(state: &AppState, order_id: &str) -> AppResult<ConfirmOrderResponse> {
    let order = state
        .stores
        .orders
        .find(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order-not-found".into()))?;
    if state.stores.orders.confirm(&order.id).await? {
        info!(order_id = %order.id, "order confirmed");
    }
    let activated = state.codes.activate_order(&order.id, Utc::now()).await?;
    Ok(ConfirmOrderResponse {
        success: true,
        order_id: order.id,
        activated,
    })
}

/// Format check for any caller; status only for the owner of the code's order.
pub async fn lookup_code(
    state: &AppState,
    caller: Option<&TokenClaims>,
    code: &str,
) -> AppResult<CodeLookupResponse> {
    let mut resp = CodeLookupResponse {
        success: true,
        valid_format: storefront_core::vcode::is_valid_format(code),
        status: None,
        status_label: None,
        expiry_display: None,
    };
    let Some(claims) = caller else {
        return Ok(resp);
    };
    if !resp.valid_format {
        return Ok(resp);
    }
    let Some(found) = state.stores.codes.find_by_code(code).await? else {
        return Ok(resp);
    };
    let owns = state
        .stores
        .orders
        .find(&found.order_id)
        .await?
        .is_some_and(|order| order.user_id == claims.id());
    if owns {
        let status = found.effective_status(Utc::now());
        resp.status = Some(status);
        resp.status_label = Some(status.label());
        resp.expiry_display = Some(storefront_core::models::vcode::format_expiry_date(
            found.expiry_date,
        ));
    }
    Ok(resp)
}

/// The caller's identity and a page of their orders, newest first.
pub async fn profile(
    state: &AppState,
    claims: &TokenClaims,
    page: Option<u64>,
    limit: Option<u64>,
) -> AppResult<ProfileResponse> {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);

    let identity = state
        .stores
        .identities
        .find_by_id(claims.role().realm(), claims.id())
        .await?
        .ok_or_else(|| AppError::NotFound("user-not-found".into()))?;
    let offset = (page - 1).saturating_mul(limit);
    let orders = state
        .stores
        .orders
        .list_for_user(&identity.id, offset, limit)
        .await?;

    Ok(ProfileResponse {
        success: true,
        user: UserResponse::from(&identity),
        orders: orders.orders.iter().map(OrderResponse::from).collect(),
        count: orders.total.div_ceil(limit),
        total: orders.total,
        page,
    })
}
