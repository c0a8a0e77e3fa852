use std::sync::{Arc, MutexGuard, PoisonError};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::dashboard::{
    self, AdminBooking, BookingEdit, BookingKey, Dashboard, DashboardFilter, Quote, Totals, View,
};
use crate::services::sheet::SheetWrite;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn dashboard_lock(state: &AppState) -> MutexGuard<'_, Dashboard> {
    state
        .dashboard
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Refetch both sheets when forced, never loaded, or stale after a failed write.
async fn ensure_loaded(state: &AppState, force: bool) -> Result<(), AppError> {
    if !force && !dashboard_lock(state).needs_refresh() {
        return Ok(());
    }

    let fresh = dashboard::fetch_dashboard(state.sheet.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "could not fetch booking data");
            AppError::remote(e)
        })?;
    *dashboard_lock(state) = fresh;
    Ok(())
}

/// Local state is already updated; a failed write only flags it for refetch.
async fn write_through(state: &AppState, write: SheetWrite) -> Result<(), AppError> {
    let method = write.method();
    if let Err(e) = state.sheet.write(&write).await {
        tracing::error!(method, error = %e, "sheet write failed, dashboard marked stale");
        dashboard_lock(state).mark_stale();
        return Err(AppError::remote(e));
    }
    tracing::info!(method, "sheet write dispatched");
    Ok(())
}

fn require_addressable(key: &BookingKey) -> Result<(), AppError> {
    if !key.is_addressable() {
        return Err(AppError::Validation(
            "booking needs an id or a row number".to_string(),
        ));
    }
    Ok(())
}

// GET /api/admin/dashboard
#[derive(Deserialize)]
pub struct DashboardQuery {
    pub view: Option<View>,
    pub q: Option<String>,
    pub date: Option<String>,
    pub refresh: Option<bool>,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    view: View,
    bookings: Vec<AdminBooking>,
    totals: Totals,
    stale: bool,
}

pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    ensure_loaded(&state, query.refresh.unwrap_or(false)).await?;

    let view = query.view.unwrap_or_default();
    let filter = DashboardFilter {
        q: query.q,
        date: query.date,
    };
    let offset = state.config.display_offset();

    let d = dashboard_lock(&state);
    Ok(Json(DashboardResponse {
        view,
        bookings: d.filtered(view, &filter, &offset),
        totals: d.totals(),
        stale: d.is_stale(),
    }))
}

#[derive(Serialize)]
pub struct MutationResponse {
    ok: bool,
    booking: AdminBooking,
}

// POST /api/admin/bookings/approve
pub async fn approve_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<BookingKey>, JsonRejection>,
) -> Result<Json<MutationResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(key) = payload?;
    require_addressable(&key)?;
    ensure_loaded(&state, false).await?;

    let approved = dashboard_lock(&state)
        .approve(&key)
        .ok_or_else(|| AppError::NotFound("pending booking".to_string()))?;

    write_through(&state, SheetWrite::Approve(approved.row_ref())).await?;

    Ok(Json(MutationResponse {
        ok: true,
        booking: approved,
    }))
}

// POST /api/admin/bookings/update
#[derive(Deserialize)]
pub struct UpdateRequest {
    pub key: BookingKey,
    pub changes: BookingEdit,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(body) = payload?;
    require_addressable(&body.key)?;
    ensure_loaded(&state, false).await?;

    let updated = dashboard_lock(&state)
        .apply_edit(&body.key, &body.changes)
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    let fields = dashboard::edit_fields(&updated.record, &state.config.display_offset());
    write_through(&state, SheetWrite::Update(updated.row_ref(), fields)).await?;

    Ok(Json(MutationResponse {
        ok: true,
        booking: updated,
    }))
}

// POST /api/admin/bookings/delete
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<BookingKey>, JsonRejection>,
) -> Result<Json<MutationResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(key) = payload?;
    require_addressable(&key)?;
    ensure_loaded(&state, false).await?;

    let removed = dashboard_lock(&state)
        .remove(&key)
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;

    write_through(&state, SheetWrite::Delete(removed.row_ref())).await?;

    Ok(Json(MutationResponse {
        ok: true,
        booking: removed,
    }))
}

// POST /api/admin/quote
#[derive(Deserialize)]
pub struct QuoteRequest {
    pub bus: String,
    #[serde(default)]
    pub male_seats: String,
    #[serde(default)]
    pub female_seats: String,
}

pub async fn quote_total(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> Result<Json<Quote>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let Json(body) = payload?;

    dashboard::quote(&body.bus, &body.male_seats, &body.female_seats)
        .map(Json)
        .map_err(|e| AppError::Validation(e.to_string()))
}
