use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::BankDetails;
use crate::errors::AppError;
use crate::models::catalog::{self, BusService};
use crate::models::BookingRequest;
use crate::services::booking::{self, SubmissionOutcome};
use crate::services::lookup::{self, TicketView};
use crate::state::AppState;

// GET /api/catalog
#[derive(Serialize)]
pub struct CatalogResponse {
    buses: &'static [BusService],
    cities: &'static [&'static str],
    payment: PaymentDetails,
}

#[derive(Serialize)]
pub struct PaymentDetails {
    bank_name: String,
    account_name: String,
    account_number: String,
    branch: String,
    reference: &'static str,
}

impl From<&BankDetails> for PaymentDetails {
    fn from(bank: &BankDetails) -> Self {
        Self {
            bank_name: bank.bank_name.clone(),
            account_name: bank.account_name.clone(),
            account_number: bank.account_number.clone(),
            branch: bank.branch.clone(),
            reference: "Your Name + Phone",
        }
    }
}

pub async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        buses: catalog::BUS_SERVICES,
        cities: catalog::CITIES,
        payment: PaymentDetails::from(&state.config.bank),
    })
}

// POST /api/bookings
#[derive(Serialize)]
pub struct CreateBookingResponse {
    #[serde(flatten)]
    outcome: SubmissionOutcome,
    payment: PaymentDetails,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    let Json(body) = payload?;
    let today = Utc::now()
        .with_timezone(&state.config.display_offset())
        .date_naive();

    let outcome = booking::submit_booking(state.sheet.as_ref(), &state.config, &body, today).await?;

    Ok(Json(CreateBookingResponse {
        outcome,
        payment: PaymentDetails::from(&state.config.bank),
    }))
}

// GET /api/bookings/status?phone=
#[derive(Deserialize)]
pub struct StatusQuery {
    pub phone: String,
}

pub async fn booking_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<TicketView>, AppError> {
    let record = lookup::find_booking(state.sheet.as_ref(), &query.phone).await?;
    Ok(Json(lookup::ticket_view(&record, &state.config.display_offset())))
}
