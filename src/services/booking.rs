use chrono::NaiveDate;
use serde::Serialize;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{BookingRequest, BookingValidationError};
use crate::services::format::{format_sheet_time, format_submission_date, phone_suffix};
use crate::services::sheet::{SheetClient, SheetFields, SheetWrite};
use crate::services::whatsapp;

#[derive(Debug, Serialize)]
pub struct SubmissionOutcome {
    /// Whether the sheet accepted the row. WhatsApp is the confirmation
    /// channel either way.
    pub saved: bool,
    pub total: f64,
    pub sheet_date: String,
    pub sheet_time: String,
    pub whatsapp_url: String,
    pub message: String,
}

/// Sheet row for a new booking: formatted date and time, payment pending.
pub fn sheet_fields(
    req: &BookingRequest,
    total: f64,
) -> Result<SheetFields, BookingValidationError> {
    let date = format_submission_date(&req.date)
        .ok_or_else(|| BookingValidationError::InvalidDate(req.date.clone()))?;

    Ok(SheetFields {
        name: req.name.trim().to_string(),
        phone: req.clean_phone(),
        bus: req.bus.trim().to_string(),
        time: format_sheet_time(&req.departure_time()),
        date,
        pickup: req.from.trim().to_string(),
        destination: req.to.trim().to_string(),
        male_seats: req.male_seats.to_string(),
        female_seats: req.female_seats.to_string(),
        payment: "Pending".to_string(),
        total: total.to_string(),
        status: None,
    })
}

pub async fn submit_booking(
    sheet: &dyn SheetClient,
    config: &AppConfig,
    req: &BookingRequest,
    today: NaiveDate,
) -> Result<SubmissionOutcome, AppError> {
    req.validate(today)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let total = req.total().ok_or_else(|| {
        AppError::Validation(BookingValidationError::UnknownBus(req.bus.clone()).to_string())
    })?;
    let fields = sheet_fields(req, total).map_err(|e| AppError::Validation(e.to_string()))?;

    let text = whatsapp::booking_message(req, &fields.time, total, &config.bank.bank_name);
    let whatsapp_url = whatsapp::chat_link(&config.admin_whatsapp_number, &text)
        .map_err(|e| AppError::Config(e.to_string()))?;

    let sheet_date = fields.date.clone();
    let sheet_time = fields.time.clone();
    let suffix = phone_suffix(&fields.phone);

    let saved = match sheet.write(&SheetWrite::Add(fields)).await {
        Ok(()) => {
            tracing::info!(
                phone_suffix = %suffix,
                bus = %req.bus,
                total,
                "booking submitted to sheet"
            );
            true
        }
        Err(e) => {
            tracing::warn!(
                phone_suffix = %suffix,
                error = %e,
                "could not save booking, falling back to WhatsApp"
            );
            false
        }
    };

    let message = if saved {
        "Submitted! Please complete the payment on WhatsApp.".to_string()
    } else {
        "We could not auto-save your booking, but you can still complete it via WhatsApp."
            .to_string()
    };

    Ok(SubmissionOutcome {
        saved,
        total,
        sheet_date,
        sheet_time,
        whatsapp_url,
        message,
    })
}
