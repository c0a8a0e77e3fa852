use chrono::FixedOffset;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{BookingRecord, BookingStatus};
use crate::services::format::{format_amount, format_display_date, format_sheet_time, phone_suffix};
use crate::services::sheet::{SheetClient, SheetQuery};

/// What the passenger sees after a status lookup.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TicketView {
    pub booking_id: String,
    pub name: String,
    pub phone: String,
    pub bus: String,
    pub route: String,
    pub date: String,
    pub time: String,
    pub seats: String,
    pub payment: String,
    pub paid: bool,
    pub total: f64,
    pub total_display: String,
    pub status: BookingStatus,
}

fn or_dash(s: &str) -> String {
    if s.trim().is_empty() {
        "-".to_string()
    } else {
        s.trim().to_string()
    }
}

fn seat_label(s: &str) -> &str {
    if s.trim().is_empty() {
        "0"
    } else {
        s.trim()
    }
}

pub fn ticket_view(rec: &BookingRecord, offset: &FixedOffset) -> TicketView {
    let route = if rec.pickup.trim().is_empty() || rec.destination.trim().is_empty() {
        "-".to_string()
    } else {
        format!("{} → {}", rec.pickup.trim(), rec.destination.trim())
    };
    let payment = rec.payment.to_lowercase();
    let time = format_sheet_time(&rec.time);

    TicketView {
        booking_id: rec.booking_id.clone().unwrap_or_else(|| "PENDING".to_string()),
        name: if rec.name.trim().is_empty() {
            "Guest".to_string()
        } else {
            rec.name.trim().to_string()
        },
        phone: or_dash(&rec.phone),
        bus: or_dash(&rec.bus),
        route,
        date: format_display_date(&rec.date, offset),
        time: or_dash(&time),
        seats: format!("{}M • {}F", seat_label(&rec.male_seats), seat_label(&rec.female_seats)),
        payment: rec.payment.clone(),
        paid: payment.contains("paid") && !payment.contains("unpaid"),
        total: rec.total,
        total_display: format!("LKR {}", format_amount(rec.total)),
        status: rec.status,
    }
}

/// Search the sheet by the last nine digits of `phone`.
pub async fn find_booking(sheet: &dyn SheetClient, phone: &str) -> Result<BookingRecord, AppError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 9 {
        return Err(AppError::Validation(
            "Please enter a valid phone number (e.g., 0771234567).".to_string(),
        ));
    }
    let suffix = phone_suffix(phone);

    let envelope = sheet
        .read(&SheetQuery::Search {
            phone_suffix: suffix.clone(),
        })
        .await
        .map_err(|e| {
            tracing::error!(phone_suffix = %suffix, error = %e, "booking lookup failed");
            AppError::remote(e)
        })?;

    envelope.into_booking().ok_or_else(|| {
        tracing::info!(phone_suffix = %suffix, "no booking found");
        AppError::NotFound(format!("no booking found for ...{suffix}"))
    })
}
