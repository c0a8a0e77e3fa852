use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::BookingStatus;

/// A booking row exactly as the sheet script returns it. Every attribute can
/// show up under the sheet header spelling, the camelCase spelling, or both,
/// and values may be strings or numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Booking ID")]
    booking_id_header: Option<Value>,
    #[serde(rename = "Booking Id")]
    booking_id_alt: Option<Value>,
    #[serde(rename = "rowIndex")]
    row_index: Option<Value>,
    #[serde(rename = "Name")]
    name_header: Option<Value>,
    name: Option<Value>,
    #[serde(rename = "Phone")]
    phone_header: Option<Value>,
    phone: Option<Value>,
    #[serde(rename = "Bus")]
    bus_header: Option<Value>,
    bus: Option<Value>,
    #[serde(rename = "Date")]
    date_header: Option<Value>,
    #[serde(rename = "dateFormatted")]
    date_formatted: Option<Value>,
    #[serde(rename = "Time")]
    time_header: Option<Value>,
    time: Option<Value>,
    #[serde(rename = "Pickup")]
    pickup_header: Option<Value>,
    pickup: Option<Value>,
    #[serde(rename = "Destination")]
    destination_header: Option<Value>,
    destination: Option<Value>,
    #[serde(rename = "Male Seat")]
    male_seat_header: Option<Value>,
    #[serde(rename = "maleSeats")]
    male_seats: Option<Value>,
    #[serde(rename = "Female Seat")]
    female_seat_header: Option<Value>,
    #[serde(rename = "femaleSeats")]
    female_seats: Option<Value>,
    #[serde(rename = "Payment")]
    payment_header: Option<Value>,
    payment: Option<Value>,
    #[serde(rename = "Total")]
    total_header: Option<Value>,
    #[serde(rename = "totalAmount")]
    total_amount: Option<Value>,
    #[serde(rename = "estimatedTotal")]
    estimated_total: Option<Value>,
    #[serde(rename = "Booked Date")]
    booked_date: Option<Value>,
    #[serde(rename = "Status")]
    status_header: Option<Value>,
    status: Option<Value>,
}

/// Canonical booking, one field per concept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRecord {
    pub booking_id: Option<String>,
    pub row_index: Option<u32>,
    pub name: String,
    pub phone: String,
    pub bus: String,
    pub date: String,
    pub time: String,
    pub pickup: String,
    pub destination: String,
    /// Seat numbers ("4,5,9") or a bare count, as stored in the sheet.
    pub male_seats: String,
    pub female_seats: String,
    pub payment: String,
    pub total: f64,
    pub booked_date: Option<String>,
    pub status: BookingStatus,
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// First alias whose value renders to something non-blank.
fn first_present(aliases: &[&Option<Value>]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|v| v.as_ref())
        .map(render)
        .find(|s| !s.trim().is_empty())
}

fn first_or_default(aliases: &[&Option<Value>], default: &str) -> String {
    first_present(aliases).unwrap_or_else(|| default.to_string())
}

/// Numeric cell that may carry thousands separators ("12,500").
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Passengers in a seat cell: the non-empty comma-separated entries.
pub fn pax_count(seats: &str) -> usize {
    let s = seats.trim();
    if s.is_empty() || s == "0" {
        return 0;
    }
    s.split(',').filter(|item| !item.trim().is_empty()).count()
}

impl From<RawRecord> for BookingRecord {
    fn from(raw: RawRecord) -> Self {
        let row_index = raw
            .row_index
            .as_ref()
            .map(render)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| *v >= 1.0 && *v <= f64::from(u32::MAX))
            .map(|v| v as u32);

        let total = first_present(&[&raw.total_header, &raw.total_amount, &raw.estimated_total])
            .and_then(|s| parse_amount(&s))
            .unwrap_or(0.0);

        let status = first_present(&[&raw.status_header, &raw.status])
            .map(|s| BookingStatus::from_raw(&s))
            .unwrap_or(BookingStatus::Confirmed);

        BookingRecord {
            booking_id: first_present(&[&raw.booking_id_header, &raw.booking_id_alt])
                .map(|s| s.trim().to_string()),
            row_index,
            name: first_or_default(&[&raw.name_header, &raw.name], ""),
            phone: first_or_default(&[&raw.phone_header, &raw.phone], ""),
            bus: first_or_default(&[&raw.bus_header, &raw.bus], ""),
            date: first_or_default(&[&raw.date_header, &raw.date_formatted], ""),
            time: first_or_default(&[&raw.time_header, &raw.time], ""),
            pickup: first_or_default(&[&raw.pickup_header, &raw.pickup], ""),
            destination: first_or_default(&[&raw.destination_header, &raw.destination], ""),
            male_seats: first_or_default(&[&raw.male_seat_header, &raw.male_seats], ""),
            female_seats: first_or_default(&[&raw.female_seat_header, &raw.female_seats], ""),
            payment: first_or_default(&[&raw.payment_header, &raw.payment], "Pending"),
            total,
            booked_date: first_present(&[&raw.booked_date]),
            status,
        }
    }
}

impl BookingRecord {
    /// Deserialize one sheet row; anything that is not an object yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value::<RawRecord>(value)
            .ok()
            .map(BookingRecord::from)
    }

    pub fn passengers(&self) -> usize {
        pax_count(&self.male_seats) + pax_count(&self.female_seats)
    }
}
