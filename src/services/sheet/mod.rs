pub mod apps_script;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{BookingRecord, Collection};

/// The spreadsheet script behind the booking sheets.
#[async_trait]
pub trait SheetClient: Send + Sync {
    /// POST a form-encoded write. Non-2xx responses are errors.
    async fn write(&self, write: &SheetWrite) -> anyhow::Result<()>;
    async fn read(&self, query: &SheetQuery) -> anyhow::Result<SheetEnvelope>;
}

/// Identifies a row for update/delete. The script matches on `id` and
/// falls back to `row` for sheets without an id column.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRef {
    pub id: Option<String>,
    pub row: Option<u32>,
    pub collection: Collection,
}

/// Column values in the sheet's own string formats.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetFields {
    pub name: String,
    pub phone: String,
    pub bus: String,
    pub time: String,
    pub date: String,
    pub pickup: String,
    pub destination: String,
    pub male_seats: String,
    pub female_seats: String,
    pub payment: String,
    pub total: String,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetWrite {
    Add(SheetFields),
    Approve(RowRef),
    Update(RowRef, SheetFields),
    Delete(RowRef),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetQuery {
    Search { phone_suffix: String },
    GetAll(Collection),
}

pub type FormParams = Vec<(&'static str, String)>;

fn push_row_ref(params: &mut FormParams, key: &RowRef) {
    params.push(("id", key.id.clone().unwrap_or_default()));
    if let Some(row) = key.row {
        params.push(("row", row.to_string()));
    }
}

fn push_lowercase(params: &mut FormParams, f: &SheetFields) {
    params.extend([
        ("name", f.name.clone()),
        ("phone", f.phone.clone()),
        ("bus", f.bus.clone()),
        ("time", f.time.clone()),
        ("date", f.date.clone()),
        ("maleSeats", f.male_seats.clone()),
        ("femaleSeats", f.female_seats.clone()),
        ("pickup", f.pickup.clone()),
        ("destination", f.destination.clone()),
        ("payment", f.payment.clone()),
        ("total", f.total.clone()),
    ]);
    if let Some(status) = &f.status {
        params.push(("status", status.clone()));
    }
}

fn push_headers(params: &mut FormParams, f: &SheetFields) {
    params.extend([
        ("Name", f.name.clone()),
        ("Phone", f.phone.clone()),
        ("Bus", f.bus.clone()),
        ("Time", f.time.clone()),
        ("Date", f.date.clone()),
        ("Pickup", f.pickup.clone()),
        ("Destination", f.destination.clone()),
        ("Male Seat", f.male_seats.clone()),
        ("Female Seat", f.female_seats.clone()),
        ("Payment", f.payment.clone()),
        ("Total", f.total.clone()),
    ]);
    if let Some(status) = &f.status {
        params.push(("Status", status.clone()));
    }
}

impl SheetWrite {
    pub fn method(&self) -> &'static str {
        match self {
            SheetWrite::Add(_) => "add",
            SheetWrite::Approve(_) | SheetWrite::Update(..) => "update",
            SheetWrite::Delete(_) => "delete",
        }
    }

    /// Form body. Every column goes out under both the camelCase name and
    /// the sheet header, since script versions differ in which they read.
    pub fn to_form(&self) -> FormParams {
        let mut params: FormParams = vec![("method", self.method().to_string())];
        match self {
            SheetWrite::Add(fields) => {
                push_lowercase(&mut params, fields);
                push_headers(&mut params, fields);
            }
            SheetWrite::Approve(key) => {
                push_row_ref(&mut params, key);
                params.push(("type", Collection::Active.as_str().to_string()));
                params.push(("status", "Confirmed".to_string()));
                params.push(("Status", "Confirmed".to_string()));
            }
            SheetWrite::Update(key, fields) => {
                push_row_ref(&mut params, key);
                params.push(("type", key.collection.as_str().to_string()));
                push_lowercase(&mut params, fields);
                push_headers(&mut params, fields);
                params.push(("Male Seats", fields.male_seats.clone()));
                params.push(("Female Seats", fields.female_seats.clone()));
            }
            SheetWrite::Delete(key) => {
                push_row_ref(&mut params, key);
                params.push(("type", key.collection.as_str().to_string()));
            }
        }
        params
    }
}

impl SheetQuery {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        match self {
            SheetQuery::Search { phone_suffix } => vec![
                ("method", "search".to_string()),
                ("phone", phone_suffix.clone()),
            ],
            SheetQuery::GetAll(collection) => vec![
                ("method", "getAll".to_string()),
                ("type", collection.as_str().to_string()),
            ],
        }
    }
}

/// Response body of a read. Every member is optional and older script
/// versions use `allBookings` where newer ones use `bookings`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetEnvelope {
    pub success: Option<bool>,
    pub booking: Option<Value>,
    #[serde(rename = "allBookings")]
    pub all_bookings: Option<Value>,
    pub bookings: Option<Value>,
    pub error: Option<String>,
}

fn rows_of(list: Option<Value>) -> Option<Vec<Value>> {
    match list {
        Some(Value::Array(rows)) if !rows.is_empty() => Some(rows),
        _ => None,
    }
}

impl SheetEnvelope {
    /// The single booking of a search, regardless of the `success` flag.
    pub fn into_booking(self) -> Option<BookingRecord> {
        if let Some(record) = self.booking.and_then(BookingRecord::from_value) {
            return Some(record);
        }
        rows_of(self.all_bookings)
            .or_else(|| rows_of(self.bookings))
            .and_then(|rows| rows.into_iter().next())
            .and_then(BookingRecord::from_value)
    }

    /// Raw rows of a getAll, in sheet order.
    pub fn into_rows(self) -> Vec<Value> {
        rows_of(self.bookings)
            .or_else(|| rows_of(self.all_bookings))
            .unwrap_or_default()
    }
}
