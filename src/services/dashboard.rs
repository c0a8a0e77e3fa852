use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::catalog;
use crate::models::record::{parse_amount, pax_count};
use crate::models::{BookingRecord, BookingStatus, BookingValidationError, Collection};
use crate::services::format::{clean_edit_date, format_sheet_time, parse_sheet_date};
use crate::services::sheet::{RowRef, SheetClient, SheetFields, SheetQuery};

/// A record plus the sheet it was read from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminBooking {
    #[serde(flatten)]
    pub record: BookingRecord,
    pub origin: Collection,
}

/// How the dashboard addresses a booking: by id when the sheet has one,
/// otherwise by row within its collection.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BookingKey {
    pub id: Option<String>,
    pub row: Option<u32>,
    pub collection: Collection,
}

impl BookingKey {
    fn id(&self) -> Option<&str> {
        self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn is_addressable(&self) -> bool {
        self.id().is_some() || self.row.is_some()
    }
}

impl AdminBooking {
    pub fn row_ref(&self) -> RowRef {
        RowRef {
            id: self.record.booking_id.clone(),
            row: self.record.row_index,
            collection: self.origin,
        }
    }

    fn matches(&self, key: &BookingKey) -> bool {
        if self.origin != key.collection {
            return false;
        }
        match key.id() {
            Some(id) => self.record.booking_id.as_deref() == Some(id),
            None => key.row.is_some() && self.record.row_index == key.row,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Pending,
    #[default]
    Active,
    Archive,
}

/// Fields an administrator can overwrite.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingEdit {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub bus: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub pickup: Option<String>,
    pub destination: Option<String>,
    pub male_seats: Option<String>,
    pub female_seats: Option<String>,
    pub payment: Option<String>,
    /// Accepts numbers or strings with thousands separators.
    pub total: Option<Value>,
    pub status: Option<String>,
}

impl BookingEdit {
    pub fn apply(&self, record: &mut BookingRecord) {
        let fields = [
            (&self.name, &mut record.name),
            (&self.phone, &mut record.phone),
            (&self.bus, &mut record.bus),
            (&self.date, &mut record.date),
            (&self.time, &mut record.time),
            (&self.pickup, &mut record.pickup),
            (&self.destination, &mut record.destination),
            (&self.male_seats, &mut record.male_seats),
            (&self.female_seats, &mut record.female_seats),
            (&self.payment, &mut record.payment),
        ];
        for (edit, slot) in fields {
            if let Some(value) = edit {
                *slot = value.trim().to_string();
            }
        }

        if let Some(total) = &self.total {
            let parsed = match total {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => parse_amount(s),
                _ => None,
            };
            if let Some(total) = parsed {
                record.total = total;
            }
        }
        if let Some(status) = &self.status {
            record.status = BookingStatus::from_raw(status);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardFilter {
    pub q: Option<String>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Totals {
    pub pending: usize,
    pub active: usize,
    pub archived: usize,
    pub revenue: f64,
    pub passengers: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Quote {
    pub unit_price: f64,
    pub passengers: usize,
    pub total: f64,
}

/// Local mirror of both sheets, split into the three dashboard buckets.
#[derive(Debug, Default)]
pub struct Dashboard {
    pending: Vec<AdminBooking>,
    active: Vec<AdminBooking>,
    archived: Vec<AdminBooking>,
    loaded: bool,
    stale: bool,
}

fn ingest(rows: Vec<Value>, origin: Collection) -> Vec<AdminBooking> {
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let mut record = BookingRecord::from_value(row)?;
            // Data starts on sheet row 2, under the header.
            if record.row_index.is_none() {
                record.row_index = Some(index as u32 + 2);
            }
            Some(AdminBooking { record, origin })
        })
        .collect()
}

/// Newest first: by booking id, then by sheet row.
fn sort_newest_first(bookings: &mut [AdminBooking]) {
    bookings.sort_by(|a, b| {
        let ka = (a.record.booking_id.as_deref(), a.record.row_index);
        let kb = (b.record.booking_id.as_deref(), b.record.row_index);
        kb.cmp(&ka)
    });
}

impl Dashboard {
    pub fn from_rows(active_rows: Vec<Value>, archive_rows: Vec<Value>) -> Self {
        let (mut pending, mut active): (Vec<_>, Vec<_>) = ingest(active_rows, Collection::Active)
            .into_iter()
            .partition(|b| b.record.status == BookingStatus::Pending);
        let mut archived = ingest(archive_rows, Collection::Archive);

        sort_newest_first(&mut pending);
        sort_newest_first(&mut active);
        sort_newest_first(&mut archived);

        Self {
            pending,
            active,
            archived,
            loaded: true,
            stale: false,
        }
    }

    pub fn needs_refresh(&self) -> bool {
        !self.loaded || self.stale
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// A write failed; local state may have drifted from the sheet.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn bucket(&self, view: View) -> &[AdminBooking] {
        match view {
            View::Pending => &self.pending,
            View::Active => &self.active,
            View::Archive => &self.archived,
        }
    }

    fn bucket_mut(&mut self, view: View) -> &mut Vec<AdminBooking> {
        match view {
            View::Pending => &mut self.pending,
            View::Active => &mut self.active,
            View::Archive => &mut self.archived,
        }
    }

    fn view_for(booking: &AdminBooking) -> View {
        match (booking.origin, booking.record.status) {
            (Collection::Archive, _) => View::Archive,
            (Collection::Active, BookingStatus::Pending) => View::Pending,
            (Collection::Active, BookingStatus::Confirmed) => View::Active,
        }
    }

    /// Revenue and passengers over confirmed and archived bookings.
    pub fn totals(&self) -> Totals {
        let settled = self.active.iter().chain(self.archived.iter());
        let (revenue, passengers) = settled.fold((0.0, 0), |(revenue, pax), b| {
            (revenue + b.record.total, pax + b.record.passengers())
        });

        Totals {
            pending: self.pending.len(),
            active: self.active.len(),
            archived: self.archived.len(),
            revenue,
            passengers,
        }
    }

    #[cfg(test)]
    fn find(&self, key: &BookingKey) -> Option<&AdminBooking> {
        [View::Pending, View::Active, View::Archive]
            .into_iter()
            .flat_map(|v| self.bucket(v).iter())
            .find(|b| b.matches(key))
    }

    fn take(&mut self, key: &BookingKey) -> Option<(View, usize, AdminBooking)> {
        for view in [View::Pending, View::Active, View::Archive] {
            let bucket = self.bucket_mut(view);
            if let Some(pos) = bucket.iter().position(|b| b.matches(key)) {
                return Some((view, pos, bucket.remove(pos)));
            }
        }
        None
    }

    /// Pending -> front of active, status confirmed.
    pub fn approve(&mut self, key: &BookingKey) -> Option<AdminBooking> {
        let pos = self.pending.iter().position(|b| b.matches(key))?;
        let mut booking = self.pending.remove(pos);
        booking.record.status = BookingStatus::Confirmed;
        self.active.insert(0, booking.clone());
        Some(booking)
    }

    pub fn remove(&mut self, key: &BookingKey) -> Option<AdminBooking> {
        self.take(key).map(|(_, _, booking)| booking)
    }

    /// Overwrite a booking in place. A status change moves it between the
    /// pending and active buckets, landing at the front.
    pub fn apply_edit(&mut self, key: &BookingKey, edit: &BookingEdit) -> Option<AdminBooking> {
        let (old_view, pos, mut booking) = self.take(key)?;
        edit.apply(&mut booking.record);

        let new_view = Self::view_for(&booking);
        let bucket = self.bucket_mut(new_view);
        if new_view == old_view {
            bucket.insert(pos.min(bucket.len()), booking.clone());
        } else {
            bucket.insert(0, booking.clone());
        }
        Some(booking)
    }

    pub fn filtered(
        &self,
        view: View,
        filter: &DashboardFilter,
        offset: &FixedOffset,
    ) -> Vec<AdminBooking> {
        let needle = filter.q.as_deref().unwrap_or("").trim().to_lowercase();
        let wanted_date = filter.date.as_deref().map(str::trim).filter(|d| !d.is_empty());
        let wanted_parsed = wanted_date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        self.bucket(view)
            .iter()
            .filter(|b| {
                let r = &b.record;
                needle.is_empty()
                    || r.name.to_lowercase().contains(&needle)
                    || r.phone.contains(&needle)
                    || r
                        .booking_id
                        .as_deref()
                        .is_some_and(|id| id.to_lowercase().contains(&needle))
            })
            .filter(|b| match wanted_date {
                None => true,
                Some(raw) => match (parse_sheet_date(&b.record.date, offset), wanted_parsed) {
                    (Some(date), Some(wanted)) => date == wanted,
                    _ => b.record.date.contains(raw),
                },
            })
            .cloned()
            .collect()
    }
}

/// Both sheets, fetched concurrently.
pub async fn fetch_dashboard(sheet: &dyn SheetClient) -> anyhow::Result<Dashboard> {
    let active_query = SheetQuery::GetAll(Collection::Active);
    let archive_query = SheetQuery::GetAll(Collection::Archive);
    let (active, archive) = tokio::join!(sheet.read(&active_query), sheet.read(&archive_query));

    let active = active?.into_rows();
    let archive = archive?.into_rows();
    tracing::info!(active = active.len(), archive = archive.len(), "fetched booking sheets");

    Ok(Dashboard::from_rows(active, archive))
}

/// Columns for an update write, in the formats the sheet expects.
pub fn edit_fields(record: &BookingRecord, offset: &FixedOffset) -> SheetFields {
    let payment = if record.payment.trim().is_empty() {
        "Pending".to_string()
    } else {
        record.payment.clone()
    };

    SheetFields {
        name: record.name.clone(),
        phone: record.phone.clone(),
        bus: record.bus.clone(),
        time: format_sheet_time(&record.time),
        date: clean_edit_date(&record.date, offset),
        pickup: record.pickup.clone(),
        destination: record.destination.clone(),
        male_seats: record.male_seats.clone(),
        female_seats: record.female_seats.clone(),
        payment,
        total: record.total.to_string(),
        status: Some(record.status.as_str().to_string()),
    }
}

/// Price a booking from its seat lists, as the edit form's auto-calculate does.
pub fn quote(
    bus: &str,
    male_seats: &str,
    female_seats: &str,
) -> Result<Quote, BookingValidationError> {
    let service = catalog::find_bus(bus)
        .ok_or_else(|| BookingValidationError::UnknownBus(bus.trim().to_string()))?;
    let passengers = pax_count(male_seats) + pax_count(female_seats);

    Ok(Quote {
        unit_price: service.price,
        passengers,
        total: service.price * passengers as f64,
    })
}
