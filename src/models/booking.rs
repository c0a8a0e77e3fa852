use serde::{Deserialize, Serialize};

use crate::models::catalog;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
        }
    }

    /// Free-text sheet status. Only "new" and "pending" await approval;
    /// blank, missing and anything else count as confirmed.
    pub fn from_raw(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "new" | "pending" => BookingStatus::Pending,
            _ => BookingStatus::Confirmed,
        }
    }
}

/// Which remote sheet a record lives in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Active,
    Archive,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Active => "active",
            Collection::Archive => "archive",
        }
    }
}

/// A passenger's booking as submitted from the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub name: String,
    pub phone: String,
    pub from: String,
    pub to: String,
    /// `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub time: String,
    pub bus: String,
    #[serde(default)]
    pub male_seats: u32,
    #[serde(default)]
    pub female_seats: u32,
}

/// The seat picker offers 0 to 10 seats for each of male and female.
pub const MAX_SEATS_PER_SIDE: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum BookingValidationError {
    NoSeats,
    TooManySeats,
    InvalidPhone,
    MissingField(&'static str),
    UnknownBus(String),
    UnknownCity(String),
    InvalidDate(String),
    DateInPast(String),
}

impl std::fmt::Display for BookingValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingValidationError::NoSeats => {
                write!(f, "Please select at least one male or female seat.")
            }
            BookingValidationError::TooManySeats => write!(
                f,
                "You can book at most {MAX_SEATS_PER_SIDE} seats each for male and female."
            ),
            BookingValidationError::InvalidPhone => {
                write!(f, "Please enter a valid phone number (e.g., 0771234567).")
            }
            BookingValidationError::MissingField(field) => write!(f, "{field} is required."),
            BookingValidationError::UnknownBus(bus) => {
                write!(f, "Unknown bus service: {bus}. Please select a valid bus.")
            }
            BookingValidationError::UnknownCity(city) => write!(f, "Unknown city: {city}."),
            BookingValidationError::InvalidDate(date) => {
                write!(f, "Invalid travel date: {date}. Expected YYYY-MM-DD.")
            }
            BookingValidationError::DateInPast(date) => {
                write!(f, "Travel date {date} is in the past.")
            }
        }
    }
}

impl BookingRequest {
    pub fn seat_count(&self) -> u32 {
        self.male_seats.saturating_add(self.female_seats)
    }

    /// Digits only, capped at 12 like the form input.
    pub fn clean_phone(&self) -> String {
        self.phone
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(12)
            .collect()
    }

    /// Unit price of the selected bus times the seats requested.
    pub fn total(&self) -> Option<f64> {
        catalog::find_bus(&self.bus).map(|bus| bus.price * f64::from(self.seat_count()))
    }

    /// Departure time, falling back to the bus's scheduled time.
    pub fn departure_time(&self) -> String {
        if !self.time.trim().is_empty() {
            return self.time.trim().to_string();
        }
        catalog::find_bus(&self.bus)
            .map(|b| b.time.to_string())
            .unwrap_or_default()
    }

    pub fn validate(&self, today: chrono::NaiveDate) -> Result<(), BookingValidationError> {
        if self.seat_count() == 0 {
            return Err(BookingValidationError::NoSeats);
        }
        if self.male_seats > MAX_SEATS_PER_SIDE || self.female_seats > MAX_SEATS_PER_SIDE {
            return Err(BookingValidationError::TooManySeats);
        }
        if self.clean_phone().len() < 9 {
            return Err(BookingValidationError::InvalidPhone);
        }
        if self.name.trim().is_empty() {
            return Err(BookingValidationError::MissingField("Name"));
        }
        for (label, city) in [("Origin", &self.from), ("Destination", &self.to)] {
            if city.trim().is_empty() {
                return Err(BookingValidationError::MissingField(label));
            }
            if !catalog::is_known_city(city) {
                return Err(BookingValidationError::UnknownCity(city.trim().to_string()));
            }
        }
        if catalog::find_bus(&self.bus).is_none() {
            return Err(BookingValidationError::UnknownBus(self.bus.trim().to_string()));
        }

        let date = chrono::NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| BookingValidationError::InvalidDate(self.date.clone()))?;
        if date < today {
            return Err(BookingValidationError::DateInPast(self.date.clone()));
        }

        Ok(())
    }
}
