use std::env;

use chrono::{FixedOffset, Offset, Utc};

use crate::errors::AppError;

#[derive(Clone, Debug)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_name: String,
    pub account_number: String,
    pub branch: String,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub sheet_url: String,
    pub admin_token: String,
    pub admin_whatsapp_number: String,
    pub display_utc_offset_minutes: i32,
    pub bank: BankDetails,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            sheet_url: env::var("SHEET_URL").unwrap_or_default(),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            admin_whatsapp_number: env::var("ADMIN_WHATSAPP_NUMBER")
                .unwrap_or_else(|_| "94701362527".to_string()),
            display_utc_offset_minutes: env::var("DISPLAY_UTC_OFFSET_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(330),
            bank: BankDetails {
                bank_name: env::var("BANK_NAME")
                    .unwrap_or_else(|_| "Hatton National Bank (HNB)".to_string()),
                account_name: env::var("BANK_ACCOUNT_NAME")
                    .unwrap_or_else(|_| "MOHAMED FAWAS MT".to_string()),
                account_number: env::var("BANK_ACCOUNT_NUMBER")
                    .unwrap_or_else(|_| "159020046687".to_string()),
                branch: env::var("BANK_BRANCH").unwrap_or_else(|_| "Nintavur Branch".to_string()),
            },
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.sheet_url.starts_with("http://") && !self.sheet_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "SHEET_URL must be an http(s) URL, got {:?}",
                self.sheet_url
            )));
        }
        if self.admin_token.is_empty() {
            return Err(AppError::Config("ADMIN_TOKEN must not be empty".to_string()));
        }
        Ok(())
    }

    /// Offset used when rendering remote timestamps and deciding what "today" is.
    /// Out-of-range values fall back to UTC.
    pub fn display_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.display_utc_offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix())
    }
}
