use url::Url;

use crate::models::BookingRequest;
use crate::services::format::format_amount;

/// Chat text the passenger sends to the office to finalize a booking.
pub fn booking_message(
    req: &BookingRequest,
    sheet_time: &str,
    total: f64,
    bank_name: &str,
) -> String {
    [
        "*NEW LAGAN BUS BOOKING*".to_string(),
        String::new(),
        format!("👤 *Name:* {}", req.name.trim()),
        format!("📱 *Phone:* {}", req.clean_phone()),
        format!("📍 *Route:* {} → {}", req.from.trim(), req.to.trim()),
        format!("📅 *Date:* {}", req.date.trim()),
        format!("⏰ *Time:* {sheet_time}"),
        format!("🚌 *Bus:* {}", req.bus.trim()),
        format!("💺 *Seats:* M:{} / F:{}", req.male_seats, req.female_seats),
        format!("💰 *Total:* LKR {}", format_amount(total)),
        String::new(),
        format!("_Please attach payment slip for {bank_name} account_"),
    ]
    .join("\n")
}

/// `https://wa.me/<number>?text=...` with the text percent-encoded.
pub fn chat_link(number: &str, text: &str) -> anyhow::Result<String> {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    anyhow::ensure!(!digits.is_empty(), "WhatsApp number has no digits");

    let mut url = Url::parse("https://wa.me/")?.join(&digits)?;
    url.query_pairs_mut().append_pair("text", text);
    Ok(url.to_string())
}
