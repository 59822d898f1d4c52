//! Prefilled chat links for reaching customers.
//!
//! Pure string building; nothing here touches the network.

use crate::error::{LoyaltyError, Result};
use crate::{Customer, LoyaltyConfig};

/// Base of a WhatsApp click-to-chat link.
pub const WHATSAPP_BASE_URL: &str = "https://wa.me/";

/// Keep only the ASCII digits of a phone number.
#[must_use]
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Build a click-to-chat URL with `message` prefilled.
///
/// # Errors
///
/// Returns `LoyaltyError::Validation` if the phone has no digits.
pub fn whatsapp_link(phone: &str, message: &str) -> Result<String> {
    let digits = digits_only(phone);
    if digits.is_empty() {
        return Err(LoyaltyError::validation("phone number has no digits"));
    }
    Ok(format!(
        "{WHATSAPP_BASE_URL}{digits}?text={}",
        urlencoding::encode(message)
    ))
}

/// Default message telling a customer where their card stands.
#[must_use]
pub fn progress_message(customer: &Customer, config: &LoyaltyConfig) -> String {
    let missing = customer.stamps_until_reward(config);
    if missing == 0 {
        format!(
            "Hi {}! You have {} stamps, enough for a reward. Come by and claim it!",
            customer.name, customer.stamps
        )
    } else {
        format!(
            "Hi {}! You have {} of {} stamps. Only {missing} more until your next reward!",
            customer.name, customer.stamps, config.stamps_needed
        )
    }
}
