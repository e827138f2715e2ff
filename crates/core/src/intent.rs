use crate::models::{InboundMessage, Intent};

pub const SHUTTLE_COMMAND: &str = "/shuttle";
pub const HOLIDAY_COMMAND: &str = "/holiday";

pub fn normalize_text(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Only the leading command token is inspected. Anything that is not a
/// command goes to the assistant with the trimmed, original-case text.
pub fn route(message: &InboundMessage) -> Intent {
    let normalized = normalize_text(&message.text);

    if normalized.starts_with(SHUTTLE_COMMAND) {
        return Intent::Shuttle;
    }

    if normalized.starts_with(HOLIDAY_COMMAND) {
        return Intent::Holidays;
    }

    Intent::Assistant {
        prompt: message.text.trim().to_string(),
    }
}
