pub mod clock;
pub mod error;
pub mod holidays;
pub mod intent;
pub mod models;
pub mod schedule;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::CoreError;
pub use holidays::{render_holidays, upcoming_holidays, MAX_UPCOMING_HOLIDAYS};
pub use intent::{normalize_text, route};
pub use models::*;
pub use schedule::{classify_day, render_schedule};
