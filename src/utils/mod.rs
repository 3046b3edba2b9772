mod perf;
pub(crate) mod time_utils;

pub use time_utils::{AppInstant, TimeUtils, format_duration, now_time_key};
