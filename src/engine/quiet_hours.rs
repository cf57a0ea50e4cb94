use chrono::Timelike;

/// Last local hour (inclusive) of the nightly window in which nothing is published.
pub const QUIET_UNTIL_HOUR: u32 = 6;

/// True between 00:00 and 06:59 local time. Only gates publishing, never learning.
pub fn is_quiet<T: Timelike>(now: &T) -> bool {
    now.hour() <= QUIET_UNTIL_HOUR
}
