pub mod cursor;
pub mod format;
pub mod normalize;
pub mod quiet_hours;
pub mod throttle;

pub use cursor::FeedCursor;
pub use format::ResponseFormatter;
pub use normalize::normalize;
pub use quiet_hours::is_quiet;
pub use throttle::ThrottleController;
