mod time;

pub use time::{amz_date, amz_short_date, now_utc};
