use chrono::{DateTime, Utc};

const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const AMZ_SHORT_DATE_FORMAT: &str = "%Y%m%d";

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// `20150830T123600Z`, the value of the `x-amz-date` header.
pub fn amz_date(now: &DateTime<Utc>) -> String {
    now.format(AMZ_DATE_FORMAT).to_string()
}

/// `20150830`, the date part of the credential scope.
pub fn amz_short_date(now: &DateTime<Utc>) -> String {
    now.format(AMZ_SHORT_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_signing_dates() {
        let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();
        assert_eq!(amz_date(&now), "20150830T123600Z");
        assert_eq!(amz_short_date(&now), "20150830");
    }
}
