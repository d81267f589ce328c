//! Conversion of typed field values into query tokens.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::query::geo::GeoPoint;

/// A value that can appear on the right-hand side of a field clause.
pub trait QueryValue {
    /// Render the value as the token both backends match against.
    fn to_token(&self) -> String;
}

impl QueryValue for String {
    fn to_token(&self) -> String {
        self.clone()
    }
}

impl QueryValue for &str {
    fn to_token(&self) -> String {
        (*self).to_string()
    }
}

impl QueryValue for bool {
    fn to_token(&self) -> String {
        self.to_string()
    }
}

macro_rules! display_value {
    ($($t:ty),*) => {
        $(
            impl QueryValue for $t {
                fn to_token(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_value!(i32, i64, u32, u64, usize, f32, f64);

impl QueryValue for DateTime<Utc> {
    fn to_token(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl QueryValue for NaiveDate {
    fn to_token(&self) -> String {
        format!("{}T00:00:00Z", self.format("%Y-%m-%d"))
    }
}

impl QueryValue for GeoPoint {
    fn to_token(&self) -> String {
        self.to_param()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_scalar_tokens() {
        assert_eq!("jon".to_token(), "jon");
        assert_eq!(42i64.to_token(), "42");
        assert_eq!(1.5f64.to_token(), "1.5");
        assert_eq!(true.to_token(), "true");
    }

    #[test]
    fn test_date_tokens() {
        let moment = Utc.with_ymd_and_hms(2012, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(moment.to_token(), "2012-03-04T05:06:07Z");

        let day = NaiveDate::from_ymd_opt(2012, 3, 4).unwrap();
        assert_eq!(day.to_token(), "2012-03-04T00:00:00Z");
    }
}
