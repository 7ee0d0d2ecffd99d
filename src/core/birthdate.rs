use crate::domain::model::{ContactRecord, RawContact};
use crate::utils::error::{NotifierError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Parses a stored birthdate. Only the calendar date is kept.
pub fn parse_birthdate(value: &str) -> std::result::Result<NaiveDate, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("empty value".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date());
        }
    }

    Err("unrecognised date format".to_string())
}

/// 將商店回傳的原始資料轉成型別化的聯絡人
pub fn to_contact_record(raw: RawContact) -> Result<ContactRecord> {
    let Some(value) = raw.birthdate else {
        return Err(NotifierError::DateParseFailure {
            contact_id: raw.id.0,
            value: String::new(),
            reason: "missing birthdate".to_string(),
        });
    };

    match parse_birthdate(&value) {
        Ok(birthdate) => Ok(ContactRecord {
            id: raw.id,
            fullname: raw.fullname.unwrap_or_default(),
            birthdate,
        }),
        Err(reason) => Err(NotifierError::DateParseFailure {
            contact_id: raw.id.0,
            value,
            reason,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ContactId;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_birthdate("1990-03-15"), Ok(ymd(1990, 3, 15)));
        assert_eq!(parse_birthdate("  1990-03-15 "), Ok(ymd(1990, 3, 15)));
    }

    #[test]
    fn test_parse_rfc3339_keeps_offset_date() {
        assert_eq!(parse_birthdate("1990-03-15T00:00:00Z"), Ok(ymd(1990, 3, 15)));
        assert_eq!(
            parse_birthdate("1990-03-15T23:30:00-05:00"),
            Ok(ymd(1990, 3, 15))
        );
    }

    #[test]
    fn test_parse_naive_datetime() {
        assert_eq!(parse_birthdate("1985-07-04T08:00:00"), Ok(ymd(1985, 7, 4)));
        assert_eq!(parse_birthdate("1985-07-04 08:00:00"), Ok(ymd(1985, 7, 4)));
    }

    #[test]
    fn test_parse_naive_datetime_with_fraction() {
        assert_eq!(
            parse_birthdate("1990-03-15T00:00:00.0000000"),
            Ok(ymd(1990, 3, 15))
        );
        assert_eq!(
            parse_birthdate("1990-03-15 12:30:45.123"),
            Ok(ymd(1990, 3, 15))
        );
    }

    #[test]
    fn test_parse_us_culture_strings() {
        assert_eq!(parse_birthdate("3/15/1990"), Ok(ymd(1990, 3, 15)));
        assert_eq!(
            parse_birthdate("3/15/1990 12:00:00 AM"),
            Ok(ymd(1990, 3, 15))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_birthdate("").is_err());
        assert!(parse_birthdate("yesterday").is_err());
        assert!(parse_birthdate("1990-02-30").is_err());
    }

    #[test]
    fn test_to_contact_record() {
        let record = to_contact_record(RawContact {
            id: ContactId("c-1".to_string()),
            fullname: None,
            birthdate: Some("2000-02-29".to_string()),
        })
        .unwrap();

        assert_eq!(record.fullname, "");
        assert_eq!(record.birthdate, ymd(2000, 2, 29));
    }

    #[test]
    fn test_to_contact_record_missing_birthdate() {
        let err = to_contact_record(RawContact {
            id: ContactId("c-2".to_string()),
            fullname: Some("Ada Lovelace".to_string()),
            birthdate: None,
        })
        .unwrap_err();

        assert!(matches!(
            err,
            NotifierError::DateParseFailure { ref contact_id, .. } if contact_id == "c-2"
        ));
    }
}
