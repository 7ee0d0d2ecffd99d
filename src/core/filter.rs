use crate::core::birthdate::to_contact_record;
use crate::domain::model::{ContactRecord, RawContact};
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub matches: Vec<ContactRecord>,
    pub skipped: usize,
}

/// Month and day equality; the year is ignored and Feb 29 only matches Feb 29.
pub fn is_birthday(birthdate: NaiveDate, today: NaiveDate) -> bool {
    birthdate.month() == today.month() && birthdate.day() == today.day()
}

/// Keeps the candidates whose birthday is `today`, in query order.
///
/// Records with a missing or unparseable birthdate are logged and counted as
/// skipped instead of failing the run.
pub fn filter_birthdays(candidates: Vec<RawContact>, today: NaiveDate) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for raw in candidates {
        match to_contact_record(raw) {
            Ok(contact) => {
                if is_birthday(contact.birthdate, today) {
                    tracing::debug!("🎂 {} ({}) has a birthday today", contact.fullname, contact.id);
                    outcome.matches.push(contact);
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ Skipping contact: {}", e);
                outcome.skipped += 1;
            }
        }
    }

    outcome
}
