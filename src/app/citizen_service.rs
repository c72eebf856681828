use crate::app::error::{AppError, AppResult};
use crate::storage::repo::citizens::{self, CitizenRow, ProfileUpdate};
use chrono::{Datelike, NaiveDate, Utc};
use sqlx::PgConnection;

const GENDERS: &[&str] = &["MALE", "FEMALE", "OTHER"];

/// Loads the caller's citizen record; every citizen-facing workflow starts here.
pub async fn require_citizen(conn: &mut PgConnection, identity_hash: &str) -> AppResult<CitizenRow> {
    citizens::find_by_identity(conn, identity_hash)
        .await?
        .ok_or_else(|| AppError::not_found("Citizen profile"))
}

/// Whole years between `date_of_birth` and `today`.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age.max(0)
}

pub fn age_of(citizen: &CitizenRow) -> Option<i32> {
    citizen
        .date_of_birth
        .map(|dob| age_on(dob, Utc::now().date_naive()))
}

pub async fn update_profile(
    conn: &mut PgConnection,
    identity_hash: &str,
    mut update: ProfileUpdate,
) -> AppResult<CitizenRow> {
    let citizen = require_citizen(conn, identity_hash).await?;

    if let Some(gender) = update.gender.take() {
        let gender = gender.trim().to_uppercase();
        if !GENDERS.contains(&gender.as_str()) {
            return Err(AppError::Validation(
                "gender must be MALE, FEMALE or OTHER".to_string(),
            ));
        }
        update.gender = Some(gender);
    }
    if let Some(dob) = update.date_of_birth {
        if dob > Utc::now().date_naive() {
            return Err(AppError::Validation(
                "date_of_birth cannot be in the future".to_string(),
            ));
        }
    }

    Ok(citizens::update_profile(conn, citizen.citizen_id, &update).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_counts_only_completed_years() {
        let dob = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2020, 6, 14).unwrap()), 29);
        assert_eq!(age_on(dob, NaiveDate::from_ymd_opt(2020, 6, 15).unwrap()), 30);
    }
}
