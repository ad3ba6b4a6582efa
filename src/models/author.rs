//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub nationality: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Create author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, max = 255))]
    pub first_name: String,
    #[validate(length(max = 255))]
    pub last_name: Option<String>,
    #[validate(length(max = 100))]
    pub nationality: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Update author request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1, max = 255))]
    pub first_name: Option<String>,
    #[validate(length(max = 255))]
    pub last_name: Option<String>,
    #[validate(length(max = 100))]
    pub nationality: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Birth dates must not lie in the future
pub fn check_birth_date(birth_date: Option<NaiveDate>, today: NaiveDate) -> AppResult<()> {
    match birth_date {
        Some(date) if date > today => Err(AppError::Validation(format!(
            "Birth date {} is in the future",
            date
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_birth_date() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(check_birth_date(None, today).is_ok());
        assert!(check_birth_date(Some(today), today).is_ok());
        assert!(check_birth_date(NaiveDate::from_ymd_opt(1920, 1, 2), today).is_ok());
        assert!(matches!(
            check_birth_date(today.succ_opt(), today),
            Err(AppError::Validation(_))
        ));
    }
}
