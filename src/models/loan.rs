//! Loan model: status machine, overdue derivation and date rules

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Loan status.
///
/// Only `OnLoan` and `Returned` are stored; `Overdue` is derived from an open
/// loan whose expected return date has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    OnLoan,
    Returned,
    Overdue,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::OnLoan => "ON_LOAN",
            LoanStatus::Returned => "RETURNED",
            LoanStatus::Overdue => "OVERDUE",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ON_LOAN" => Ok(LoanStatus::OnLoan),
            "RETURNED" => Ok(LoanStatus::Returned),
            "OVERDUE" => Ok(LoanStatus::Overdue),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: &str = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Loan row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub librarian_id: i32,
    pub loan_time: DateTime<Utc>,
    pub expected_return: Option<DateTime<Utc>>,
    pub actual_return: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl Loan {
    /// An open loan is overdue once `today` is past the expected return date
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        if self.status == LoanStatus::Returned {
            return false;
        }
        match self.expected_return {
            Some(expected) => today > expected.date_naive(),
            None => false,
        }
    }

    pub fn is_overdue(&self) -> bool {
        self.is_overdue_on(Utc::now().date_naive())
    }

    /// Status as seen by clients
    pub fn effective_status_on(&self, today: NaiveDate) -> LoanStatus {
        if self.is_overdue_on(today) {
            LoanStatus::Overdue
        } else {
            self.status
        }
    }

    pub fn ensure_on_loan(&self) -> AppResult<()> {
        match self.status {
            LoanStatus::Returned => Err(AppError::Conflict(format!(
                "Loan {} has already been returned",
                self.id
            ))),
            _ => Ok(()),
        }
    }
}

/// The expected return date must fall on a later calendar day than the loan
pub fn check_expected_return(loan_time: DateTime<Utc>, expected_return: DateTime<Utc>) -> AppResult<()> {
    if expected_return.date_naive() > loan_time.date_naive() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "Expected return date {} must be after the loan date {}",
            expected_return.date_naive(),
            loan_time.date_naive()
        )))
    }
}

pub fn check_actual_return(loan_time: DateTime<Utc>, actual_return: DateTime<Utc>) -> AppResult<()> {
    if actual_return < loan_time {
        return Err(AppError::Validation(
            "Return time precedes the loan time".to_string(),
        ));
    }
    Ok(())
}

/// Loan as returned by the API, carrying the derived status
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub librarian_id: i32,
    pub loan_time: DateTime<Utc>,
    pub expected_return: Option<DateTime<Utc>>,
    pub actual_return: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub is_overdue: bool,
}

impl LoanDetails {
    pub fn from_loan(loan: Loan, today: NaiveDate) -> Self {
        let status = loan.effective_status_on(today);
        Self {
            id: loan.id,
            book_id: loan.book_id,
            borrower_id: loan.borrower_id,
            librarian_id: loan.librarian_id,
            loan_time: loan.loan_time,
            expected_return: loan.expected_return,
            actual_return: loan.actual_return,
            status,
            is_overdue: status == LoanStatus::Overdue,
        }
    }
}

/// Create loan request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub book_id: i32,
    pub borrower_id: i32,
    pub librarian_id: i32,
    pub expected_return: DateTime<Utc>,
}

/// Return request; both fields are optional
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ReturnLoan {
    /// Defaults to the authenticated librarian
    pub librarian_id: Option<i32>,
    /// Defaults to now
    pub actual_return: Option<DateTime<Utc>>,
}

/// Partial loan update.
///
/// Book, status and return time move only through the create and return
/// operations, so they are not accepted here.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateLoan {
    pub borrower_id: Option<i32>,
    pub librarian_id: Option<i32>,
    pub expected_return: Option<DateTime<Utc>>,
}

impl UpdateLoan {
    pub fn is_empty(&self) -> bool {
        self.borrower_id.is_none() && self.librarian_id.is_none() && self.expected_return.is_none()
    }
}

/// Loan listing filter
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
}
