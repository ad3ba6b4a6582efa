//! Loans repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanStatus, UpdateLoan},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// All loans, optionally restricted to one stored status
    pub async fn list(&self, status: Option<LoanStatus>) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY loan_time DESC, id DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Loans of one borrower, newest first
    pub async fn by_borrower(&self, borrower_id: i32) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            "SELECT * FROM loans WHERE borrower_id = $1 ORDER BY loan_time DESC, id DESC",
        )
        .bind(borrower_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Loans where the user appears as borrower or librarian
    pub async fn count_for_user(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE borrower_id = $1 OR librarian_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Lock a loan row for the rest of the transaction
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        book_id: i32,
        borrower_id: i32,
        librarian_id: i32,
        loan_time: DateTime<Utc>,
        expected_return: DateTime<Utc>,
    ) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, borrower_id, librarian_id, loan_time, expected_return, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(borrower_id)
        .bind(librarian_id)
        .bind(loan_time)
        .bind(expected_return)
        .bind(LoanStatus::OnLoan)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::from_constraint(e, "Loan"))
    }

    pub async fn mark_returned(
        &self,
        conn: &mut PgConnection,
        id: i32,
        librarian_id: i32,
        actual_return: DateTime<Utc>,
    ) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET actual_return = $2, librarian_id = $3, status = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(actual_return)
        .bind(librarian_id)
        .bind(LoanStatus::Returned)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::from_constraint(e, "Loan"))
    }

    /// Apply the supplied fields only
    pub async fn update(&self, conn: &mut PgConnection, id: i32, update: &UpdateLoan) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET
                borrower_id = COALESCE($2, borrower_id),
                librarian_id = COALESCE($3, librarian_id),
                expected_return = COALESCE($4, expected_return)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.borrower_id)
        .bind(update.librarian_id)
        .bind(update.expected_return)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::from_constraint(e, "Loan"))?
        .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Loans on a book that are not yet returned
    pub async fn count_open_for_book(&self, conn: &mut PgConnection, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = $1 AND status != $2",
        )
        .bind(book_id)
        .bind(LoanStatus::Returned)
        .fetch_one(conn)
        .await?;
        Ok(count)
    }

    pub async fn count_for_book(&self, conn: &mut PgConnection, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    pub async fn delete_returned_for_book(&self, conn: &mut PgConnection, book_id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM loans WHERE book_id = $1 AND status = $2")
            .bind(book_id)
            .bind(LoanStatus::Returned)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
