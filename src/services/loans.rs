//! Loan lifecycle service
//!
//! `ON_LOAN -> RETURNED` is the only stored transition. Every operation here
//! that touches copy counts runs inside a single unit of work together with
//! the loan rows it changes.

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{
            check_actual_return, check_expected_return, CreateLoan, LoanDetails, LoanStatus,
            UpdateLoan,
        },
        user::Role,
    },
    repository::{Repository, UnitOfWork},
};

use super::inventory::InventoryService;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    inventory: InventoryService,
}

impl LoansService {
    pub fn new(repository: Repository, inventory: InventoryService) -> Self {
        Self {
            repository,
            inventory,
        }
    }

    /// Get one loan with its derived status
    pub async fn get_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.get_by_id(loan_id).await?;
        Ok(LoanDetails::from_loan(loan, Utc::now().date_naive()))
    }

    /// List loans, filtered on the status clients see
    pub async fn list_loans(&self, status: Option<LoanStatus>) -> AppResult<Vec<LoanDetails>> {
        let stored = status.map(|s| match s {
            LoanStatus::Returned => LoanStatus::Returned,
            LoanStatus::OnLoan | LoanStatus::Overdue => LoanStatus::OnLoan,
        });

        let today = Utc::now().date_naive();
        let loans = self.repository.loans.list(stored).await?;

        Ok(loans
            .into_iter()
            .map(|loan| LoanDetails::from_loan(loan, today))
            .filter(|details| status.map_or(true, |s| details.status == s))
            .collect())
    }

    /// Loans of one borrower
    pub async fn get_user_loans(&self, user_id: i32) -> AppResult<Vec<LoanDetails>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;

        let today = Utc::now().date_naive();
        let loans = self.repository.loans.by_borrower(user_id).await?;
        Ok(loans
            .into_iter()
            .map(|loan| LoanDetails::from_loan(loan, today))
            .collect())
    }

    /// Lend one copy of a book.
    ///
    /// The copy reservation and the loan insert commit together; if the
    /// insert fails the reservation is rolled back with it.
    pub async fn create_loan(&self, request: CreateLoan) -> AppResult<LoanDetails> {
        let now = Utc::now();
        check_expected_return(now, request.expected_return)?;

        let mut uow = self.repository.begin().await?;

        self.ensure_user(&mut uow, request.borrower_id).await?;
        self.ensure_librarian(&mut uow, request.librarian_id).await?;

        let remaining = self.inventory.reserve_copy(&mut uow, request.book_id).await?;

        let loan = self
            .repository
            .loans
            .insert(
                uow.conn(),
                request.book_id,
                request.borrower_id,
                request.librarian_id,
                now,
                request.expected_return,
            )
            .await?;

        uow.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            book_id = loan.book_id,
            borrower_id = loan.borrower_id,
            remaining,
            "Loan created"
        );

        Ok(LoanDetails::from_loan(loan, now.date_naive()))
    }

    /// Close an open loan and put the copy back on the shelf
    pub async fn return_loan(
        &self,
        loan_id: i32,
        librarian_id: i32,
        actual_return: Option<DateTime<Utc>>,
    ) -> AppResult<LoanDetails> {
        let mut uow = self.repository.begin().await?;

        // The row lock makes a concurrent second return wait and then see RETURNED
        let loan = self.repository.loans.lock(uow.conn(), loan_id).await?;
        if let Err(e) = loan.ensure_on_loan() {
            tracing::warn!(loan_id, "Rejected return of a closed loan");
            return Err(e);
        }

        let actual_return = actual_return.unwrap_or_else(Utc::now);
        check_actual_return(loan.loan_time, actual_return)?;
        self.ensure_librarian(&mut uow, librarian_id).await?;

        let copies = self.inventory.release_copy(&mut uow, loan.book_id).await?;

        let loan = self
            .repository
            .loans
            .mark_returned(uow.conn(), loan_id, librarian_id, actual_return)
            .await?;

        uow.commit().await?;

        tracing::info!(loan_id, book_id = loan.book_id, copies, "Loan returned");

        Ok(LoanDetails::from_loan(loan, Utc::now().date_naive()))
    }

    /// Apply a partial update. Never touches copy counts.
    pub async fn update_loan(&self, loan_id: i32, update: UpdateLoan) -> AppResult<LoanDetails> {
        if update.is_empty() {
            return self.get_loan(loan_id).await;
        }

        let mut uow = self.repository.begin().await?;
        let loan = self.repository.loans.lock(uow.conn(), loan_id).await?;

        if let Some(expected_return) = update.expected_return {
            loan.ensure_on_loan()?;
            check_expected_return(loan.loan_time, expected_return)?;
        }
        if let Some(borrower_id) = update.borrower_id {
            self.ensure_user(&mut uow, borrower_id).await?;
        }
        if let Some(librarian_id) = update.librarian_id {
            self.ensure_librarian(&mut uow, librarian_id).await?;
        }

        let loan = self.repository.loans.update(uow.conn(), loan_id, &update).await?;
        uow.commit().await?;

        tracing::info!(loan_id, "Loan updated");
        Ok(LoanDetails::from_loan(loan, Utc::now().date_naive()))
    }

    /// Remove a closed loan record
    pub async fn delete_loan(&self, loan_id: i32) -> AppResult<()> {
        let mut uow = self.repository.begin().await?;
        let loan = self.repository.loans.lock(uow.conn(), loan_id).await?;

        if loan.status != LoanStatus::Returned {
            return Err(AppError::Conflict(format!(
                "Loan {} is still open; return it before deleting",
                loan_id
            )));
        }

        self.repository.loans.delete(uow.conn(), loan_id).await?;
        uow.commit().await?;

        tracing::info!(loan_id, "Loan deleted");
        Ok(())
    }

    /// Delete a book together with its returned loans.
    ///
    /// Refused while any loan on the book is still open.
    pub async fn delete_book_cascade(&self, book_id: i32) -> AppResult<()> {
        let mut uow = self.repository.begin().await?;

        if self.repository.books.lock(uow.conn(), book_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let open = self.repository.loans.count_open_for_book(uow.conn(), book_id).await?;
        if open > 0 {
            tracing::warn!(book_id, open, "Refused to delete a book with open loans");
            return Err(AppError::Conflict(format!(
                "Book {} has {} loan(s) that are not returned",
                book_id, open
            )));
        }

        let removed = self
            .repository
            .loans
            .delete_returned_for_book(uow.conn(), book_id)
            .await?;
        self.repository.books.delete(uow.conn(), book_id).await?;
        uow.commit().await?;

        tracing::info!(book_id, removed_loans = removed, "Book deleted with its loan history");
        Ok(())
    }

    async fn ensure_user(&self, uow: &mut UnitOfWork, user_id: i32) -> AppResult<Role> {
        self.repository
            .users
            .role_in(uow.conn(), user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))
    }

    async fn ensure_librarian(&self, uow: &mut UnitOfWork, user_id: i32) -> AppResult<()> {
        match self.ensure_user(uow, user_id).await? {
            Role::Librarian => Ok(()),
            Role::Reader => Err(AppError::Validation(format!(
                "User {} is not a librarian",
                user_id
            ))),
        }
    }
}
