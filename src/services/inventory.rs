//! Book copy inventory
//!
//! Copy counts only move through these calls, each of which runs on the
//! caller's unit of work so that the count and the loan row commit together.

use crate::{
    error::{AppError, AppResult},
    models::book::Availability,
    repository::{Repository, UnitOfWork},
};

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
}

impl InventoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Take one copy off the shelf and return how many remain.
    ///
    /// The check and the decrement are one conditional UPDATE, so concurrent
    /// callers cannot oversell the last copy.
    pub async fn reserve_copy(&self, uow: &mut UnitOfWork, book_id: i32) -> AppResult<i32> {
        if let Some(remaining) = self.repository.books.decrement_copies(uow.conn(), book_id).await? {
            tracing::debug!(book_id, remaining, "Copy reserved");
            return Ok(remaining);
        }

        if self.repository.books.exists_in(uow.conn(), book_id).await? {
            tracing::warn!(book_id, "No copies left to lend");
            Err(AppError::OutOfStock(format!(
                "No copies of book {} are available",
                book_id
            )))
        } else {
            Err(AppError::NotFound(format!("Book with id {} not found", book_id)))
        }
    }

    /// Put one copy back and return the new count
    pub async fn release_copy(&self, uow: &mut UnitOfWork, book_id: i32) -> AppResult<i32> {
        let copies = self
            .repository
            .books
            .increment_copies(uow.conn(), book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        tracing::debug!(book_id, copies, "Copy released");
        Ok(copies)
    }

    pub async fn has_stock(&self, book_id: i32) -> AppResult<bool> {
        Ok(self.availability(book_id).await?.in_stock)
    }

    pub async fn availability(&self, book_id: i32) -> AppResult<Availability> {
        let copies_available = self
            .repository
            .books
            .copies_available(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        Ok(Availability {
            book_id,
            copies_available,
            in_stock: copies_available > 0,
        })
    }
}
