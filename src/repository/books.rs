//! Books repository: catalog rows, genre links and copy counts

use std::collections::HashMap;

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search the catalog by genre and free text
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.*
            FROM books b
            WHERE ($1::int IS NULL OR EXISTS (
                      SELECT 1 FROM book_genres bg
                      WHERE bg.book_id = b.id AND bg.genre_id = $1
                  ))
              AND ($2::text IS NULL
                   OR b.title ILIKE $2
                   OR b.isbn ILIKE $2
                   OR b.publisher ILIKE $2)
            ORDER BY b.title, b.id
            "#,
        )
        .bind(query.genre)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Books with at least one copy on the shelf
    pub async fn in_stock(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE copies_available > 0 ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn by_author(&self, author_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE author_id = $1 ORDER BY title, id",
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn by_genre(&self, genre_id: i32) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT b.*
            FROM books b
            JOIN book_genres bg ON bg.book_id = b.id
            WHERE bg.genre_id = $1
            ORDER BY b.title, b.id
            "#,
        )
        .bind(genre_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Genre links for a set of books, keyed by book id
    pub async fn genre_ids_for(&self, book_ids: &[i32]) -> AppResult<HashMap<i32, Vec<i32>>> {
        let rows: Vec<(i32, i32)> = sqlx::query_as(
            r#"
            SELECT book_id, genre_id
            FROM book_genres
            WHERE book_id = ANY($1)
            ORDER BY book_id, genre_id
            "#,
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut links: HashMap<i32, Vec<i32>> = HashMap::new();
        for (book_id, genre_id) in rows {
            links.entry(book_id).or_default().push(genre_id);
        }
        Ok(links)
    }

    /// Check if an ISBN is already catalogued
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int IS NULL OR id != $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn count_by_author(&self, author_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Current copy count, `None` when the book does not exist
    pub async fn copies_available(&self, id: i32) -> AppResult<Option<i32>> {
        let copies = sqlx::query_scalar::<_, i32>("SELECT copies_available FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(copies)
    }

    pub async fn create(&self, conn: &mut PgConnection, book: &CreateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, isbn, publisher, publication_year, copies_available, author_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(&book.publisher)
        .bind(book.publication_year)
        .bind(book.copies_available)
        .bind(book.author_id)
        .fetch_one(conn)
        .await
        .map_err(|e| AppError::from_constraint(e, "Book"))
    }

    /// Apply the supplied fields only
    pub async fn update(&self, conn: &mut PgConnection, id: i32, book: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                isbn = COALESCE($3, isbn),
                publisher = COALESCE($4, publisher),
                publication_year = COALESCE($5, publication_year),
                copies_available = COALESCE($6, copies_available),
                author_id = COALESCE($7, author_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.isbn)
        .bind(&book.publisher)
        .bind(book.publication_year)
        .bind(book.copies_available)
        .bind(book.author_id)
        .fetch_optional(conn)
        .await
        .map_err(|e| AppError::from_constraint(e, "Book"))?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Replace all genre links of a book
    pub async fn set_genres(&self, conn: &mut PgConnection, book_id: i32, genre_ids: &[i32]) -> AppResult<()> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut *conn)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO book_genres (book_id, genre_id)
            SELECT $1, g FROM UNNEST($2::int[]) AS g
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(genre_ids)
        .execute(conn)
        .await
        .map_err(|e| AppError::from_constraint(e, "Genre link"))?;

        Ok(())
    }

    /// Lock the book row for the rest of the transaction
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await?;
        Ok(book)
    }

    /// Take one copy if any is left; `None` means no row matched
    pub async fn decrement_copies(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<i32>> {
        let copies = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE books
            SET copies_available = copies_available - 1
            WHERE id = $1 AND copies_available > 0
            RETURNING copies_available
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(copies)
    }

    pub async fn increment_copies(&self, conn: &mut PgConnection, id: i32) -> AppResult<Option<i32>> {
        let copies = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE books
            SET copies_available = copies_available + 1
            WHERE id = $1
            RETURNING copies_available
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(copies)
    }

    pub async fn exists_in(&self, conn: &mut PgConnection, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(conn)
            .await?;
        Ok(exists)
    }

    pub async fn delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| AppError::from_constraint(e, "Book"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}
