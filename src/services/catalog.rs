//! Catalog management service: authors, genres and books

use chrono::{Datelike, Utc};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{check_birth_date, Author, CreateAuthor, UpdateAuthor},
        book::{check_publication_year, Book, BookDetails, BookQuery, CreateBook, UpdateBook},
        genre::{CreateGenre, Genre},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    // Authors

    pub async fn list_authors(&self, skip: i64, limit: i64) -> AppResult<Vec<Author>> {
        self.repository
            .authors
            .list(skip.max(0), limit.clamp(1, 500))
            .await
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn create_author(&self, author: CreateAuthor) -> AppResult<Author> {
        author.validate()?;
        check_birth_date(author.birth_date, Utc::now().date_naive())?;

        let created = self.repository.authors.create(&author).await?;
        tracing::info!(author_id = created.id, "Author created");
        Ok(created)
    }

    pub async fn update_author(&self, id: i32, author: UpdateAuthor) -> AppResult<Author> {
        author.validate()?;
        check_birth_date(author.birth_date, Utc::now().date_naive())?;
        self.repository.authors.update(id, &author).await
    }

    /// Authors still referenced by a book cannot be deleted
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        let author = self.repository.authors.get_by_id(id).await?;

        let books = self.repository.books.count_by_author(id).await?;
        if books > 0 {
            return Err(AppError::Conflict(format!(
                "Author {} is referenced by {} book(s)",
                author.first_name, books
            )));
        }

        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "Author deleted");
        Ok(())
    }

    pub async fn books_by_author(&self, author_id: i32) -> AppResult<Vec<BookDetails>> {
        self.repository.authors.get_by_id(author_id).await?;
        let books = self.repository.books.by_author(author_id).await?;
        self.with_genres(books).await
    }

    // Genres

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn create_genre(&self, genre: CreateGenre) -> AppResult<Genre> {
        genre.validate()?;
        let name = genre.name.trim();

        if self.repository.genres.name_exists(name).await? {
            return Err(AppError::Conflict(format!("Genre '{}' already exists", name)));
        }

        let created = self.repository.genres.create(name).await?;
        tracing::info!(genre_id = created.id, "Genre created");
        Ok(created)
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await
    }

    pub async fn books_by_genre(&self, genre_id: i32) -> AppResult<Vec<BookDetails>> {
        self.repository.genres.get_by_id(genre_id).await?;
        let books = self.repository.books.by_genre(genre_id).await?;
        self.with_genres(books).await
    }

    // Books

    pub async fn search_books(&self, query: &BookQuery) -> AppResult<Vec<BookDetails>> {
        let books = self.repository.books.search(query).await?;
        self.with_genres(books).await
    }

    pub async fn books_in_stock(&self) -> AppResult<Vec<BookDetails>> {
        let books = self.repository.books.in_stock().await?;
        self.with_genres(books).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;
        let mut details = self.with_genres(vec![book]).await?;
        details
            .pop()
            .ok_or_else(|| AppError::Internal(format!("Book {} vanished while loading", id)))
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<BookDetails> {
        book.validate()?;
        check_publication_year(book.publication_year, Utc::now().year())?;

        self.repository.authors.get_by_id(book.author_id).await?;
        if self.repository.books.isbn_exists(&book.isbn, None).await? {
            return Err(AppError::Conflict(format!("ISBN {} is already catalogued", book.isbn)));
        }
        self.ensure_genres(&book.genre_ids).await?;

        let mut uow = self.repository.begin().await?;
        let created = self.repository.books.create(uow.conn(), &book).await?;
        self.repository
            .books
            .set_genres(uow.conn(), created.id, &book.genre_ids)
            .await?;
        uow.commit().await?;

        tracing::info!(book_id = created.id, isbn = %created.isbn, "Book created");
        self.get_book(created.id).await
    }

    pub async fn update_book(&self, id: i32, book: UpdateBook) -> AppResult<BookDetails> {
        book.validate()?;
        check_publication_year(book.publication_year, Utc::now().year())?;

        if let Some(author_id) = book.author_id {
            self.repository.authors.get_by_id(author_id).await?;
        }
        if let Some(ref isbn) = book.isbn {
            if self.repository.books.isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict(format!("ISBN {} is already catalogued", isbn)));
            }
        }
        if let Some(ref genre_ids) = book.genre_ids {
            self.ensure_genres(genre_ids).await?;
        }

        let mut uow = self.repository.begin().await?;
        self.repository.books.update(uow.conn(), id, &book).await?;
        if let Some(ref genre_ids) = book.genre_ids {
            self.repository.books.set_genres(uow.conn(), id, genre_ids).await?;
        }
        uow.commit().await?;

        self.get_book(id).await
    }

    /// Delete a book that has never been lent.
    ///
    /// Books with loan history go through the cascading delete instead.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut uow = self.repository.begin().await?;

        if self.repository.books.lock(uow.conn(), id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        let open = self.repository.loans.count_open_for_book(uow.conn(), id).await?;
        if open > 0 {
            return Err(AppError::Conflict(format!(
                "Book {} has {} active loan(s)",
                id, open
            )));
        }
        if self.repository.loans.count_for_book(uow.conn(), id).await? > 0 {
            return Err(AppError::Conflict(format!(
                "Book {} has loan history; delete it with its loans instead",
                id
            )));
        }

        self.repository.books.delete(uow.conn(), id).await?;
        uow.commit().await?;

        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    async fn ensure_genres(&self, genre_ids: &[i32]) -> AppResult<()> {
        if genre_ids.is_empty() {
            return Ok(());
        }
        let missing = self.repository.genres.missing(genre_ids).await?;
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!("Genres not found: {:?}", missing)));
        }
        Ok(())
    }

    async fn with_genres(&self, books: Vec<Book>) -> AppResult<Vec<BookDetails>> {
        let ids: Vec<i32> = books.iter().map(|b| b.id).collect();
        let mut links = self.repository.books.genre_ids_for(&ids).await?;

        Ok(books
            .into_iter()
            .map(|book| BookDetails {
                genre_ids: links.remove(&book.id).unwrap_or_default(),
                book,
            })
            .collect())
    }
}
