//! Book model, catalog queries and stock view

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub copies_available: i32,
    pub author_id: i32,
}

/// Book with its genre links, as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub genre_ids: Vec<i32>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1, max = 13, message = "ISBN must be at most 13 characters"))]
    pub isbn: String,
    #[validate(length(max = 100))]
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    #[validate(range(min = 0, message = "Copies cannot be negative"))]
    pub copies_available: i32,
    pub author_id: i32,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

/// Update book request; absent fields are left untouched
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 13, message = "ISBN must be at most 13 characters"))]
    pub isbn: Option<String>,
    #[validate(length(max = 100))]
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    #[validate(range(min = 0, message = "Copies cannot be negative"))]
    pub copies_available: Option<i32>,
    pub author_id: Option<i32>,
    /// Replaces all genre links when present
    pub genre_ids: Option<Vec<i32>>,
}

/// Catalog search parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Genre id filter
    pub genre: Option<i32>,
    /// Case-insensitive match on title, ISBN or publisher
    pub search: Option<String>,
}

/// Stock answer for one title
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Availability {
    pub book_id: i32,
    pub copies_available: i32,
    pub in_stock: bool,
}

/// Publication year must not be after the current year
pub fn check_publication_year(year: Option<i32>, current_year: i32) -> AppResult<()> {
    match year {
        Some(y) if y > current_year => Err(AppError::Validation(format!(
            "Publication year {} is in the future",
            y
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_publication_year() {
        assert!(check_publication_year(None, 2024).is_ok());
        assert!(check_publication_year(Some(2024), 2024).is_ok());
        assert!(check_publication_year(Some(1851), 2024).is_ok());
        assert!(check_publication_year(Some(2025), 2024).is_err());
    }

    #[test]
    fn test_negative_copies_rejected() {
        let book = CreateBook {
            title: "Dom Casmurro".to_string(),
            isbn: "9788535910667".to_string(),
            publisher: None,
            publication_year: Some(1899),
            copies_available: -1,
            author_id: 1,
            genre_ids: vec![],
        };
        assert!(book.validate().is_err());
    }

    #[test]
    fn test_isbn_longer_than_13_rejected() {
        let update = UpdateBook {
            isbn: Some("97885359106670".to_string()),
            ..Default::default()
        };
        assert!(update.validate().unwrap_err().field_errors().contains_key("isbn"));
    }

    #[test]
    fn test_details_flatten_book_fields() {
        let details = BookDetails {
            book: Book {
                id: 3,
                title: "Iracema".to_string(),
                isbn: "9788508133031".to_string(),
                publisher: None,
                publication_year: Some(1865),
                copies_available: 2,
                author_id: 1,
            },
            genre_ids: vec![4],
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["copies_available"], 2);
        assert_eq!(json["genre_ids"][0], 4);
    }
}
