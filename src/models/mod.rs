//! Data models for Biblio

pub mod author;
pub mod book;
pub mod genre;
pub mod loan;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetails};
pub use genre::Genre;
pub use loan::{Loan, LoanDetails, LoanStatus};
pub use user::{Role, User, UserClaims};
