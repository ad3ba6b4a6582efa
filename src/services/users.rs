//! User account management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{Role, UpdateUser, User},
    repository::Repository,
};

use super::auth::hash_password;

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self, role: Option<Role>) -> AppResult<Vec<User>> {
        self.repository.users.list(role).await
    }

    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Check the stored role, not the token's.
    ///
    /// Tokens keep the role they were issued with until they expire, so a
    /// demoted or deleted librarian is caught here.
    pub async fn require_current_librarian(&self, user_id: i32) -> AppResult<()> {
        let user = match self.repository.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("Account no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };

        if user.role != Role::Librarian {
            tracing::warn!(user_id, "Token role is stale; librarian rights revoked");
            return Err(AppError::Authorization(
                "Librarian role is no longer held by this account".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn update_user(&self, id: i32, update: UpdateUser) -> AppResult<User> {
        update.validate()?;

        if let Some(ref email) = update.email {
            if self.repository.users.email_exists(email, Some(id)).await? {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }

        let password_hash = update.password.as_deref().map(hash_password).transpose()?;

        let user = self
            .repository
            .users
            .update(
                id,
                update.name.as_deref().map(str::trim),
                update.email.as_deref(),
                password_hash.as_deref(),
                update.role,
            )
            .await?;

        tracing::info!(user_id = id, "User updated");
        Ok(user)
    }

    /// Users that appear on any loan are kept for the loan history
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        self.repository.users.get_by_id(id).await?;

        let loans = self.repository.loans.count_for_user(id).await?;
        if loans > 0 {
            return Err(AppError::Conflict(format!(
                "User {} appears on {} loan(s)",
                id, loans
            )));
        }

        self.repository.users.delete(id).await?;
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}
