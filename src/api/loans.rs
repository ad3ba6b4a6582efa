//! Loan endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{CreateLoan, LoanDetails, LoanQuery, ReturnLoan, UpdateLoan},
        user::Role,
    },
};

use super::AuthenticatedUser;

/// Loans of one borrower
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Borrower ID")),
    responses(
        (status = 200, description = "Borrower's loans, newest first", body = Vec<LoanDetails>),
        (status = 403, description = "Not your account"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_self_or_librarian(user_id)?;

    let loans = state.services.loans.get_user_loans(user_id).await?;
    Ok(Json(loans))
}

/// List loans, optionally by status
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans", body = Vec<LoanDetails>),
        (status = 403, description = "Librarian role required")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<LoanDetails>>> {
    claims.require_librarian()?;
    Ok(Json(state.services.loans.list_loans(query.status).await?))
}

/// Get loan by ID
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan", body = LoanDetails),
        (status = 403, description = "Not your loan"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_any(&[Role::Reader, Role::Librarian])?;

    let loan = state.services.loans.get_loan(id).await?;
    claims.require_self_or_librarian(loan.borrower_id)?;
    Ok(Json(loan))
}

/// Lend a copy of a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoan,
    responses(
        (status = 201, description = "Loan created", body = LoanDetails),
        (status = 400, description = "Invalid dates or librarian"),
        (status = 403, description = "Readers may only borrow for themselves"),
        (status = 404, description = "Book or user not found"),
        (status = 409, description = "No copies left")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoan>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    claims.require_any(&[Role::Reader, Role::Librarian])?;
    claims.require_self_or_librarian(request.borrower_id)?;
    if claims.user_id != request.borrower_id {
        state.services.users.require_current_librarian(claims.user_id).await?;
    }

    let loan = state.services.loans.create_loan(request).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed copy.
///
/// The body is optional; an empty body returns the copy now, recorded
/// against the caller.
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = ReturnLoan,
    responses(
        (status = 200, description = "Loan returned", body = LoanDetails),
        (status = 400, description = "Malformed body or return before loan time"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Bytes,
) -> AppResult<Json<LoanDetails>> {
    claims.require_librarian()?;

    let request = parse_return_body(&body)?;
    state.services.users.require_current_librarian(claims.user_id).await?;
    let librarian_id = request.librarian_id.unwrap_or(claims.user_id);

    let loan = state
        .services
        .loans
        .return_loan(id, librarian_id, request.actual_return)
        .await?;
    Ok(Json(loan))
}

/// Update an open loan's borrower, librarian or due date
#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    request_body = UpdateLoan,
    responses(
        (status = 200, description = "Loan updated", body = LoanDetails),
        (status = 400, description = "Invalid fields"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan already returned")
    )
)]
pub async fn update_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(update): Json<UpdateLoan>,
) -> AppResult<Json<LoanDetails>> {
    claims.require_librarian()?;
    state.services.users.require_current_librarian(claims.user_id).await?;
    Ok(Json(state.services.loans.update_loan(id, update).await?))
}

/// Delete a returned loan record
#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Loan ID")),
    responses(
        (status = 204, description = "Loan deleted"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Loan is still open")
    )
)]
pub async fn delete_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    claims.require_librarian()?;
    state.services.users.require_current_librarian(claims.user_id).await?;

    state.services.loans.delete_loan(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Empty body means defaults; anything else must be a valid `ReturnLoan`
fn parse_return_body(body: &[u8]) -> AppResult<ReturnLoan> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ReturnLoan::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid return request: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_return_body_uses_defaults() {
        let request = parse_return_body(b"").unwrap();
        assert!(request.librarian_id.is_none());
        assert!(request.actual_return.is_none());
        assert!(parse_return_body(b"  \n").is_ok());
    }

    #[test]
    fn test_return_body_fields_are_read() {
        let request =
            parse_return_body(br#"{"librarian_id": 3, "actual_return": "2024-03-10T12:00:00Z"}"#).unwrap();
        assert_eq!(request.librarian_id, Some(3));
        assert!(request.actual_return.is_some());
    }

    #[test]
    fn test_malformed_return_body_is_rejected() {
        for body in [
            &br#"{"actual_return": "not-a-date"}"#[..],
            &br#"{"librarian_id": "x"}"#[..],
            &b"{"[..],
        ] {
            assert!(matches!(parse_return_body(body), Err(AppError::BadRequest(_))));
        }
    }
}
