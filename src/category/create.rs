//! Category creation endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    Error,
    auth::AuthUser,
    category::{Category, CategoryName, NewCategory},
    database_id::CategoryId,
    ledger::LedgerService,
};

/// The request body for creating a category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
}

/// Handle a request to create a category for the signed in user.
pub async fn create_category_endpoint(
    State(ledger): State<LedgerService>,
    user: AuthUser,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Category>), Error> {
    let Json(request) = payload?;

    let new_category = NewCategory {
        name: CategoryName::new(&request.name)?,
        parent_id: request.parent_id,
    };

    let category = ledger.create_category(user.user_id, new_category).await?;

    Ok((StatusCode::CREATED, Json(category)))
}
