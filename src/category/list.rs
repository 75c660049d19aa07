//! Category listing endpoint.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    Error, auth::AuthUser, category::Category, ledger::LedgerService,
    pagination::parse_or_default,
};

/// The query parameters for listing categories.
///
/// Pagination values are kept as raw strings so that values that are not
/// integers fall back to the defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListCategoriesQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub name: Option<String>,
}

/// Handle a request for a page of the signed in user's categories.
pub async fn list_categories_endpoint(
    State(ledger): State<LedgerService>,
    user: AuthUser,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<Vec<Category>>, Error> {
    let limit = parse_or_default(query.limit.as_deref(), 0);
    let offset = parse_or_default(query.offset.as_deref(), 0);

    let categories = ledger
        .list_categories(user.user_id, limit, offset, query.name)
        .await?;

    Ok(Json(categories))
}
