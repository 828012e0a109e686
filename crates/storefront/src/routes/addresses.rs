//! Address book route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use emporium_core::AddressId;
use emporium_core::address::{AddressPatch, AddressType, NewAddress};

use super::{ApiJson, ApiPath, ApiQuery, find_user, resolve_user};
use crate::db::addresses::AddressWriteError;
use crate::db::{AddressRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::Address;
use crate::state::AppState;

const ADDRESS_NOT_FOUND: &str = "Address not found";

fn address_not_found(err: RepositoryError) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(ADDRESS_NOT_FOUND.to_owned()),
        e => e.into(),
    }
}

/// Customer identification in the query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_email: Option<String>,
}

/// Listing query: customer plus optional type filter.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressListQuery {
    pub user_email: Option<String>,
    #[serde(rename = "type")]
    pub address_type: Option<String>,
}

/// Parse the `type` filter; `all` or nothing means no filter.
fn type_filter(raw: Option<&str>) -> Result<Option<AddressType>> {
    match raw.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(kind) => Ok(Some(kind.parse()?)),
    }
}

#[derive(Debug, Serialize)]
pub struct AddressListResponse {
    pub addresses: Vec<Address>,
}

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub address: Address,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// List the customer's active addresses, default first.
///
/// GET /api/addresses?userEmail=&type=
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AddressListQuery>,
) -> Result<Json<AddressListResponse>> {
    let user = resolve_user(&state, query.user_email.as_deref()).await?;
    let kind = type_filter(query.address_type.as_deref())?;

    let addresses = AddressRepository::new(state.pool())
        .list(user.id, kind)
        .await?;
    Ok(Json(AddressListResponse { addresses }))
}

/// Show one active address.
///
/// GET /api/addresses/{id}?userEmail=
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AddressId>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<AddressResponse>> {
    let user = resolve_user(&state, query.user_email.as_deref()).await?;

    let address = AddressRepository::new(state.pool())
        .get(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(ADDRESS_NOT_FOUND.to_owned()))?;
    Ok(Json(AddressResponse {
        message: None,
        address,
    }))
}

/// Address creation body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    pub user_email: Option<String>,
    #[serde(flatten)]
    pub address: NewAddress,
}

/// Create an address. The customer's first address becomes the default.
///
/// POST /api/addresses
///
/// # Errors
///
/// Returns 400 for a missing email or invalid fields and 404 for an unknown
/// customer.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateAddressRequest>,
) -> Result<(StatusCode, Json<AddressResponse>)> {
    let email = body
        .user_email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("userEmail is required".to_owned()))?;
    let fields = body.address.validate()?;
    let email = super::require_email(Some(email))?;
    let user = find_user(&state, &email).await?;

    let address = AddressRepository::new(state.pool())
        .create(user.id, &fields, body.address.is_default)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddressResponse {
            message: Some("Address created successfully"),
            address,
        }),
    ))
}

/// Address update body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    pub user_email: Option<String>,
    #[serde(flatten)]
    pub patch: AddressPatch,
}

/// Partially update an address.
///
/// PUT /api/addresses/{id}
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AddressId>,
    ApiJson(body): ApiJson<UpdateAddressRequest>,
) -> Result<Json<AddressResponse>> {
    let user = resolve_user(&state, body.user_email.as_deref()).await?;
    body.patch.validate()?;

    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &body.patch)
        .await
        .map_err(|e| match e {
            AddressWriteError::Repository(e) => address_not_found(e),
            e @ AddressWriteError::Invalid(_) => e.into(),
        })?;

    Ok(Json(AddressResponse {
        message: Some("Address updated successfully"),
        address,
    }))
}

/// Soft-delete an address.
///
/// DELETE /api/addresses/{id}?userEmail=
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<AddressId>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<MessageResponse>> {
    let user = resolve_user(&state, query.user_email.as_deref()).await?;

    AddressRepository::new(state.pool())
        .soft_delete(user.id, id)
        .await
        .map_err(address_not_found)?;

    Ok(Json(MessageResponse {
        message: "Address deleted successfully",
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_type_filter() {
        assert_eq!(type_filter(None).unwrap(), None);
        assert_eq!(type_filter(Some("all")).unwrap(), None);
        assert_eq!(
            type_filter(Some("shipping")).unwrap(),
            Some(AddressType::Shipping)
        );
        assert!(matches!(
            type_filter(Some("office")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_create_body_flattens_address() {
        let body: CreateAddressRequest = serde_json::from_value(serde_json::json!({
            "userEmail": "ayse@example.com",
            "title": "Ev",
            "firstName": "Ayse",
            "lastName": "Yilmaz",
            "phone": "0555 123 45 67",
            "addressLine1": "Bagdat Cad. No 1",
            "city": "Istanbul",
            "state": "Kadikoy",
            "postalCode": "34710",
            "isDefault": true
        }))
        .unwrap();

        assert!(body.address.is_default);
        let fields = body.address.validate().unwrap();
        assert_eq!(fields.address_type, AddressType::Both);
        assert_eq!(fields.country, "Turkey");
    }
}
