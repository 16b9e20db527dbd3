//! Loaders and actions for the contacts app.
//!
//! Loaders read what a page needs; actions perform a mutation and answer with
//! a [`Redirect`]. Both are transport-agnostic and return [`ApiError`] so the
//! HTTP layer only has to map codes to status lines.

use std::sync::Arc;

use shared::{
    domain::{Contact, ContactId, ContactUpdate},
    error::{ApiError, ErrorCode},
    protocol::{contact_route, edit_contact_route, home_route, Redirect, RootData},
};
use storage::ContactStore;
use tracing::{error, info};

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn ContactStore>,
}

impl ApiContext {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }
}

/// Root loader: the sidebar contacts, filtered by `query` when one is given.
/// The query is echoed back untouched so callers can tell "never searched"
/// (`None`) from "search cleared" (`Some("")`).
pub async fn load_root(ctx: &ApiContext, query: Option<String>) -> Result<RootData, ApiError> {
    let contacts = ctx
        .store
        .list_contacts(query.as_deref())
        .await
        .map_err(internal)?;
    Ok(RootData { contacts, query })
}

/// "New" action: creates an empty contact and sends the client to its editor.
pub async fn create_contact(ctx: &ApiContext) -> Result<Redirect, ApiError> {
    let contact = ctx.store.create_empty_contact().await.map_err(internal)?;
    info!(contact_id = %contact.id, "created empty contact");
    Ok(Redirect::to(edit_contact_route(&contact.id)))
}

/// Destroy action. The store's answer is not inspected: once the delete has
/// been requested the client always goes home.
pub async fn destroy_contact(
    ctx: &ApiContext,
    contact_id: Option<&str>,
) -> Result<Redirect, ApiError> {
    let contact_id = require_param(contact_id, "contactId")?;
    ctx.store
        .delete_contact(&contact_id)
        .await
        .map_err(internal)?;
    info!(contact_id = %contact_id, "deleted contact");
    Ok(Redirect::to(home_route()))
}

pub async fn load_contact(ctx: &ApiContext, contact_id: Option<&str>) -> Result<Contact, ApiError> {
    let contact_id = require_param(contact_id, "contactId")?;
    ctx.store
        .get_contact(&contact_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(&contact_id))
}

pub async fn update_contact(
    ctx: &ApiContext,
    contact_id: Option<&str>,
    update: ContactUpdate,
) -> Result<Redirect, ApiError> {
    let contact_id = require_param(contact_id, "contactId")?;
    let contact = ctx
        .store
        .update_contact(&contact_id, update)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(&contact_id))?;
    info!(contact_id = %contact.id, "updated contact");
    Ok(Redirect::to(contact_route(&contact.id)))
}

pub async fn set_favorite(
    ctx: &ApiContext,
    contact_id: Option<&str>,
    favorite: bool,
) -> Result<Redirect, ApiError> {
    let contact_id = require_param(contact_id, "contactId")?;
    let contact = ctx
        .store
        .set_favorite(&contact_id, favorite)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(&contact_id))?;
    Ok(Redirect::to(contact_route(&contact.id)))
}

/// Reads the `favorite` form field. Only `true` and `false` are accepted.
pub fn parse_favorite(value: Option<&str>) -> Result<bool, ApiError> {
    match value {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(ApiError::validation(format!(
            "favorite must be `true` or `false`, got `{other}`"
        ))),
        None => Err(ApiError::validation("missing form field `favorite`")),
    }
}

/// Turns a route parameter that the router should always supply into a
/// [`ContactId`]. Absence means the routes are wired wrong, so it is reported
/// as [`ErrorCode::Invariant`] rather than a validation failure. A present
/// value is used verbatim; a blank one counts as absent.
pub fn require_param(value: Option<&str>, name: &str) -> Result<ContactId, ApiError> {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(value) => Ok(ContactId::from(value)),
        None => {
            error!(param = name, "required route parameter missing");
            Err(ApiError::invariant(format!("missing route parameter `{name}`")))
        }
    }
}

fn not_found(contact_id: &ContactId) -> ApiError {
    ApiError::not_found(format!("no contact found for {contact_id}"))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("{err:#}"))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
