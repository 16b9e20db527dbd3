use serde::{Deserialize, Serialize};

use crate::domain::{Contact, ContactId};

/// Value of the `_data` query parameter that asks for the root loader as JSON.
pub const ROOT_DATA_KEY: &str = "root";

/// Output of the root loader: the sidebar contacts and the query they were filtered by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootData {
    pub contacts: Vec<Contact>,
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub location: String,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

pub fn home_route() -> &'static str {
    "/"
}

pub fn contact_route(id: &ContactId) -> String {
    format!("/contacts/{id}")
}

pub fn edit_contact_route(id: &ContactId) -> String {
    format!("/contacts/{id}/edit")
}

pub fn destroy_contact_route(id: &ContactId) -> String {
    format!("/contacts/{id}/destroy")
}
