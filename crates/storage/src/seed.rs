use anyhow::{Context, Result};
use shared::domain::{Contact, ContactUpdate};

use crate::ContactStore;

const DEMO_CONTACTS: &[(&str, &str, &str, &str)] = &[
    ("Ana", "Smith", "@anasmith", "Runs the Thursday reading group."),
    ("Bob", "Jones", "@bobjones", "Met at the systems meetup."),
    ("Carla", "Mendes", "@cmendes", ""),
    ("Dmitri", "Volkov", "", "Owes me a book."),
    ("Erin", "O'Neil", "@erin_oneil", ""),
    ("Farid", "Haddad", "@fhaddad", "Prefers email over chat."),
];

pub fn demo_contacts() -> Vec<ContactUpdate> {
    DEMO_CONTACTS
        .iter()
        .map(|(first, last, twitter, notes)| {
            ContactUpdate {
                first: Some((*first).to_string()),
                last: Some((*last).to_string()),
                avatar: None,
                twitter: Some((*twitter).to_string()),
                notes: Some((*notes).to_string()),
            }
            .normalized()
        })
        .collect()
}

/// Creates one contact per entry, in order.
pub async fn seed_contacts(
    store: &dyn ContactStore,
    contacts: Vec<ContactUpdate>,
) -> Result<Vec<Contact>> {
    let mut created = Vec::with_capacity(contacts.len());
    for update in contacts {
        let contact = store.create_empty_contact().await?;
        let stored = store
            .update_contact(&contact.id, update)
            .await?
            .with_context(|| format!("seeded contact '{}' disappeared", contact.id))?;
        created.push(stored);
    }
    Ok(created)
}
