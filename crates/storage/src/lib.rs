use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Contact, ContactId, ContactUpdate};

mod seed;

pub use seed::{demo_contacts, seed_contacts};

/// The contact data layer the loaders and actions talk to.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Contacts matching `query`, ordered by last name and then creation.
    /// `None` and an empty query both return every contact.
    async fn list_contacts(&self, query: Option<&str>) -> Result<Vec<Contact>>;

    async fn create_empty_contact(&self) -> Result<Contact>;

    async fn get_contact(&self, id: &ContactId) -> Result<Option<Contact>>;

    async fn update_contact(&self, id: &ContactId, update: ContactUpdate)
        -> Result<Option<Contact>>;

    async fn set_favorite(&self, id: &ContactId, favorite: bool) -> Result<Option<Contact>>;

    /// Deleting an id that does not exist is not an error.
    async fn delete_contact(&self, id: &ContactId) -> Result<()>;

    async fn health_check(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

const CONTACT_COLUMNS: &str = "id, first, last, avatar, twitter, notes, favorite, created_at";

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn count_contacts(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts")
            .fetch_one(&self.pool)
            .await
            .context("failed to count contacts")?;
        Ok(count)
    }
}

#[async_trait]
impl ContactStore for Storage {
    async fn list_contacts(&self, query: Option<&str>) -> Result<Vec<Contact>> {
        // rowid follows insertion order, which stands in for creation order
        let rows = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts
             ORDER BY last IS NULL, last COLLATE NOCASE, rowid"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list contacts")?;

        let contacts = rows
            .iter()
            .map(contact_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(needle) => contacts
                .into_iter()
                .filter(|contact| matches_query(contact, needle))
                .collect(),
            None => contacts,
        })
    }

    async fn create_empty_contact(&self) -> Result<Contact> {
        let contact = Contact::empty(ContactId::generate(), Utc::now());
        sqlx::query("INSERT INTO contacts (id, favorite, created_at) VALUES (?, 0, ?)")
            .bind(contact.id.as_str())
            .bind(contact.created_at)
            .execute(&self.pool)
            .await
            .context("failed to insert empty contact")?;
        Ok(contact)
    }

    async fn get_contact(&self, id: &ContactId) -> Result<Option<Contact>> {
        let row = sqlx::query(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load contact '{id}'"))?;
        row.as_ref().map(contact_from_row).transpose()
    }

    async fn update_contact(
        &self,
        id: &ContactId,
        update: ContactUpdate,
    ) -> Result<Option<Contact>> {
        let update = update.normalized();
        let result = sqlx::query(
            "UPDATE contacts
             SET first = ?, last = ?, avatar = ?, twitter = ?, notes = ?
             WHERE id = ?",
        )
        .bind(update.first)
        .bind(update.last)
        .bind(update.avatar)
        .bind(update.twitter)
        .bind(update.notes)
        .bind(id.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to update contact '{id}'"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_contact(id).await
    }

    async fn set_favorite(&self, id: &ContactId, favorite: bool) -> Result<Option<Contact>> {
        let result = sqlx::query("UPDATE contacts SET favorite = ? WHERE id = ?")
            .bind(favorite)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to set favorite on contact '{id}'"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_contact(id).await
    }

    async fn delete_contact(&self, id: &ContactId) -> Result<()> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete contact '{id}'"))?;
        if result.rows_affected() == 0 {
            tracing::debug!(contact_id = %id, "delete matched no contact");
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

/// Case-insensitive substring match against the first name, the last name or
/// the full display name.
pub fn matches_query(contact: &Contact, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let contains = |value: Option<&str>| {
        value
            .map(|v| v.to_lowercase().contains(&needle))
            .unwrap_or(false)
    };
    contains(contact.first.as_deref())
        || contains(contact.last.as_deref())
        || contains(contact.display_name().as_deref())
}

fn contact_from_row(row: &SqliteRow) -> Result<Contact> {
    Ok(Contact {
        id: ContactId(row.try_get::<String, _>("id")?),
        first: row.try_get("first")?,
        last: row.try_get("last")?,
        avatar: row.try_get("avatar")?,
        twitter: row.try_get("twitter")?,
        notes: row.try_get("notes")?,
        favorite: row.try_get::<bool, _>("favorite")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
