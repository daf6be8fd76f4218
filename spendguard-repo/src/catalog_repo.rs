use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Lookup-and-CRUD surface for the reference entities a transaction points
/// at. The transaction write path resolves against the same tables inside
/// its own store transaction; this trait backs the plain single-table
/// routes.
#[async_trait]
pub trait CatalogRepo: Sync + Send {
    async fn get_categories(&self) -> Result<Vec<Category>, CatalogRepoError>;

    async fn create_category(
        &self,
        new_category: NewCategory,
    ) -> Result<Category, CatalogRepoError>;

    async fn update_category(
        &self,
        category_id: Uuid,
        update: NewCategory,
    ) -> Result<Category, CatalogRepoError>;

    async fn delete_category(&self, category_id: Uuid) -> Result<(), CatalogRepoError>;

    async fn get_accounts(&self) -> Result<Vec<Account>, CatalogRepoError>;

    async fn create_account(&self, new_account: NewAccount) -> Result<Account, CatalogRepoError>;

    async fn update_account(
        &self,
        account_id: Uuid,
        update: NewAccount,
    ) -> Result<Account, CatalogRepoError>;

    async fn delete_account(&self, account_id: Uuid) -> Result<(), CatalogRepoError>;

    async fn get_tags(&self) -> Result<Vec<Tag>, CatalogRepoError>;

    /// Idempotent: returns the existing tag when the name is already taken.
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, CatalogRepoError>;

    async fn update_tag(&self, tag_id: Uuid, update: NewTag) -> Result<Tag, CatalogRepoError>;

    async fn delete_tag(&self, tag_id: Uuid) -> Result<(), CatalogRepoError>;
}

#[derive(Error, Debug)]
pub enum CatalogRepoError {
    #[error("No entry with id {0}")]
    NotFound(Uuid),
    #[error("Name {0:?} already taken")]
    NameTaken(String),
    #[error("Entry {0} is referenced by existing transactions")]
    InUse(Uuid),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewTag {
    pub name: String,
}
