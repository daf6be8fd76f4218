use crate::catalog_repo::{
    Account, CatalogRepo, CatalogRepoError, Category, NewAccount, NewCategory, NewTag, Tag,
};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::instrument;
use uuid::Uuid;

pub struct SQLxCatalogRepo {
    pool: Pool<Postgres>,
}

impl SQLxCatalogRepo {
    pub fn new(pool: Pool<Postgres>) -> SQLxCatalogRepo {
        SQLxCatalogRepo { pool }
    }
}

fn db_error_code(error: &sqlx::Error) -> Option<String> {
    if let sqlx::Error::Database(db_error) = error {
        db_error.code().map(|code| code.to_string())
    } else {
        None
    }
}

/// Unique-name violation on insert or rename.
fn name_error(error: sqlx::Error, name: &str) -> CatalogRepoError {
    match db_error_code(&error).as_deref() {
        Some("23505") => CatalogRepoError::NameTaken(name.to_string()),
        _ => CatalogRepoError::Other(error.into()),
    }
}

/// Restrict-FK violation when deleting an entry transactions still point at.
fn delete_error(error: sqlx::Error, id: Uuid) -> CatalogRepoError {
    match db_error_code(&error).as_deref() {
        Some("23503") => CatalogRepoError::InUse(id),
        _ => CatalogRepoError::Other(error.into()),
    }
}

#[async_trait]
impl CatalogRepo for SQLxCatalogRepo {
    #[instrument(skip(self))]
    async fn get_categories(&self) -> Result<Vec<Category>, CatalogRepoError> {
        let rows: Vec<(Uuid, String, String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT id, name, category_type, icon, color FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Unable to get categories")?;
        Ok(rows
            .into_iter()
            .map(|(id, name, kind, icon, color)| Category {
                id,
                name,
                kind,
                icon,
                color,
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn create_category(
        &self,
        new_category: NewCategory,
    ) -> Result<Category, CatalogRepoError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO categories (name, category_type, icon, color) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&new_category.name)
        .bind(&new_category.kind)
        .bind(&new_category.icon)
        .bind(&new_category.color)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| name_error(e, &new_category.name))?;
        Ok(Category {
            id,
            name: new_category.name,
            kind: new_category.kind,
            icon: new_category.icon,
            color: new_category.color,
        })
    }

    #[instrument(skip(self))]
    async fn update_category(
        &self,
        category_id: Uuid,
        update: NewCategory,
    ) -> Result<Category, CatalogRepoError> {
        let result = sqlx::query(
            "UPDATE categories SET name = $1, category_type = $2, icon = $3, color = $4 \
             WHERE id = $5",
        )
        .bind(&update.name)
        .bind(&update.kind)
        .bind(&update.icon)
        .bind(&update.color)
        .bind(category_id)
        .execute(&self.pool)
        .await
        .map_err(|e| name_error(e, &update.name))?;
        if result.rows_affected() == 0 {
            return Err(CatalogRepoError::NotFound(category_id));
        }
        Ok(Category {
            id: category_id,
            name: update.name,
            kind: update.kind,
            icon: update.icon,
            color: update.color,
        })
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, category_id: Uuid) -> Result<(), CatalogRepoError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, category_id))?;
        if result.rows_affected() == 0 {
            return Err(CatalogRepoError::NotFound(category_id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_accounts(&self) -> Result<Vec<Account>, CatalogRepoError> {
        let rows: Vec<(Uuid, String, String)> =
            sqlx::query_as("SELECT id, name, account_type FROM accounts ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .context("Unable to get accounts")?;
        Ok(rows
            .into_iter()
            .map(|(id, name, kind)| Account { id, name, kind })
            .collect())
    }

    #[instrument(skip(self))]
    async fn create_account(&self, new_account: NewAccount) -> Result<Account, CatalogRepoError> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO accounts (name, account_type) VALUES ($1, $2) RETURNING id",
        )
        .bind(&new_account.name)
        .bind(&new_account.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| name_error(e, &new_account.name))?;
        Ok(Account {
            id,
            name: new_account.name,
            kind: new_account.kind,
        })
    }

    #[instrument(skip(self))]
    async fn update_account(
        &self,
        account_id: Uuid,
        update: NewAccount,
    ) -> Result<Account, CatalogRepoError> {
        let result = sqlx::query("UPDATE accounts SET name = $1, account_type = $2 WHERE id = $3")
            .bind(&update.name)
            .bind(&update.kind)
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(|e| name_error(e, &update.name))?;
        if result.rows_affected() == 0 {
            return Err(CatalogRepoError::NotFound(account_id));
        }
        Ok(Account {
            id: account_id,
            name: update.name,
            kind: update.kind,
        })
    }

    #[instrument(skip(self))]
    async fn delete_account(&self, account_id: Uuid) -> Result<(), CatalogRepoError> {
        // Transactions keep their row and fall back to a null account.
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, account_id))?;
        if result.rows_affected() == 0 {
            return Err(CatalogRepoError::NotFound(account_id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_tags(&self) -> Result<Vec<Tag>, CatalogRepoError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, name FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Unable to get tags")?;
        Ok(rows.into_iter().map(|(id, name)| Tag { id, name }).collect())
    }

    #[instrument(skip(self))]
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, CatalogRepoError> {
        let name = name.trim();
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO tags (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .context("Unable to create tag")?;
        Ok(Tag {
            id,
            name: name.to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn update_tag(&self, tag_id: Uuid, update: NewTag) -> Result<Tag, CatalogRepoError> {
        let name = update.name.trim().to_string();
        let result = sqlx::query("UPDATE tags SET name = $1 WHERE id = $2")
            .bind(&name)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(|e| name_error(e, &name))?;
        if result.rows_affected() == 0 {
            return Err(CatalogRepoError::NotFound(tag_id));
        }
        Ok(Tag { id: tag_id, name })
    }

    #[instrument(skip(self))]
    async fn delete_tag(&self, tag_id: Uuid) -> Result<(), CatalogRepoError> {
        // Link rows cascade, so the tag silently disappears from any
        // transactions that carried it.
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .context("Unable to delete tag")?;
        if result.rows_affected() == 0 {
            return Err(CatalogRepoError::NotFound(tag_id));
        }
        Ok(())
    }
}
