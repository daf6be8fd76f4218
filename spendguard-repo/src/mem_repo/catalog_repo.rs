use crate::catalog_repo::{
    Account, CatalogRepo, CatalogRepoError, Category, NewAccount, NewCategory, NewTag, Tag,
};
use crate::mem_repo::State;
use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

pub struct MemCatalogRepo {
    state: Arc<RwLock<State>>,
}

impl MemCatalogRepo {
    pub fn new(state: Arc<RwLock<State>>) -> MemCatalogRepo {
        MemCatalogRepo { state }
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<State>, anyhow::Error> {
        self.state
            .read()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<State>, anyhow::Error> {
        self.state
            .write()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }
}

fn name_taken(state: &State, name: &str, exclude: Option<Uuid>, category: bool) -> bool {
    if category {
        state
            .categories
            .values()
            .any(|c| c.name.eq_ignore_ascii_case(name.trim()) && Some(c.id) != exclude)
    } else {
        state
            .accounts
            .values()
            .any(|a| a.name == name.trim() && Some(a.id) != exclude)
    }
}

#[async_trait]
impl CatalogRepo for MemCatalogRepo {
    async fn get_categories(&self) -> Result<Vec<Category>, CatalogRepoError> {
        let read_guard = self.read_lock()?;
        let mut categories: Vec<Category> = read_guard.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_category(
        &self,
        new_category: NewCategory,
    ) -> Result<Category, CatalogRepoError> {
        let mut write_guard = self.write_lock()?;
        if name_taken(&write_guard, &new_category.name, None, true) {
            return Err(CatalogRepoError::NameTaken(new_category.name));
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: new_category.name,
            kind: new_category.kind,
            icon: new_category.icon,
            color: new_category.color,
        };
        write_guard.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        category_id: Uuid,
        update: NewCategory,
    ) -> Result<Category, CatalogRepoError> {
        let mut write_guard = self.write_lock()?;
        if !write_guard.categories.contains_key(&category_id) {
            return Err(CatalogRepoError::NotFound(category_id));
        }
        if name_taken(&write_guard, &update.name, Some(category_id), true) {
            return Err(CatalogRepoError::NameTaken(update.name));
        }
        let category = Category {
            id: category_id,
            name: update.name,
            kind: update.kind,
            icon: update.icon,
            color: update.color,
        };
        write_guard.categories.insert(category_id, category.clone());
        Ok(category)
    }

    async fn delete_category(&self, category_id: Uuid) -> Result<(), CatalogRepoError> {
        let mut write_guard = self.write_lock()?;
        if !write_guard.categories.contains_key(&category_id) {
            return Err(CatalogRepoError::NotFound(category_id));
        }
        let in_use = write_guard
            .transactions
            .values()
            .any(|t| t.category_id == category_id);
        if in_use {
            return Err(CatalogRepoError::InUse(category_id));
        }
        write_guard.categories.remove(&category_id);
        Ok(())
    }

    async fn get_accounts(&self) -> Result<Vec<Account>, CatalogRepoError> {
        let read_guard = self.read_lock()?;
        let mut accounts: Vec<Account> = read_guard.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    async fn create_account(&self, new_account: NewAccount) -> Result<Account, CatalogRepoError> {
        let mut write_guard = self.write_lock()?;
        if name_taken(&write_guard, &new_account.name, None, false) {
            return Err(CatalogRepoError::NameTaken(new_account.name));
        }
        let account = Account {
            id: Uuid::new_v4(),
            name: new_account.name,
            kind: new_account.kind,
        };
        write_guard.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_account(
        &self,
        account_id: Uuid,
        update: NewAccount,
    ) -> Result<Account, CatalogRepoError> {
        let mut write_guard = self.write_lock()?;
        if !write_guard.accounts.contains_key(&account_id) {
            return Err(CatalogRepoError::NotFound(account_id));
        }
        if name_taken(&write_guard, &update.name, Some(account_id), false) {
            return Err(CatalogRepoError::NameTaken(update.name));
        }
        let account = Account {
            id: account_id,
            name: update.name,
            kind: update.kind,
        };
        write_guard.accounts.insert(account_id, account.clone());
        Ok(account)
    }

    async fn delete_account(&self, account_id: Uuid) -> Result<(), CatalogRepoError> {
        let mut write_guard = self.write_lock()?;
        if write_guard.accounts.remove(&account_id).is_none() {
            return Err(CatalogRepoError::NotFound(account_id));
        }
        // Same behavior as the set-null foreign key.
        for transaction in write_guard.transactions.values_mut() {
            if transaction.account_id == Some(account_id) {
                transaction.account_id = None;
            }
        }
        Ok(())
    }

    async fn get_tags(&self) -> Result<Vec<Tag>, CatalogRepoError> {
        let read_guard = self.read_lock()?;
        let mut tags: Vec<Tag> = read_guard.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, CatalogRepoError> {
        let mut write_guard = self.write_lock()?;
        let name = name.trim();
        if let Some(tag) = write_guard.tags.values().find(|t| t.name == name) {
            return Ok(tag.clone());
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        write_guard.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn update_tag(&self, tag_id: Uuid, update: NewTag) -> Result<Tag, CatalogRepoError> {
        let mut write_guard = self.write_lock()?;
        let old_name = match write_guard.tags.get(&tag_id) {
            Some(tag) => tag.name.clone(),
            None => return Err(CatalogRepoError::NotFound(tag_id)),
        };
        let name = update.name.trim().to_string();
        let taken = write_guard
            .tags
            .values()
            .any(|t| t.name == name && t.id != tag_id);
        if taken {
            return Err(CatalogRepoError::NameTaken(name));
        }
        for transaction in write_guard.transactions.values_mut() {
            for tag in transaction.tags.iter_mut() {
                if *tag == old_name {
                    *tag = name.clone();
                }
            }
        }
        let tag = Tag { id: tag_id, name };
        write_guard.tags.insert(tag_id, tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, tag_id: Uuid) -> Result<(), CatalogRepoError> {
        let mut write_guard = self.write_lock()?;
        let Some(tag) = write_guard.tags.remove(&tag_id) else {
            return Err(CatalogRepoError::NotFound(tag_id));
        };
        for transaction in write_guard.transactions.values_mut() {
            transaction.tags.retain(|name| name != &tag.name);
        }
        Ok(())
    }
}
