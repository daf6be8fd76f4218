use crate::catalog_repo::{Account, Tag};
use crate::mem_repo::{view_order, State, StoredTransaction};
use crate::transaction_repo::TransactionRepoError::TransactionNotFound;
use crate::transaction_repo::{
    combined_timestamp, normalize_tags, CategoryRef, Filter, MerchantBreakdown, MerchantTotal,
    NewTransaction, Stats, Transaction, TransactionRepo, TransactionRepoError, TransactionType,
    TransactionUpdate,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

pub struct MemTransactionRepo {
    state: Arc<RwLock<State>>,
}

impl MemTransactionRepo {
    pub fn new(state: Arc<RwLock<State>>) -> MemTransactionRepo {
        MemTransactionRepo { state }
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

fn to_view(state: &State, stored: &StoredTransaction) -> Transaction {
    let category_icon = state
        .categories
        .get(&stored.category_id)
        .and_then(|c| c.icon.clone());
    let payment_method = stored
        .account_id
        .and_then(|id| state.accounts.get(&id))
        .map(|a| a.name.clone());
    let mut tags = stored.tags.clone();
    tags.sort();
    Transaction::new(
        stored.id,
        stored.merchant.clone(),
        stored.amount,
        stored.kind,
        stored.category_id,
        category_icon,
        combined_timestamp(stored.date, stored.time),
        tags,
        stored.notes.clone(),
        payment_method,
    )
}

fn resolve_category(state: &State, category: &CategoryRef) -> Result<Uuid, TransactionRepoError> {
    match category {
        CategoryRef::Id(id) => {
            if state.categories.contains_key(id) {
                Ok(*id)
            } else {
                Err(TransactionRepoError::InvalidReference)
            }
        }
        CategoryRef::Name(name) => state
            .category_by_name(name)
            .map(|c| c.id)
            .ok_or_else(|| TransactionRepoError::InvalidCategory(name.clone())),
    }
}

fn resolve_account(state: &mut State, name: &str) -> Uuid {
    if let Some(account) = state.account_by_name(name) {
        return account.id;
    }
    let account = Account {
        id: Uuid::new_v4(),
        name: name.trim().to_string(),
        kind: "other".to_string(),
    };
    let id = account.id;
    state.accounts.insert(id, account);
    id
}

fn register_tags(state: &mut State, tags: &[String]) -> Vec<String> {
    let normalized = normalize_tags(tags);
    for name in &normalized {
        if state.tag_by_name(name).is_none() {
            let tag = Tag {
                id: Uuid::new_v4(),
                name: name.clone(),
            };
            state.tags.insert(tag.id, tag);
        }
    }
    normalized
}

#[async_trait]
impl TransactionRepo for MemTransactionRepo {
    async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Transaction, TransactionRepoError> {
        let read_guard = self.read_lock()?;
        read_guard
            .transactions
            .get(&transaction_id)
            .map(|stored| to_view(&read_guard, stored))
            .ok_or(TransactionNotFound(transaction_id))
    }

    async fn get_all_transactions(
        &self,
        filter: Filter,
    ) -> Result<Vec<Transaction>, TransactionRepoError> {
        let read_guard = self.read_lock()?;

        // Mirrors the database repo: filter tags that do not exist cannot
        // match any transaction.
        let mut tag_names: Option<Vec<String>> = None;
        if let Some(tags) = &filter.tags {
            let names = normalize_tags(tags);
            if !names.is_empty() {
                let known: Vec<String> = names
                    .into_iter()
                    .filter(|name| read_guard.tag_by_name(name).is_some())
                    .collect();
                if known.is_empty() {
                    return Ok(Vec::new());
                }
                tag_names = Some(known);
            }
        }

        let mut stored: Vec<&StoredTransaction> = read_guard.transactions.values().collect();
        stored.sort_by(|a, b| view_order(a, b));

        let mut stored: Box<dyn Iterator<Item = &StoredTransaction>> = Box::new(stored.into_iter());
        if let Some(from) = filter.from {
            stored = Box::new(stored.filter(move |t| t.date >= from));
        }
        if let Some(until) = filter.until {
            stored = Box::new(stored.filter(move |t| t.date <= until));
        }
        if let Some(categories) = &filter.categories {
            stored = Box::new(stored.filter(move |t| categories.contains(&t.category_id)));
        }
        if let Some(merchants) = &filter.merchants {
            stored = Box::new(stored.filter(move |t| merchants.contains(&t.merchant)));
        }
        if let Some(kind) = filter.kind {
            stored = Box::new(stored.filter(move |t| t.kind == kind));
        }
        if let Some(tag_names) = &tag_names {
            stored = Box::new(
                stored.filter(move |t| tag_names.iter().any(|name| t.tags.contains(name))),
            );
        }

        if let Some(offset) = filter.offset {
            stored = Box::new(stored.skip(offset as usize));
        }
        if let Some(limit) = filter.limit {
            stored = Box::new(stored.take(limit as usize));
        }

        Ok(stored.map(|t| to_view(&read_guard, t)).collect())
    }

    async fn create_new_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut write_guard = self.write_lock()?;

        let category_id = resolve_category(&write_guard, &new_transaction.category)?;
        let account_id = new_transaction
            .payment_method
            .as_deref()
            .map(|name| resolve_account(&mut write_guard, name));
        let tags = register_tags(&mut write_guard, &new_transaction.tags);

        let stored = StoredTransaction {
            id: Uuid::new_v4(),
            merchant: new_transaction.merchant,
            amount: new_transaction.amount,
            kind: new_transaction.kind,
            category_id,
            account_id,
            date: new_transaction.date,
            time: new_transaction.time,
            notes: new_transaction.notes,
            tags,
            seq: write_guard.next_seq(),
        };
        let transaction = to_view(&write_guard, &stored);
        write_guard.transactions.insert(stored.id, stored);
        Ok(transaction)
    }

    async fn update_transaction(
        &self,
        transaction_id: Uuid,
        update: TransactionUpdate,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut write_guard = self.write_lock()?;

        if !write_guard.transactions.contains_key(&transaction_id) {
            return Err(TransactionNotFound(transaction_id));
        }

        let category_id = match &update.category {
            Some(category) => Some(resolve_category(&write_guard, category)?),
            None => None,
        };
        let account_id = match &update.payment_method {
            Some(Some(name)) => Some(Some(resolve_account(&mut write_guard, name))),
            Some(None) => Some(None),
            None => None,
        };
        let tags = update
            .tags
            .as_deref()
            .map(|tags| register_tags(&mut write_guard, tags));

        let stored = write_guard
            .transactions
            .get_mut(&transaction_id)
            .ok_or(TransactionNotFound(transaction_id))?;
        if let Some(merchant) = update.merchant {
            stored.merchant = merchant;
        }
        if let Some(amount) = update.amount {
            stored.amount = amount;
        }
        if let Some(kind) = update.kind {
            stored.kind = kind;
        }
        if let Some(category_id) = category_id {
            stored.category_id = category_id;
        }
        if let Some(account_id) = account_id {
            stored.account_id = account_id;
        }
        if let Some((date, time)) = update.date {
            stored.date = date;
            stored.time = time;
        }
        if let Some(notes) = update.notes {
            stored.notes = notes;
        }
        if let Some(tags) = tags {
            stored.tags = tags;
        }

        let stored = stored.clone();
        Ok(to_view(&write_guard, &stored))
    }

    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<(), TransactionRepoError> {
        let mut write_guard = self.write_lock()?;
        write_guard
            .transactions
            .remove(&transaction_id)
            .map(|_| ())
            .ok_or(TransactionNotFound(transaction_id))
    }

    async fn get_stats(
        &self,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Stats, TransactionRepoError> {
        let read_guard = self.read_lock()?;

        let in_window = |date: NaiveDate| {
            from.map_or(true, |from| date >= from) && until.map_or(true, |until| date <= until)
        };

        let mut stats = Stats::default();
        let mut merchant_totals: HashMap<String, (i64, Decimal)> = HashMap::new();
        for stored in read_guard.transactions.values() {
            if !in_window(stored.date) {
                continue;
            }
            match stored.kind {
                TransactionType::Income => stats.total_income += stored.amount,
                TransactionType::Expense => {
                    stats.total_spent += stored.amount;
                    *stats
                        .category_breakdown
                        .entry(stored.category_id)
                        .or_default() += stored.amount;
                    let entry = merchant_totals
                        .entry(stored.merchant.clone())
                        .or_insert((0, Decimal::ZERO));
                    entry.0 += 1;
                    entry.1 += stored.amount;
                }
            }
        }

        let mut merchant_breakdown: Vec<MerchantTotal> = merchant_totals
            .into_iter()
            .map(|(merchant, (count, total))| MerchantTotal {
                merchant,
                count,
                total,
            })
            .collect();
        merchant_breakdown.sort_by(|a, b| b.total.cmp(&a.total));
        stats.merchant_breakdown = MerchantBreakdown(merchant_breakdown);

        Ok(stats)
    }
}
