use crate::catalog_repo::{Account, CatalogRepo, Category, Tag};
use crate::transaction_repo::{TransactionRepo, TransactionType};
use crate::HealthCheck;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

mod catalog_repo;
mod transaction_repo;

/// Both repos share one state so a transaction write can resolve categories
/// and auto-create accounts the same way the database-backed repos do.
pub fn create_repos() -> (
    Arc<dyn TransactionRepo>,
    Arc<dyn CatalogRepo>,
    Arc<dyn HealthCheck>,
) {
    let state = Arc::new(RwLock::new(State::default()));
    let transaction_repo = transaction_repo::MemTransactionRepo::new(state.clone());
    let catalog_repo = catalog_repo::MemCatalogRepo::new(state);
    (
        Arc::new(transaction_repo),
        Arc::new(catalog_repo),
        Arc::new(MemHealthCheck),
    )
}

struct MemHealthCheck;

#[async_trait]
impl HealthCheck for MemHealthCheck {
    async fn check(&self) -> bool {
        true
    }
}

#[derive(Clone)]
struct StoredTransaction {
    id: Uuid,
    merchant: String,
    amount: Decimal,
    kind: TransactionType,
    category_id: Uuid,
    account_id: Option<Uuid>,
    date: NaiveDate,
    time: Option<NaiveTime>,
    notes: Option<String>,
    tags: Vec<String>,
    seq: u64,
}

#[derive(Default)]
struct State {
    transactions: HashMap<Uuid, StoredTransaction>,
    categories: HashMap<Uuid, Category>,
    accounts: HashMap<Uuid, Account>,
    tags: HashMap<Uuid, Tag>,
    next_seq: u64,
}

impl State {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn category_by_name(&self, name: &str) -> Option<&Category> {
        let name = name.trim();
        self.categories
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    // Account names match exactly; a differently-cased payment method
    // creates a separate account.
    fn account_by_name(&self, name: &str) -> Option<&Account> {
        let name = name.trim();
        self.accounts.values().find(|a| a.name == name)
    }

    fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags.values().find(|t| t.name == name)
    }
}

/// Matches the list query's ordering: newest date first, timed entries
/// before untimed ones within a date, then insertion order.
fn view_order(a: &StoredTransaction, b: &StoredTransaction) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| match (a.time, b.time) {
            (Some(a_time), Some(b_time)) => b_time.cmp(&a_time),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.seq.cmp(&a.seq))
}
