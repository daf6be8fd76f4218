use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[async_trait]
pub trait TransactionRepo: Sync + Send {
    async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Transaction, TransactionRepoError>;

    async fn get_all_transactions(
        &self,
        filter: Filter,
    ) -> Result<Vec<Transaction>, TransactionRepoError>;

    async fn create_new_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepoError>;

    /// Callers are expected to reject an empty update before reaching the
    /// store; an empty update here degrades to a plain read.
    async fn update_transaction(
        &self,
        transaction_id: Uuid,
        update: TransactionUpdate,
    ) -> Result<Transaction, TransactionRepoError>;

    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<(), TransactionRepoError>;

    async fn get_stats(
        &self,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Stats, TransactionRepoError>;
}

#[derive(Error, Debug)]
pub enum TransactionRepoError {
    #[error("Transaction with id {0} not found")]
    TransactionNotFound(Uuid),
    #[error("Unknown category {0:?}")]
    InvalidCategory(String),
    #[error("Invalid category or account reference")]
    InvalidReference,
    #[error("Transaction already exists")]
    AlreadyExists,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Serialize, Deserialize, Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Expense,
    Income,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Expense => "expense",
            TransactionType::Income => "income",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Invalid type. Must be \"expense\" or \"income\"")]
pub struct InvalidTransactionType;

impl FromStr for TransactionType {
    type Err = InvalidTransactionType;

    fn from_str(s: &str) -> Result<TransactionType, InvalidTransactionType> {
        match s {
            "expense" => Ok(TransactionType::Expense),
            "income" => Ok(TransactionType::Income),
            _ => Err(InvalidTransactionType),
        }
    }
}

/// A category reference as supplied by a client: either the canonical id or
/// a display name. Classified once when the value enters the system, never
/// re-guessed downstream.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(from = "String", into = "String")]
pub enum CategoryRef {
    Id(Uuid),
    Name(String),
}

impl From<String> for CategoryRef {
    fn from(value: String) -> CategoryRef {
        match Uuid::parse_str(value.trim()) {
            Ok(id) => CategoryRef::Id(id),
            Err(_) => CategoryRef::Name(value),
        }
    }
}

impl From<CategoryRef> for String {
    fn from(value: CategoryRef) -> String {
        match value {
            CategoryRef::Id(id) => id.to_string(),
            CategoryRef::Name(name) => name,
        }
    }
}

/// Denormalized view of a transaction: category icon, account name and tag
/// names joined in. Every read path and the post-write re-read return this
/// same shape.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    pub merchant: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(rename = "category")]
    pub category_id: Uuid,
    pub category_icon: Option<String>,
    pub date: NaiveDateTime,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        merchant: String,
        amount: Decimal,
        kind: TransactionType,
        category_id: Uuid,
        category_icon: Option<String>,
        date: NaiveDateTime,
        tags: Vec<String>,
        notes: Option<String>,
        payment_method: Option<String>,
    ) -> Transaction {
        Transaction {
            id,
            merchant,
            amount,
            kind,
            category_id,
            category_icon,
            date,
            tags,
            notes,
            payment_method,
        }
    }
}

/// An absent time-of-day reads as midnight in the combined view.
pub fn combined_timestamp(date: NaiveDate, time: Option<NaiveTime>) -> NaiveDateTime {
    date.and_time(time.unwrap_or(NaiveTime::MIN))
}

#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub merchant: String,
    pub amount: Decimal,
    pub kind: TransactionType,
    pub category: CategoryRef,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
    pub tags: Vec<String>,
}

impl NewTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        merchant: String,
        amount: Decimal,
        kind: TransactionType,
        category: CategoryRef,
        date: NaiveDate,
        time: Option<NaiveTime>,
        notes: Option<String>,
        payment_method: Option<String>,
        tags: Vec<String>,
    ) -> NewTransaction {
        NewTransaction {
            merchant,
            amount,
            kind,
            category,
            date,
            time,
            notes,
            payment_method,
            tags,
        }
    }
}

/// Partial update. `None` leaves a field untouched; the inner `Option` on
/// `notes` and `payment_method` distinguishes "clear" from "keep". A present
/// tag list replaces the transaction's tag set wholesale.
#[derive(Clone, Debug, Default)]
pub struct TransactionUpdate {
    pub merchant: Option<String>,
    pub amount: Option<Decimal>,
    pub kind: Option<TransactionType>,
    pub category: Option<CategoryRef>,
    pub date: Option<(NaiveDate, Option<NaiveTime>)>,
    pub notes: Option<Option<String>>,
    pub payment_method: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.merchant.is_none()
            && self.amount.is_none()
            && self.kind.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.notes.is_none()
            && self.payment_method.is_none()
            && self.tags.is_none()
    }
}

/// Filter record for list queries. Absent fields contribute no condition.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    pub from: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub categories: Option<Vec<Uuid>>,
    pub merchants: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub kind: Option<TransactionType>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize, Clone, PartialEq, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_spent: Decimal,
    pub total_income: Decimal,
    pub category_breakdown: HashMap<Uuid, Decimal>,
    pub merchant_breakdown: MerchantBreakdown,
}

#[derive(Clone, PartialEq, Debug)]
pub struct MerchantTotal {
    pub merchant: String,
    pub count: i64,
    pub total: Decimal,
}

/// Per-merchant expense totals in descending-total order. Serialized as a
/// JSON object so the wire shape is `{merchant: {count, total}}` while the
/// ordering is preserved.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct MerchantBreakdown(pub Vec<MerchantTotal>);

impl Serialize for MerchantBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Entry<'a> {
            count: i64,
            total: &'a Decimal,
        }

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for merchant_total in &self.0 {
            map.serialize_entry(
                &merchant_total.merchant,
                &Entry {
                    count: merchant_total.count,
                    total: &merchant_total.total,
                },
            )?;
        }
        map.end()
    }
}

/// Distinct, trimmed, non-blank tag names in a deterministic (sorted) order.
pub(crate) fn normalize_tags(tags: &[String]) -> Vec<String> {
    let normalized: BTreeSet<String> = tags
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect();
    normalized.into_iter().collect()
}
