use crate::error::HandlerError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use spendguard_repo::transaction_repo::{
    CategoryRef, Filter, NewTransaction, TransactionType, TransactionUpdate,
};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTransactionRequest {
    pub merchant: Option<String>,
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
    pub payment_method: Option<String>,
}

impl CreateTransactionRequest {
    pub fn into_new_transaction(self) -> Result<NewTransaction, HandlerError> {
        let merchant = non_blank(self.merchant);
        let amount = self.amount;
        let kind = non_blank(self.kind);
        let category = non_blank(self.category);
        let date = non_blank(self.date);

        let mut errors = BTreeMap::new();
        if merchant.is_none() {
            errors.insert("merchant", vec!["Merchant is required".to_string()]);
        }
        if amount.is_none() {
            errors.insert("amount", vec!["Amount is required".to_string()]);
        }
        if kind.is_none() {
            errors.insert("type", vec!["Type is required".to_string()]);
        }
        if category.is_none() {
            errors.insert("category", vec!["Category is required".to_string()]);
        }
        if date.is_none() {
            errors.insert("date", vec!["Date is required".to_string()]);
        }

        match (merchant, amount, kind, category, date) {
            (Some(merchant), Some(amount), Some(kind), Some(category), Some(date)) => {
                let kind = parse_type(&kind)?;
                check_amount(amount)?;
                let (date, time) = parse_date_input(&date)
                    .ok_or_else(|| HandlerError::BadRequest("Invalid date format".to_string()))?;
                Ok(NewTransaction::new(
                    merchant,
                    amount,
                    kind,
                    CategoryRef::from(category),
                    date,
                    time,
                    non_blank(self.notes),
                    non_blank(self.payment_method),
                    self.tags.unwrap_or_default(),
                ))
            }
            _ => Err(HandlerError::Validation(errors)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTransactionRequest {
    pub merchant: Option<String>,
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub tags: Option<Vec<String>>,
    /// An explicit null clears the field; an absent field leaves it alone.
    #[serde(deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(deserialize_with = "double_option")]
    pub payment_method: Option<Option<String>>,
}

impl UpdateTransactionRequest {
    pub fn into_update(self) -> Result<TransactionUpdate, HandlerError> {
        let kind = match non_blank(self.kind) {
            Some(value) => Some(parse_type(&value)?),
            None => None,
        };
        if let Some(amount) = self.amount {
            check_amount(amount)?;
        }
        let date = match non_blank(self.date) {
            Some(value) => Some(
                parse_date_input(&value)
                    .ok_or_else(|| HandlerError::BadRequest("Invalid date format".to_string()))?,
            ),
            None => None,
        };
        // A blank payment method detaches the account, same as null.
        let payment_method = self.payment_method.map(non_blank);

        Ok(TransactionUpdate {
            merchant: non_blank(self.merchant),
            amount: self.amount,
            kind,
            category: non_blank(self.category).map(CategoryRef::from),
            date,
            notes: self.notes,
            payment_method,
            tags: self.tags,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Comma-separated category ids.
    pub categories: Option<String>,
    /// Comma-separated merchant names.
    pub merchants: Option<String>,
    /// Comma-separated tag names.
    pub tags: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TransactionQuery {
    pub fn into_filter(self) -> Result<Filter, HandlerError> {
        let categories = match self.categories.map(split_list) {
            Some(values) if !values.is_empty() => {
                let ids = values
                    .iter()
                    .map(|value| Uuid::parse_str(value))
                    .collect::<Result<Vec<Uuid>, _>>()
                    .map_err(|_| {
                        HandlerError::BadRequest("Invalid category filter".to_string())
                    })?;
                Some(ids)
            }
            _ => None,
        };
        let merchants = self.merchants.map(split_list).filter(|v| !v.is_empty());
        let tags = self.tags.map(split_list).filter(|v| !v.is_empty());
        let kind = match non_blank(self.kind) {
            Some(value) => Some(parse_type(&value)?),
            None => None,
        };

        Ok(Filter {
            from: self.start_date,
            until: self.end_date,
            categories,
            merchants,
            tags,
            kind,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: String) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_type(value: &str) -> Result<TransactionType, HandlerError> {
    value
        .parse()
        .map_err(|e| HandlerError::BadRequest(format!("{}", e)))
}

fn check_amount(amount: Decimal) -> Result<(), HandlerError> {
    if amount < Decimal::ZERO {
        return Err(HandlerError::BadRequest(
            "Amount must be a positive number".to_string(),
        ));
    }
    Ok(())
}

/// Accepts a plain date, an RFC 3339 timestamp, or a naive timestamp. A
/// plain date carries no time of day.
fn parse_date_input(value: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some((date, None));
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        let datetime = datetime.naive_utc();
        return Some((datetime.date(), Some(datetime.time())));
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some((datetime.date(), Some(datetime.time())));
    }
    None
}
