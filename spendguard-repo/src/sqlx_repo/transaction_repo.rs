use crate::sqlx_repo::predicates::{push_window, transaction_predicates, BindValue, Predicates};
use crate::transaction_repo::{
    combined_timestamp, normalize_tags, Filter, MerchantBreakdown, MerchantTotal, NewTransaction,
    Stats, Transaction, TransactionRepo, TransactionRepoError, TransactionUpdate,
};
use crate::transaction_repo::{CategoryRef, TransactionType};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgConnection, Pool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// One row per transaction with the category icon, account name and tag
/// names folded in. Every read goes through this shape, including the
/// re-read after a write.
const TRANSACTION_VIEW: &str = r#"
    SELECT t.id,
           t.merchant,
           t.amount,
           t.transaction_type,
           t.category_id,
           c.icon AS category_icon,
           a.name AS payment_method,
           t.transaction_date,
           t.transaction_time,
           t.notes,
           COALESCE(
               ARRAY_AGG(tg.name ORDER BY tg.name) FILTER (WHERE tg.name IS NOT NULL),
               '{}'
           ) AS tags
    FROM transactions t
    JOIN categories c ON c.id = t.category_id
    LEFT JOIN accounts a ON a.id = t.account_id
    LEFT JOIN transaction_tags tt ON tt.transaction_id = t.id
    LEFT JOIN tags tg ON tg.id = tt.tag_id
"#;
const VIEW_GROUPING: &str = "GROUP BY t.id, c.id, a.id";
const VIEW_ORDERING: &str =
    "ORDER BY t.transaction_date DESC, t.transaction_time DESC NULLS LAST, t.created_at DESC";

#[derive(FromRow)]
struct TransactionRow {
    id: Uuid,
    merchant: String,
    amount: Decimal,
    transaction_type: String,
    category_id: Uuid,
    category_icon: Option<String>,
    payment_method: Option<String>,
    transaction_date: NaiveDate,
    transaction_time: Option<NaiveTime>,
    notes: Option<String>,
    tags: Vec<String>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = TransactionRepoError;

    fn try_from(row: TransactionRow) -> Result<Transaction, TransactionRepoError> {
        // The column has a CHECK constraint, so a parse failure means the
        // stored data is corrupt.
        let kind: TransactionType = row
            .transaction_type
            .parse()
            .with_context(|| format!("Stored transaction {} has an invalid type", row.id))?;
        Ok(Transaction::new(
            row.id,
            row.merchant,
            row.amount,
            kind,
            row.category_id,
            row.category_icon,
            combined_timestamp(row.transaction_date, row.transaction_time),
            row.tags,
            row.notes,
            row.payment_method,
        ))
    }
}

pub struct SQLxTransactionRepo {
    pool: Pool<Postgres>,
}

impl SQLxTransactionRepo {
    pub fn new(pool: Pool<Postgres>) -> SQLxTransactionRepo {
        SQLxTransactionRepo { pool }
    }
}

/// Maps constraint violations from the write path onto the error variants
/// clients can act on.
fn write_error(error: sqlx::Error) -> TransactionRepoError {
    if let sqlx::Error::Database(db_error) = &error {
        match db_error.code().as_deref() {
            Some("23503") => return TransactionRepoError::InvalidReference,
            Some("23505") => return TransactionRepoError::AlreadyExists,
            _ => {}
        }
    }
    TransactionRepoError::Other(error.into())
}

/// A name reference is matched case-insensitively and must already exist.
/// An id reference is passed through; the foreign key rejects unknown ids.
async fn resolve_category(
    conn: &mut PgConnection,
    category: &CategoryRef,
) -> Result<Uuid, TransactionRepoError> {
    match category {
        CategoryRef::Id(id) => Ok(*id),
        CategoryRef::Name(name) => {
            let id: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM categories WHERE LOWER(name) = LOWER($1)")
                    .bind(name.trim())
                    .fetch_optional(conn)
                    .await
                    .context("Unable to look up category")?;
            id.ok_or_else(|| TransactionRepoError::InvalidCategory(name.clone()))
        }
    }
}

/// Accounts are created on first use so clients can send a free-form
/// payment method without managing accounts up front. The lookup is by
/// exact name; a differently-cased name creates a separate account.
async fn resolve_account(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Uuid, TransactionRepoError> {
    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM accounts WHERE name = $1")
        .bind(name.trim())
        .fetch_optional(&mut *conn)
        .await
        .context("Unable to look up account")?;
    if let Some(id) = existing {
        return Ok(id);
    }
    let id = sqlx::query_scalar("INSERT INTO accounts (name, account_type) VALUES ($1, 'other') RETURNING id")
        .bind(name.trim())
        .fetch_one(conn)
        .await
        .map_err(write_error)?;
    Ok(id)
}

/// The no-op update on conflict makes the insert return the existing row's
/// id, so concurrent writers converge on one tag per name.
async fn find_or_create_tag(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Uuid, TransactionRepoError> {
    let id = sqlx::query_scalar(
        "INSERT INTO tags (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(name)
    .fetch_one(conn)
    .await
    .map_err(write_error)?;
    Ok(id)
}

async fn link_tags(
    conn: &mut PgConnection,
    transaction_id: Uuid,
    tags: &[String],
) -> Result<(), TransactionRepoError> {
    for tag in normalize_tags(tags) {
        let tag_id = find_or_create_tag(&mut *conn, &tag).await?;
        sqlx::query(
            "INSERT INTO transaction_tags (transaction_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(transaction_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await
        .map_err(write_error)?;
    }
    Ok(())
}

fn bind_values<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &[BindValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for param in params {
        query = match param {
            BindValue::Date(date) => query.bind(*date),
            BindValue::Text(text) => query.bind(text.clone()),
            BindValue::TextArray(texts) => query.bind(texts.clone()),
            BindValue::UuidArray(ids) => query.bind(ids.clone()),
            BindValue::Int(n) => query.bind(*n),
        };
    }
    query
}

#[async_trait]
impl TransactionRepo for SQLxTransactionRepo {
    #[instrument(skip(self))]
    async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Transaction, TransactionRepoError> {
        let sql = format!("{TRANSACTION_VIEW} WHERE t.id = $1 {VIEW_GROUPING}");
        let row: Option<TransactionRow> = sqlx::query_as(&sql)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await
            .context("Unable to get transaction")?;
        row.ok_or(TransactionRepoError::TransactionNotFound(transaction_id))?
            .try_into()
    }

    #[instrument(skip(self))]
    async fn get_all_transactions(
        &self,
        filter: Filter,
    ) -> Result<Vec<Transaction>, TransactionRepoError> {
        // Tag names are resolved up front. A filter naming only unknown
        // tags can match nothing, so skip the main query entirely.
        let mut tag_ids: Option<Vec<Uuid>> = None;
        if let Some(tags) = &filter.tags {
            let names = normalize_tags(tags);
            if !names.is_empty() {
                let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM tags WHERE name = ANY($1)")
                    .bind(&names)
                    .fetch_all(&self.pool)
                    .await
                    .context("Unable to resolve tag filter")?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }
                tag_ids = Some(ids);
            }
        }

        let mut predicates = transaction_predicates(&filter, tag_ids.as_deref());
        let mut sql = TRANSACTION_VIEW.to_string();
        if let Some(where_clause) = predicates.where_clause() {
            sql.push_str(&where_clause);
        }
        sql.push(' ');
        sql.push_str(VIEW_GROUPING);
        sql.push(' ');
        sql.push_str(VIEW_ORDERING);
        if let Some(limit) = filter.limit {
            let placeholder = predicates.placeholder(BindValue::Int(limit));
            sql.push_str(&format!(" LIMIT {placeholder}"));
        }
        if let Some(offset) = filter.offset {
            let placeholder = predicates.placeholder(BindValue::Int(offset));
            sql.push_str(&format!(" OFFSET {placeholder}"));
        }

        let query = bind_values(sqlx::query_as::<_, TransactionRow>(&sql), predicates.params());
        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("Unable to get transactions")?;
        rows.into_iter().map(Transaction::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn create_new_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, TransactionRepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let category_id = resolve_category(&mut tx, &new_transaction.category).await?;
        let account_id = match &new_transaction.payment_method {
            Some(name) => Some(resolve_account(&mut tx, name).await?),
            None => None,
        };

        let transaction_id: Uuid = sqlx::query_scalar(
            "INSERT INTO transactions \
                (merchant, amount, transaction_type, category_id, account_id, \
                 transaction_date, transaction_time, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(&new_transaction.merchant)
        .bind(new_transaction.amount)
        .bind(new_transaction.kind.to_string())
        .bind(category_id)
        .bind(account_id)
        .bind(new_transaction.date)
        .bind(new_transaction.time)
        .bind(&new_transaction.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(write_error)?;

        link_tags(&mut tx, transaction_id, &new_transaction.tags).await?;
        tx.commit().await.context("Unable to commit transaction")?;

        self.get_transaction(transaction_id).await
    }

    #[instrument(skip(self))]
    async fn update_transaction(
        &self,
        transaction_id: Uuid,
        update: TransactionUpdate,
    ) -> Result<Transaction, TransactionRepoError> {
        if update.is_empty() {
            return self.get_transaction(transaction_id).await;
        }
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let category_id = match &update.category {
            Some(category) => Some(resolve_category(&mut tx, category).await?),
            None => None,
        };
        let account_id = match &update.payment_method {
            Some(Some(name)) => Some(Some(resolve_account(&mut tx, name).await?)),
            Some(None) => Some(None),
            None => None,
        };

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE transactions SET updated_at = NOW()");
        if let Some(merchant) = &update.merchant {
            builder.push(", merchant = ").push_bind(merchant);
        }
        if let Some(amount) = update.amount {
            builder.push(", amount = ").push_bind(amount);
        }
        if let Some(kind) = update.kind {
            builder
                .push(", transaction_type = ")
                .push_bind(kind.to_string());
        }
        if let Some(category_id) = category_id {
            builder.push(", category_id = ").push_bind(category_id);
        }
        if let Some(account_id) = account_id {
            builder.push(", account_id = ").push_bind(account_id);
        }
        if let Some((date, time)) = update.date {
            builder.push(", transaction_date = ").push_bind(date);
            builder.push(", transaction_time = ").push_bind(time);
        }
        if let Some(notes) = &update.notes {
            builder.push(", notes = ").push_bind(notes.clone());
        }
        builder.push(" WHERE id = ").push_bind(transaction_id);

        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        if result.rows_affected() == 0 {
            return Err(TransactionRepoError::TransactionNotFound(transaction_id));
        }

        // A present tag list replaces the existing set wholesale.
        if let Some(tags) = &update.tags {
            sqlx::query("DELETE FROM transaction_tags WHERE transaction_id = $1")
                .bind(transaction_id)
                .execute(&mut *tx)
                .await
                .context("Unable to clear transaction tags")?;
            link_tags(&mut tx, transaction_id, tags).await?;
        }

        tx.commit().await.context("Unable to commit transaction")?;
        self.get_transaction(transaction_id).await
    }

    #[instrument(skip(self))]
    async fn delete_transaction(&self, transaction_id: Uuid) -> Result<(), TransactionRepoError> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(transaction_id)
            .execute(&self.pool)
            .await
            .context("Unable to delete transaction")?;
        if result.rows_affected() == 0 {
            return Err(TransactionRepoError::TransactionNotFound(transaction_id));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_stats(
        &self,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Stats, TransactionRepoError> {
        let mut totals = Predicates::default();
        push_window(&mut totals, from, until);
        let mut sql = "SELECT \
                COALESCE(SUM(t.amount) FILTER (WHERE t.transaction_type = 'expense'), 0), \
                COALESCE(SUM(t.amount) FILTER (WHERE t.transaction_type = 'income'), 0) \
             FROM transactions t "
            .to_string();
        if let Some(where_clause) = totals.where_clause() {
            sql.push_str(&where_clause);
        }
        let (total_spent, total_income): (Decimal, Decimal) =
            bind_values(sqlx::query_as(&sql), totals.params())
                .fetch_one(&self.pool)
                .await
                .context("Unable to compute totals")?;

        // Breakdowns cover spending only, so income rows are excluded.
        let mut expenses = Predicates::default();
        push_window(&mut expenses, from, until);
        expenses.push_raw("t.transaction_type = 'expense'");
        let expense_filter = expenses.where_clause().unwrap_or_default();

        let sql = format!(
            "SELECT t.category_id, SUM(t.amount) FROM transactions t {expense_filter} \
             GROUP BY t.category_id"
        );
        let category_rows: Vec<(Uuid, Decimal)> =
            bind_values(sqlx::query_as(&sql), expenses.params())
                .fetch_all(&self.pool)
                .await
                .context("Unable to compute category breakdown")?;

        let sql = format!(
            "SELECT t.merchant, COUNT(*), SUM(t.amount) FROM transactions t {expense_filter} \
             GROUP BY t.merchant ORDER BY SUM(t.amount) DESC"
        );
        let merchant_rows: Vec<(String, i64, Decimal)> =
            bind_values(sqlx::query_as(&sql), expenses.params())
                .fetch_all(&self.pool)
                .await
                .context("Unable to compute merchant breakdown")?;

        Ok(Stats {
            total_spent,
            total_income,
            category_breakdown: category_rows.into_iter().collect(),
            merchant_breakdown: MerchantBreakdown(
                merchant_rows
                    .into_iter()
                    .map(|(merchant, count, total)| MerchantTotal {
                        merchant,
                        count,
                        total,
                    })
                    .collect(),
            ),
        })
    }
}
