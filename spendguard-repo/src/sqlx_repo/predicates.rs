use crate::transaction_repo::Filter;
use chrono::NaiveDate;
use uuid::Uuid;

/// Owned value waiting to be bound to a query. Kept alongside the rendered
/// SQL so the clause order and the bind order can never drift apart.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum BindValue {
    Date(NaiveDate),
    Text(String),
    TextArray(Vec<String>),
    UuidArray(Vec<Uuid>),
    Int(i64),
}

/// Ordered list of WHERE fragments with their bind values. Each fragment is
/// written with a `$?` marker which is rewritten to the positional
/// placeholder matching the value's slot.
#[derive(Default, Debug)]
pub(crate) struct Predicates {
    clauses: Vec<String>,
    params: Vec<BindValue>,
}

impl Predicates {
    pub(crate) fn push(&mut self, template: &str, value: BindValue) {
        let placeholder = self.placeholder(value);
        self.clauses.push(template.replace("$?", &placeholder));
    }

    /// Adds a fragment with no bind value.
    pub(crate) fn push_raw(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    /// Registers a value and returns its positional placeholder, for SQL
    /// built outside the WHERE clause (LIMIT and OFFSET).
    pub(crate) fn placeholder(&mut self, value: BindValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub(crate) fn where_clause(&self) -> Option<String> {
        if self.clauses.is_empty() {
            None
        } else {
            Some(format!("WHERE {}", self.clauses.join(" AND ")))
        }
    }

    pub(crate) fn params(&self) -> &[BindValue] {
        &self.params
    }
}

/// Builds the list-query predicates in a fixed order so the generated SQL
/// is deterministic for a given filter shape.
pub(crate) fn transaction_predicates(filter: &Filter, tag_ids: Option<&[Uuid]>) -> Predicates {
    let mut predicates = Predicates::default();
    push_window(&mut predicates, filter.from, filter.until);
    if let Some(categories) = &filter.categories {
        predicates.push(
            "t.category_id = ANY($?)",
            BindValue::UuidArray(categories.clone()),
        );
    }
    if let Some(merchants) = &filter.merchants {
        predicates.push(
            "t.merchant = ANY($?)",
            BindValue::TextArray(merchants.clone()),
        );
    }
    if let Some(kind) = filter.kind {
        predicates.push(
            "t.transaction_type = $?",
            BindValue::Text(kind.to_string()),
        );
    }
    if let Some(tag_ids) = tag_ids {
        predicates.push(
            "t.id IN (SELECT tt.transaction_id FROM transaction_tags tt WHERE tt.tag_id = ANY($?))",
            BindValue::UuidArray(tag_ids.to_vec()),
        );
    }
    predicates
}

/// Inclusive date window shared by the list query and the stats queries.
pub(crate) fn push_window(
    predicates: &mut Predicates,
    from: Option<NaiveDate>,
    until: Option<NaiveDate>,
) {
    if let Some(from) = from {
        predicates.push("t.transaction_date >= $?", BindValue::Date(from));
    }
    if let Some(until) = until {
        predicates.push("t.transaction_date <= $?", BindValue::Date(until));
    }
}
