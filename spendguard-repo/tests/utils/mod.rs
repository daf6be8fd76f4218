use fake::faker::company::en::CompanyName;
use fake::{Fake, Faker};
use rstest::fixture;
use rust_decimal::Decimal;
use spendguard_repo::catalog_repo::{CatalogRepo, Category, NewCategory};
use spendguard_repo::transaction_repo::{
    CategoryRef, NewTransaction, TransactionRepo, TransactionType,
};
use std::sync::Arc;

#[fixture]
pub fn repos() -> (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>) {
    let (transaction_repo, catalog_repo, _health_check) = spendguard_repo::mem_repo::create_repos();
    (transaction_repo, catalog_repo)
}

pub async fn create_category(catalog_repo: &Arc<dyn CatalogRepo>, name: &str) -> Category {
    catalog_repo
        .create_category(NewCategory {
            name: name.to_string(),
            kind: "expense".to_string(),
            icon: Some("🛒".to_string()),
            color: None,
        })
        .await
        .unwrap()
}

pub fn generate_new_transaction(category: CategoryRef) -> NewTransaction {
    NewTransaction::new(
        CompanyName().fake(),
        Decimal::from(Faker.fake::<u8>() as i64 + 1),
        TransactionType::Expense,
        category,
        Faker.fake(),
        None,
        None,
        None,
        Vec::new(),
    )
}
