mod utils;

use chrono::{NaiveDate, NaiveTime};
use rstest::rstest;
use rust_decimal::Decimal;
use spendguard_repo::catalog_repo::{CatalogRepo, NewAccount};
use spendguard_repo::transaction_repo::{
    CategoryRef, TransactionRepo, TransactionRepoError, TransactionType, TransactionUpdate,
};
use std::sync::Arc;
use utils::{create_category, generate_new_transaction, repos};
use uuid::Uuid;

type Repos = (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>);

#[rstest]
#[actix_rt::test]
async fn test_create_and_get_transaction(repos: Repos) {
    let (transaction_repo, catalog_repo) = repos;
    let category = create_category(&catalog_repo, "Groceries").await;

    let mut new_transaction =
        generate_new_transaction(CategoryRef::Name("groceries".to_string()));
    new_transaction.payment_method = Some("Visa".to_string());
    new_transaction.tags = vec![
        "weekly".to_string(),
        " essentials ".to_string(),
        "weekly".to_string(),
    ];

    let created = transaction_repo
        .create_new_transaction(new_transaction.clone())
        .await
        .unwrap();
    assert_eq!(created.merchant, new_transaction.merchant);
    assert_eq!(created.amount, new_transaction.amount);
    assert_eq!(created.category_id, category.id);
    assert_eq!(created.category_icon, category.icon);
    assert_eq!(created.payment_method, Some("Visa".to_string()));
    assert_eq!(
        created.tags,
        vec!["essentials".to_string(), "weekly".to_string()]
    );

    let stored = transaction_repo.get_transaction(created.id).await.unwrap();
    assert_eq!(created, stored);
}

#[rstest]
#[actix_rt::test]
async fn test_payment_method_creates_account(repos: Repos) {
    let (transaction_repo, catalog_repo) = repos;
    create_category(&catalog_repo, "Groceries").await;

    let mut new_transaction = generate_new_transaction(CategoryRef::Name("Groceries".to_string()));
    new_transaction.payment_method = Some("Amex".to_string());
    transaction_repo
        .create_new_transaction(new_transaction)
        .await
        .unwrap();

    let accounts = catalog_repo.get_accounts().await.unwrap();
    let account = accounts.iter().find(|a| a.name == "Amex").unwrap();
    assert_eq!(account.kind, "other");
}

#[rstest]
#[actix_rt::test]
async fn test_payment_method_matches_exact_name_only(repos: Repos) {
    let (transaction_repo, catalog_repo) = repos;
    create_category(&catalog_repo, "Groceries").await;
    catalog_repo
        .create_account(NewAccount {
            name: "Visa".to_string(),
            kind: "credit".to_string(),
        })
        .await
        .unwrap();

    let mut new_transaction = generate_new_transaction(CategoryRef::Name("Groceries".to_string()));
    new_transaction.payment_method = Some("visa".to_string());
    let created = transaction_repo
        .create_new_transaction(new_transaction)
        .await
        .unwrap();
    assert_eq!(created.payment_method, Some("visa".to_string()));

    let accounts = catalog_repo.get_accounts().await.unwrap();
    let names: Vec<&str> = accounts.iter().map(|a| a.name.as_str()).collect();
    assert!(names.contains(&"Visa"));
    assert!(names.contains(&"visa"));
    let created_account = accounts.iter().find(|a| a.name == "visa").unwrap();
    assert_eq!(created_account.kind, "other");
}

#[rstest]
#[actix_rt::test]
async fn test_empty_update_leaves_transaction_unchanged(repos: Repos) {
    let (transaction_repo, catalog_repo) = repos;
    create_category(&catalog_repo, "Groceries").await;

    let new_transaction = generate_new_transaction(CategoryRef::Name("Groceries".to_string()));
    let created = transaction_repo
        .create_new_transaction(new_transaction)
        .await
        .unwrap();

    let updated = transaction_repo
        .update_transaction(created.id, TransactionUpdate::default())
        .await
        .unwrap();
    assert_eq!(updated, created);
}

#[rstest]
#[actix_rt::test]
async fn test_create_with_unknown_category_name(repos: Repos) {
    let (transaction_repo, _catalog_repo) = repos;

    let new_transaction = generate_new_transaction(CategoryRef::Name("Nonexistent".to_string()));
    let result = transaction_repo.create_new_transaction(new_transaction).await;
    assert!(matches!(
        result.unwrap_err(),
        TransactionRepoError::InvalidCategory(name) if name == "Nonexistent"
    ));
}

#[rstest]
#[actix_rt::test]
async fn test_create_with_unknown_category_id(repos: Repos) {
    let (transaction_repo, _catalog_repo) = repos;

    let new_transaction = generate_new_transaction(CategoryRef::Id(Uuid::new_v4()));
    let result = transaction_repo.create_new_transaction(new_transaction).await;
    assert!(matches!(
        result.unwrap_err(),
        TransactionRepoError::InvalidReference
    ));
}

#[rstest]
#[actix_rt::test]
async fn test_get_missing_transaction(repos: Repos) {
    let (transaction_repo, _catalog_repo) = repos;

    let missing_id = Uuid::new_v4();
    let result = transaction_repo.get_transaction(missing_id).await;
    assert!(matches!(
        result.unwrap_err(),
        TransactionRepoError::TransactionNotFound(id) if id == missing_id
    ));
}

#[rstest]
#[actix_rt::test]
async fn test_update_transaction(repos: Repos) {
    let (transaction_repo, catalog_repo) = repos;
    create_category(&catalog_repo, "Groceries").await;
    let dining = create_category(&catalog_repo, "Dining").await;

    let new_transaction = generate_new_transaction(CategoryRef::Name("Groceries".to_string()));
    let created = transaction_repo
        .create_new_transaction(new_transaction)
        .await
        .unwrap();

    let update = TransactionUpdate {
        merchant: Some("Corner Cafe".to_string()),
        amount: Some(Decimal::new(1250, 2)),
        kind: Some(TransactionType::Expense),
        category: Some(CategoryRef::Id(dining.id)),
        date: Some((
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(8, 15, 0),
        )),
        notes: Some(Some("breakfast".to_string())),
        ..TransactionUpdate::default()
    };
    let updated = transaction_repo
        .update_transaction(created.id, update)
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.merchant, "Corner Cafe");
    assert_eq!(updated.amount, Decimal::new(1250, 2));
    assert_eq!(updated.category_id, dining.id);
    assert_eq!(
        updated.date,
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap()
    );
    assert_eq!(updated.notes, Some("breakfast".to_string()));
    // Untouched fields carry over.
    assert_eq!(updated.tags, created.tags);
    assert_eq!(updated.payment_method, created.payment_method);
}

#[rstest]
#[actix_rt::test]
async fn test_update_clears_notes(repos: Repos) {
    let (transaction_repo, catalog_repo) = repos;
    create_category(&catalog_repo, "Groceries").await;

    let mut new_transaction = generate_new_transaction(CategoryRef::Name("Groceries".to_string()));
    new_transaction.notes = Some("temporary".to_string());
    let created = transaction_repo
        .create_new_transaction(new_transaction)
        .await
        .unwrap();

    let update = TransactionUpdate {
        notes: Some(None),
        ..TransactionUpdate::default()
    };
    let updated = transaction_repo
        .update_transaction(created.id, update)
        .await
        .unwrap();
    assert_eq!(updated.notes, None);
}

#[rstest]
#[actix_rt::test]
async fn test_update_replaces_tags(repos: Repos) {
    let (transaction_repo, catalog_repo) = repos;
    create_category(&catalog_repo, "Groceries").await;

    let mut new_transaction = generate_new_transaction(CategoryRef::Name("Groceries".to_string()));
    new_transaction.tags = vec!["old".to_string()];
    let created = transaction_repo
        .create_new_transaction(new_transaction)
        .await
        .unwrap();

    let update = TransactionUpdate {
        tags: Some(vec!["fresh".to_string(), "new".to_string()]),
        ..TransactionUpdate::default()
    };
    let updated = transaction_repo
        .update_transaction(created.id, update)
        .await
        .unwrap();
    assert_eq!(updated.tags, vec!["fresh".to_string(), "new".to_string()]);

    let update = TransactionUpdate {
        tags: Some(Vec::new()),
        ..TransactionUpdate::default()
    };
    let updated = transaction_repo
        .update_transaction(created.id, update)
        .await
        .unwrap();
    assert!(updated.tags.is_empty());
}

#[rstest]
#[actix_rt::test]
async fn test_update_missing_transaction(repos: Repos) {
    let (transaction_repo, _catalog_repo) = repos;

    let missing_id = Uuid::new_v4();
    let update = TransactionUpdate {
        merchant: Some("Anywhere".to_string()),
        ..TransactionUpdate::default()
    };
    let result = transaction_repo.update_transaction(missing_id, update).await;
    assert!(matches!(
        result.unwrap_err(),
        TransactionRepoError::TransactionNotFound(id) if id == missing_id
    ));
}

#[rstest]
#[actix_rt::test]
async fn test_delete_transaction(repos: Repos) {
    let (transaction_repo, catalog_repo) = repos;
    create_category(&catalog_repo, "Groceries").await;

    let new_transaction = generate_new_transaction(CategoryRef::Name("Groceries".to_string()));
    let created = transaction_repo
        .create_new_transaction(new_transaction)
        .await
        .unwrap();

    transaction_repo.delete_transaction(created.id).await.unwrap();
    let result = transaction_repo.get_transaction(created.id).await;
    assert!(matches!(
        result.unwrap_err(),
        TransactionRepoError::TransactionNotFound(_)
    ));
}

#[rstest]
#[actix_rt::test]
async fn test_delete_missing_transaction(repos: Repos) {
    let (transaction_repo, _catalog_repo) = repos;

    let result = transaction_repo.delete_transaction(Uuid::new_v4()).await;
    assert!(matches!(
        result.unwrap_err(),
        TransactionRepoError::TransactionNotFound(_)
    ));
}
