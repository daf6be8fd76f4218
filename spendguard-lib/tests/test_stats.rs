use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use actix_web::web::Data;
use actix_web::{test, web, App};
use rstest::rstest;
use serde_json::{json, Value};
use spendguard_repo::catalog_repo::{CatalogRepo, NewCategory};
use spendguard_repo::transaction_repo::{Transaction, TransactionRepo};
use std::sync::Arc;
use tracing::instrument;

#[macro_use]
mod utils;
use utils::repos;
use utils::seed_category;
use utils::tracing_setup;

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_stats(
    _tracing_setup: &(),
    repos: (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>),
) {
    let (transaction_repo, catalog_repo) = repos;
    let groceries = seed_category(&catalog_repo, "Groceries").await;
    let salary = catalog_repo
        .create_category(NewCategory {
            name: "Salary".to_string(),
            kind: "income".to_string(),
            icon: None,
            color: None,
        })
        .await
        .unwrap();
    let app = build_app!(transaction_repo, catalog_repo);
    let service = test::init_service(app).await;

    let _: Transaction = create_transaction!(
        &service,
        json!({
            "merchant": "Grocer",
            "amount": 30,
            "type": "expense",
            "category": groceries.id.to_string(),
            "date": "2024-03-05"
        })
    );
    let _: Transaction = create_transaction!(
        &service,
        json!({
            "merchant": "Grocer",
            "amount": 20,
            "type": "expense",
            "category": groceries.id.to_string(),
            "date": "2024-03-06"
        })
    );
    let _: Transaction = create_transaction!(
        &service,
        json!({
            "merchant": "Employer",
            "amount": 100,
            "type": "income",
            "category": salary.id.to_string(),
            "date": "2024-03-01"
        })
    );

    let request = TestRequest::get()
        .uri("/api/transactions/stats")
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["totalSpent"], "50");
    assert_eq!(body["totalIncome"], "100");
    assert_eq!(body["categoryBreakdown"][groceries.id.to_string()], "50");
    assert_eq!(body["merchantBreakdown"]["Grocer"]["count"], 2);
    assert_eq!(body["merchantBreakdown"]["Grocer"]["total"], "50");
    // income merchants stay out of the breakdown
    assert!(body["merchantBreakdown"]["Employer"].is_null());
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_stats_date_window(
    _tracing_setup: &(),
    repos: (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>),
) {
    let (transaction_repo, catalog_repo) = repos;
    let groceries = seed_category(&catalog_repo, "Groceries").await;
    let app = build_app!(transaction_repo, catalog_repo);
    let service = test::init_service(app).await;

    let _: Transaction = create_transaction!(
        &service,
        json!({
            "merchant": "Grocer",
            "amount": 30,
            "type": "expense",
            "category": groceries.id.to_string(),
            "date": "2024-02-15"
        })
    );
    let _: Transaction = create_transaction!(
        &service,
        json!({
            "merchant": "Grocer",
            "amount": 20,
            "type": "expense",
            "category": groceries.id.to_string(),
            "date": "2024-03-06"
        })
    );

    let request = TestRequest::get()
        .uri("/api/transactions/stats?startDate=2024-03-01&endDate=2024-03-31")
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["totalSpent"], "20");
    assert_eq!(body["merchantBreakdown"]["Grocer"]["count"], 1);
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_stats_empty(
    _tracing_setup: &(),
    repos: (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>),
) {
    let (transaction_repo, catalog_repo) = repos;
    let app = build_app!(transaction_repo, catalog_repo);
    let service = test::init_service(app).await;

    let request = TestRequest::get()
        .uri("/api/transactions/stats")
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["totalSpent"], "0");
    assert_eq!(body["totalIncome"], "0");
    assert_eq!(body["categoryBreakdown"], json!({}));
    assert_eq!(body["merchantBreakdown"], json!({}));
}
