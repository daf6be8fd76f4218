use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use actix_web::web::Data;
use actix_web::{test, web, App};
use rstest::rstest;
use serde_json::{json, Value};
use spendguard_repo::catalog_repo::{Account, CatalogRepo, Category, Tag};
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
async fn test_category_crud(
    _tracing_setup: &(),
    repos: (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>),
) {
    let (transaction_repo, catalog_repo) = repos;
    let app = build_app!(transaction_repo, catalog_repo);
    let service = test::init_service(app).await;

    let request = TestRequest::post()
        .uri("/api/categories")
        .set_json(json!({
            "name": "Groceries",
            "type": "expense",
            "icon": "🛒",
            "color": "#4CAF50"
        }))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Category = test::read_body_json(response).await;
    assert_eq!(created.name, "Groceries");
    assert_eq!(created.kind, "expense");

    let request = TestRequest::get().uri("/api/categories").to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let categories: Vec<Category> = test::read_body_json(response).await;
    assert_eq!(categories.len(), 1);

    let request = TestRequest::put()
        .uri(&format!("/api/categories/{}", created.id))
        .set_json(json!({ "name": "Food", "type": "expense" }))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Category = test::read_body_json(response).await;
    assert_eq!(updated.name, "Food");

    let request = TestRequest::delete()
        .uri(&format!("/api/categories/{}", created.id))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_category_validation_and_duplicates(
    _tracing_setup: &(),
    repos: (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>),
) {
    let (transaction_repo, catalog_repo) = repos;
    seed_category(&catalog_repo, "Groceries").await;
    let app = build_app!(transaction_repo, catalog_repo);
    let service = test::init_service(app).await;

    let request = TestRequest::post()
        .uri("/api/categories")
        .set_json(json!({ "name": "Missing Type" }))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Name and type are required");

    let request = TestRequest::post()
        .uri("/api/categories")
        .set_json(json!({ "name": "groceries", "type": "expense" }))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Category name already exists");
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_delete_category_in_use(
    _tracing_setup: &(),
    repos: (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>),
) {
    let (transaction_repo, catalog_repo) = repos;
    let category = seed_category(&catalog_repo, "Groceries").await;
    let app = build_app!(transaction_repo, catalog_repo);
    let service = test::init_service(app).await;

    let _: Transaction = create_transaction!(
        &service,
        json!({
            "merchant": "Grocer",
            "amount": 25,
            "type": "expense",
            "category": category.id.to_string(),
            "date": "2024-03-10"
        })
    );

    let request = TestRequest::delete()
        .uri(&format!("/api/categories/{}", category.id))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(
        body["message"],
        "Cannot delete category with existing transactions"
    );
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_account_crud(
    _tracing_setup: &(),
    repos: (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>),
) {
    let (transaction_repo, catalog_repo) = repos;
    let app = build_app!(transaction_repo, catalog_repo);
    let service = test::init_service(app).await;

    let request = TestRequest::post()
        .uri("/api/accounts")
        .set_json(json!({ "name": "Checking", "type": "bank" }))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Account = test::read_body_json(response).await;
    assert_eq!(created.name, "Checking");
    assert_eq!(created.kind, "bank");

    let request = TestRequest::put()
        .uri(&format!("/api/accounts/{}", created.id))
        .set_json(json!({ "name": "Joint Checking", "type": "bank" }))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Account = test::read_body_json(response).await;
    assert_eq!(updated.name, "Joint Checking");

    let request = TestRequest::delete()
        .uri(&format!("/api/accounts/{}", created.id))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = TestRequest::get().uri("/api/accounts").to_request();
    let response = test::call_service(&service, request).await;
    let accounts: Vec<Account> = test::read_body_json(response).await;
    assert!(accounts.is_empty());
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_create_tag_is_idempotent(
    _tracing_setup: &(),
    repos: (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>),
) {
    let (transaction_repo, catalog_repo) = repos;
    let app = build_app!(transaction_repo, catalog_repo);
    let service = test::init_service(app).await;

    let request = TestRequest::post()
        .uri("/api/tags")
        .set_json(json!({ "name": "recurring" }))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first: Tag = test::read_body_json(response).await;

    let request = TestRequest::post()
        .uri("/api/tags")
        .set_json(json!({ "name": " recurring " }))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let second: Tag = test::read_body_json(response).await;
    assert_eq!(second.id, first.id);

    let request = TestRequest::get().uri("/api/tags").to_request();
    let response = test::call_service(&service, request).await;
    let tags: Vec<Tag> = test::read_body_json(response).await;
    assert_eq!(tags.len(), 1);
}

#[instrument(skip(repos))]
#[rstest]
#[actix_rt::test]
async fn test_tag_requires_name(
    _tracing_setup: &(),
    repos: (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>),
) {
    let (transaction_repo, catalog_repo) = repos;
    let app = build_app!(transaction_repo, catalog_repo);
    let service = test::init_service(app).await;

    let request = TestRequest::post()
        .uri("/api/tags")
        .set_json(json!({ "name": "  " }))
        .to_request();
    let response = test::call_service(&service, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Name is required");
}
