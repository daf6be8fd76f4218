use rstest::*;
use spendguard_repo::catalog_repo::{CatalogRepo, Category, NewCategory};
use spendguard_repo::transaction_repo::TransactionRepo;
use std::sync::Arc;
use tracing::info;
use tracing::Level;

macro_rules! build_app {
    ($transaction_repo:ident, $catalog_repo:ident) => {{
        let app = App::new()
            .app_data(Data::new($transaction_repo.clone()))
            .app_data(Data::new($catalog_repo.clone()))
            .wrap(spendguard_lib::tracing::create_middleware())
            .service(
                web::scope("/api")
                    .service(spendguard_lib::transaction::transaction_service())
                    .service(spendguard_lib::catalog::category_service())
                    .service(spendguard_lib::catalog::account_service())
                    .service(spendguard_lib::catalog::tag_service()),
            );
        tracing::info!("Built app");
        app
    }};
}

macro_rules! create_transaction {
    (&$service:ident, $payload:expr) => {{
        let request = TestRequest::post()
            .uri("/api/transactions")
            .set_json(&$payload)
            .to_request();
        let response = test::call_service(&$service, request).await;
        assert!(
            response.status().is_success(),
            "Got {} response when creating transaction",
            response.status()
        );
        test::read_body_json(response).await
    }};
}

#[fixture]
#[once]
pub fn tracing_setup() -> () {
    tracing_subscriber::fmt()
        .pretty()
        .with_max_level(Level::DEBUG)
        .init();
    info!("tracing initialized");
}

#[fixture]
pub fn repos() -> (Arc<dyn TransactionRepo>, Arc<dyn CatalogRepo>) {
    let (transaction_repo, catalog_repo, _health_check) = spendguard_repo::mem_repo::create_repos();
    (transaction_repo, catalog_repo)
}

pub async fn seed_category(catalog_repo: &Arc<dyn CatalogRepo>, name: &str) -> Category {
    let category = catalog_repo
        .create_category(NewCategory {
            name: name.to_string(),
            kind: "expense".to_string(),
            icon: Some("🛒".to_string()),
            color: None,
        })
        .await
        .unwrap();
    info!(%category.id, "Created category");
    category
}
