use actix_web::{get, web, HttpResponse, Responder, Scope};
use chrono::Utc;
use serde_json::json;
use spendguard_repo::HealthCheck;
use std::sync::Arc;

pub fn health_service() -> Scope {
    web::scope("/health").service(check_health)
}

#[get("")]
async fn check_health(health_check: web::Data<Arc<dyn HealthCheck>>) -> impl Responder {
    if health_check.check().await {
        HttpResponse::Ok().json(json!({
            "status": "OK",
            "database": "connected",
            "timestamp": Utc::now().to_rfc3339(),
        }))
    } else {
        HttpResponse::ServiceUnavailable().json(json!({
            "status": "ERROR",
            "database": "connection failed",
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }
}
