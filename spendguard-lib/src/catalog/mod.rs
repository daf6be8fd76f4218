use actix_web::{web, Scope};
use serde::{Deserialize, Serialize};

pub mod handlers;

pub fn category_service() -> Scope {
    web::scope("/categories")
        .service(handlers::create_category)
        .service(handlers::get_categories)
        .service(handlers::update_category)
        .service(handlers::delete_category)
}

pub fn account_service() -> Scope {
    web::scope("/accounts")
        .service(handlers::create_account)
        .service(handlers::get_accounts)
        .service(handlers::update_account)
        .service(handlers::delete_account)
}

pub fn tag_service() -> Scope {
    web::scope("/tags")
        .service(handlers::create_tag)
        .service(handlers::get_tags)
        .service(handlers::update_tag)
        .service(handlers::delete_tag)
}

#[derive(Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CategoryRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AccountRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TagRequest {
    pub name: Option<String>,
}
