use crate::catalog::{AccountRequest, CategoryRequest, TagRequest};
use crate::error::{catalog_error, HandlerError};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use spendguard_repo::catalog_repo::{CatalogRepo, NewAccount, NewCategory, NewTag};
use std::sync::Arc;
use uuid::Uuid;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_category(request: CategoryRequest) -> Result<NewCategory, HandlerError> {
    match (non_blank(request.name), non_blank(request.kind)) {
        (Some(name), Some(kind)) => Ok(NewCategory {
            name,
            kind,
            icon: request.icon,
            color: request.color,
        }),
        _ => Err(HandlerError::BadRequest(
            "Name and type are required".to_string(),
        )),
    }
}

fn validate_account(request: AccountRequest) -> Result<NewAccount, HandlerError> {
    match (non_blank(request.name), non_blank(request.kind)) {
        (Some(name), Some(kind)) => Ok(NewAccount { name, kind }),
        _ => Err(HandlerError::BadRequest(
            "Name and type are required".to_string(),
        )),
    }
}

fn validate_tag(request: TagRequest) -> Result<NewTag, HandlerError> {
    match non_blank(request.name) {
        Some(name) => Ok(NewTag { name }),
        None => Err(HandlerError::BadRequest("Name is required".to_string())),
    }
}

#[get("")]
pub async fn get_categories(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
) -> Result<impl Responder, HandlerError> {
    let categories = catalog_repo
        .get_categories()
        .await
        .map_err(|e| catalog_error(e, "Category", "fetch categories"))?;
    Ok(HttpResponse::Ok().json(categories))
}

#[post("")]
pub async fn create_category(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
    request: web::Json<CategoryRequest>,
) -> Result<impl Responder, HandlerError> {
    let new_category = validate_category(request.into_inner())?;
    let category = catalog_repo
        .create_category(new_category)
        .await
        .map_err(|e| catalog_error(e, "Category", "create category"))?;
    Ok(HttpResponse::Created().json(category))
}

#[put("/{category_id}")]
pub async fn update_category(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
    category_id: web::Path<Uuid>,
    request: web::Json<CategoryRequest>,
) -> Result<impl Responder, HandlerError> {
    let update = validate_category(request.into_inner())?;
    let category = catalog_repo
        .update_category(category_id.into_inner(), update)
        .await
        .map_err(|e| catalog_error(e, "Category", "update category"))?;
    Ok(HttpResponse::Ok().json(category))
}

#[delete("/{category_id}")]
pub async fn delete_category(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
    category_id: web::Path<Uuid>,
) -> Result<impl Responder, HandlerError> {
    catalog_repo
        .delete_category(category_id.into_inner())
        .await
        .map_err(|e| catalog_error(e, "Category", "delete category"))?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("")]
pub async fn get_accounts(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
) -> Result<impl Responder, HandlerError> {
    let accounts = catalog_repo
        .get_accounts()
        .await
        .map_err(|e| catalog_error(e, "Account", "fetch accounts"))?;
    Ok(HttpResponse::Ok().json(accounts))
}

#[post("")]
pub async fn create_account(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
    request: web::Json<AccountRequest>,
) -> Result<impl Responder, HandlerError> {
    let new_account = validate_account(request.into_inner())?;
    let account = catalog_repo
        .create_account(new_account)
        .await
        .map_err(|e| catalog_error(e, "Account", "create account"))?;
    Ok(HttpResponse::Created().json(account))
}

#[put("/{account_id}")]
pub async fn update_account(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
    account_id: web::Path<Uuid>,
    request: web::Json<AccountRequest>,
) -> Result<impl Responder, HandlerError> {
    let update = validate_account(request.into_inner())?;
    let account = catalog_repo
        .update_account(account_id.into_inner(), update)
        .await
        .map_err(|e| catalog_error(e, "Account", "update account"))?;
    Ok(HttpResponse::Ok().json(account))
}

#[delete("/{account_id}")]
pub async fn delete_account(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
    account_id: web::Path<Uuid>,
) -> Result<impl Responder, HandlerError> {
    catalog_repo
        .delete_account(account_id.into_inner())
        .await
        .map_err(|e| catalog_error(e, "Account", "delete account"))?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("")]
pub async fn get_tags(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
) -> Result<impl Responder, HandlerError> {
    let tags = catalog_repo
        .get_tags()
        .await
        .map_err(|e| catalog_error(e, "Tag", "fetch tags"))?;
    Ok(HttpResponse::Ok().json(tags))
}

/// Creating an existing tag returns the stored one instead of failing.
#[post("")]
pub async fn create_tag(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
    request: web::Json<TagRequest>,
) -> Result<impl Responder, HandlerError> {
    let new_tag = validate_tag(request.into_inner())?;
    let tag = catalog_repo
        .find_or_create_tag(&new_tag.name)
        .await
        .map_err(|e| catalog_error(e, "Tag", "create tag"))?;
    Ok(HttpResponse::Created().json(tag))
}

#[put("/{tag_id}")]
pub async fn update_tag(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
    tag_id: web::Path<Uuid>,
    request: web::Json<TagRequest>,
) -> Result<impl Responder, HandlerError> {
    let update = validate_tag(request.into_inner())?;
    let tag = catalog_repo
        .update_tag(tag_id.into_inner(), update)
        .await
        .map_err(|e| catalog_error(e, "Tag", "update tag"))?;
    Ok(HttpResponse::Ok().json(tag))
}

#[delete("/{tag_id}")]
pub async fn delete_tag(
    catalog_repo: web::Data<Arc<dyn CatalogRepo>>,
    tag_id: web::Path<Uuid>,
) -> Result<impl Responder, HandlerError> {
    catalog_repo
        .delete_tag(tag_id.into_inner())
        .await
        .map_err(|e| catalog_error(e, "Tag", "delete tag"))?;
    Ok(HttpResponse::NoContent().finish())
}
