use crate::error::{transaction_error, HandlerError};
use crate::transaction::models::{
    CreateTransactionRequest, StatsQuery, TransactionQuery, UpdateTransactionRequest,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use spendguard_repo::transaction_repo::TransactionRepo;
use std::sync::Arc;
use uuid::Uuid;

#[get("")]
pub async fn get_all_transactions(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    query: web::Query<TransactionQuery>,
) -> Result<impl Responder, HandlerError> {
    let filter = query.into_inner().into_filter()?;
    let transactions = transaction_repo
        .get_all_transactions(filter)
        .await
        .map_err(|e| transaction_error(e, "fetch transactions"))?;
    Ok(HttpResponse::Ok().json(transactions))
}

#[get("/stats")]
pub async fn get_stats(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    query: web::Query<StatsQuery>,
) -> Result<impl Responder, HandlerError> {
    let query = query.into_inner();
    let stats = transaction_repo
        .get_stats(query.start_date, query.end_date)
        .await
        .map_err(|e| transaction_error(e, "fetch stats"))?;
    Ok(HttpResponse::Ok().json(stats))
}

#[get("/{transaction_id}")]
pub async fn get_transaction(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    transaction_id: web::Path<Uuid>,
) -> Result<impl Responder, HandlerError> {
    let transaction = transaction_repo
        .get_transaction(transaction_id.into_inner())
        .await
        .map_err(|e| transaction_error(e, "fetch transaction"))?;
    Ok(HttpResponse::Ok().json(transaction))
}

#[post("")]
pub async fn create_new_transaction(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    request: web::Json<CreateTransactionRequest>,
) -> Result<impl Responder, HandlerError> {
    let new_transaction = request.into_inner().into_new_transaction()?;
    let transaction = transaction_repo
        .create_new_transaction(new_transaction)
        .await
        .map_err(|e| transaction_error(e, "create transaction"))?;
    Ok(HttpResponse::Created().json(transaction))
}

#[put("/{transaction_id}")]
pub async fn update_transaction(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    transaction_id: web::Path<Uuid>,
    request: web::Json<UpdateTransactionRequest>,
) -> Result<impl Responder, HandlerError> {
    let update = request.into_inner().into_update()?;
    if update.is_empty() {
        return Err(HandlerError::BadRequest("No fields to update".to_string()));
    }
    let transaction = transaction_repo
        .update_transaction(transaction_id.into_inner(), update)
        .await
        .map_err(|e| transaction_error(e, "update transaction"))?;
    Ok(HttpResponse::Ok().json(transaction))
}

#[delete("/{transaction_id}")]
pub async fn delete_transaction(
    transaction_repo: web::Data<Arc<dyn TransactionRepo>>,
    transaction_id: web::Path<Uuid>,
) -> Result<impl Responder, HandlerError> {
    transaction_repo
        .delete_transaction(transaction_id.into_inner())
        .await
        .map_err(|e| transaction_error(e, "delete transaction"))?;
    Ok(HttpResponse::NoContent().finish())
}
