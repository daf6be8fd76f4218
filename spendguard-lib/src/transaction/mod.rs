use actix_web::{web, Scope};

pub mod handlers;
mod models;

pub use models::{CreateTransactionRequest, StatsQuery, TransactionQuery, UpdateTransactionRequest};

/// The stats route is registered before the id route so "stats" is not
/// captured as a transaction id.
pub fn transaction_service() -> Scope {
    web::scope("/transactions")
        .service(handlers::create_new_transaction)
        .service(handlers::get_all_transactions)
        .service(handlers::get_stats)
        .service(handlers::get_transaction)
        .service(handlers::update_transaction)
        .service(handlers::delete_transaction)
}
