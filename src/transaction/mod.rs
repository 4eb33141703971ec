//! Transactions for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The models exchanged with the upstream API and the client-side categories
//! - Validation shared by the form, the JSON proxy and image capture
//! - The form state machine and the handlers for the list, create and edit pages

pub mod amount;
pub mod category;
pub mod core;
mod create_endpoint;
mod create_page;
mod edit_endpoint;
mod edit_page;
mod form;
mod form_endpoint;
mod list_page;
mod proxy;
pub mod validation;

pub use core::{NewTransaction, Transaction, TransactionId, TransactionType, TransactionUpdate};
pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use edit_endpoint::edit_transaction_endpoint;
pub use edit_page::get_edit_transaction_page;
pub use form_endpoint::refresh_transaction_form;
pub use list_page::get_transactions_page;
pub use proxy::{delete_transaction_proxy, get_transaction_proxy, update_transaction_proxy};
pub use validation::{
    UnvalidatedTransaction, ValidationError, ValidationErrors, validate_new, validate_update,
};
