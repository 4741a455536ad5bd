//! Typed wrappers over the backend endpoints.

mod accounts;
mod audit;
mod health;
mod loan;
mod transactions;

pub use accounts::AccountsApi;
pub use audit::AuditApi;
pub use health::HealthApi;
pub use loan::LoanApi;
pub use transactions::TransactionsApi;
