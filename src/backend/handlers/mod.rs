pub mod auth;
pub mod budgets;
pub mod dashboard;
pub mod export;
pub mod recurring;
pub mod transactions;
