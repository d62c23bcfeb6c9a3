pub mod budget;
pub mod kind;
pub mod recurring_rule;
pub mod transaction;
pub mod user;

pub use budget::Budget;
pub use kind::{Frequency, TxKind};
pub use recurring_rule::RecurringRule;
pub use transaction::Transaction;
pub use user::User;
