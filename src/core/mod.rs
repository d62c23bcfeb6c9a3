pub mod dashboard;
pub mod recurring;
