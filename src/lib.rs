pub mod backend;
pub mod config;
pub mod core;
pub mod database;

#[cfg(test)]
pub mod test_utils;
