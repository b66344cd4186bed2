pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod query;

#[cfg(test)]
pub(crate) mod test_support;
