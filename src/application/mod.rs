//! Application services: audit timeline derivation, polling, and group listings.

pub mod audit;
pub mod backend;
pub mod chrome;
pub mod error;
pub mod groups;
pub mod stream;

#[cfg(test)]
pub(crate) mod test_support;
