//! Augmentation module
//!
//! After the correlation group's table is built, the identifiers in one of
//! its columns are collected into `CorrelationKeys` and sent to an external
//! service. The records it returns become one more table.
//!
//! Failures here never touch the tables already produced; the engine
//! reports them and omits the augmentation sheet.

mod client;
mod keys;

pub use client::{auth_config, insert_at_path, AugmentationClient};
pub use keys::CorrelationKeys;

#[cfg(test)]
mod tests;
