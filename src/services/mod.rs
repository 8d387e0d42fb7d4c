//! Service layer.
//!
//! Routes stay thin and delegate message handling here.

pub mod message;
