//! API Routes
//!
//! Route handlers organized by functionality.

pub mod data;
pub mod export;
pub mod health;
pub mod page;
