//! Traits for repository operations
//!
//! This module contains the traits that define the interface of the item
//! repository.

pub mod core;

pub use core::ItemRepository;
