//! Catalog services and the ports they consume.

pub mod actor;
pub mod catalog;
pub mod error;
pub mod guard;
pub mod listing;
pub mod pagination;
pub mod products;
pub mod repos;
pub mod storage;
