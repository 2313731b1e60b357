//! Campus marketplace backend: a cached product catalog with merchant
//! ownership checks on every write.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
