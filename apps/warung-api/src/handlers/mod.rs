//! HTTP handlers, one module per resource.

pub mod auth;
pub mod catalog;
pub mod health;
pub mod marketplace;
pub mod purchase;
pub mod realtime;
pub mod sales;
pub mod stock;
pub mod supplier;
pub mod user;
