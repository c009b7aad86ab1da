//! Application services: the use cases behind the HTTP handlers.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod dispatch;
pub mod orders;
