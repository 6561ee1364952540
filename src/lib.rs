//! zpay-checkout - plan checkout through the Z-Pay payment gateway
//!
//! Authenticated users create pending orders and are redirected to a signed
//! Z-Pay cashier URL; the gateway's asynchronous notification settles the
//! order exactly once.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod payments;
pub mod rate_limit;
pub mod signature;
