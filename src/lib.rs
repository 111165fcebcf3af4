//! HousrCash - rewards, cashback and group expense splitting
//!
//! Users earn points on bill payments, spend them on catalog rewards, and can
//! split shared expenses inside a group. This crate holds the database layer,
//! session handling, and the HTTP API.

pub mod config;
pub mod crypto;
pub mod db;
pub mod email;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod invite;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod rate_limit;
pub mod response;
pub mod split;
