//! `mailtriage` — interactive size-first cleanup of a Gmail mailbox.
//!
//! This crate provides the core library: paginated retrieval of every
//! message matching a search, ranking by size, and the operator-driven
//! review loop that deletes or skips each one.

pub mod auth;
pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod i18n;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod rank;
pub mod remote;
pub mod review;
