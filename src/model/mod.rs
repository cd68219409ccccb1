//! Core data model types.

pub mod message;

pub use message::MessageRecord;
