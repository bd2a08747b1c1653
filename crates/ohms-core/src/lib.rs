//! ohms-core: answer items, the question submission protocol, and
//! gradebook statistics.
//!
//! This crate defines the data model, the server and page seams, and the
//! grading logic that the client and the `ohms` binary build on.

pub mod column;
pub mod cutoffs;
pub mod error;
pub mod gradebook;
pub mod homework;
pub mod item;
pub mod model;
pub mod parser;
pub mod question;
pub mod report;
pub mod traits;

#[cfg(test)]
mod test_support;
