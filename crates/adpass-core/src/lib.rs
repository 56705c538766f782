//! Core types and the account-evaluation pipeline for adpass.
//!
//! This crate is free of LDAP and SMTP dependencies. The directory and mail
//! adapters implement the traits in [`source`]; the binary wires them to the
//! [`pipeline::Pipeline`].

// Adapters implement the `source` traits with plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod epoch;
pub mod error;
pub mod evaluate;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod status;
pub mod timezone;

pub use error::{Error, Result};
