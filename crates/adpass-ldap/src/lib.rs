//! Active Directory account source for adpass.
//!
//! Connects with [`ldap3`], binds with a simple bind and runs one subtree
//! search. Each run opens and closes its own connection.

pub mod directory;
pub mod error;

pub use directory::{LdapDirectory, LdapSettings};
pub use error::{Error, Result};
