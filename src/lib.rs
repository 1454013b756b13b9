//! Portable phpass ("$P$") password hashing.
//!
//! This library implements the portable variant of the phpass scheme used by
//! WordPress, phpBB, Drupal 6 and other legacy PHP applications. A hash is a
//! self-contained 34-character ASCII string: the `$P$` marker, one character
//! encoding the cost exponent, an 8-character salt, and 22 characters of
//! encoded MD5 digest.
//!
//! # Example
//!
//! ```
//! use phpass::PasswordHash;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hasher = PasswordHash::new(10, true);
//!
//! let hash = hasher.hash_password("correct horse battery staple")?;
//! assert!(hash.starts_with("$P$"));
//!
//! assert!(hasher.check_password("correct horse battery staple", &hash));
//! assert!(!hasher.check_password("wrong password", &hash));
//! # Ok(())
//! # }
//! ```
//!
//! # Security Warning
//!
//! phpass is built on MD5, which is cryptographically broken. This
//! implementation exists for compatibility with existing password databases
//! only. Do not choose phpass for new systems - use bcrypt or argon2 instead.

mod encode;
mod entropy;
mod error;
mod phpass;

pub use error::{Error, Result};
pub use phpass::{PasswordHash, HASH_LEN, PORTABLE_PREFIX, SALT_LEN, SETTING_LEN};
