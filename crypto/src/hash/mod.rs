//! Cryptographic hash digests for Cardano
//!
//! [`struct@Hash`] is a conveniently strongly typed, fixed-length byte array.
//! Common sizes in Cardano are 28 bytes (script/key hashes, as used in
//! addresses) and 32 bytes (block and transaction hashes).
//!
//! # Example
//!
//! ```
//! use cardano_crypto::hash::Hash;
//!
//! let digest: Hash<28> = "276fd18711931e2c0e21430192dbeac0e458093cd9d1fcd7210f64b3"
//!     .parse()
//!     .unwrap();
//! assert_eq!(digest.to_string(), "276fd18711931e2c0e21430192dbeac0e458093cd9d1fcd7210f64b3");
//! ```

#[allow(clippy::module_inception)]
mod hash;
mod serde;

pub use self::hash::Hash;
