//! Wire types exchanged with the storefront backend.
//!
//! Every struct here mirrors a JSON body of the REST API (camelCase on the
//! wire). Identifiers are transparent `u64` newtypes so they serialize as bare
//! numbers and can be interpolated straight into URL paths.

/// Declares a type-safe numeric identifier.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

pub(crate) use id_type;

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod review;
pub mod user;

pub use address::*;
pub use cart::*;
pub use order::*;
pub use product::*;
pub use review::*;
pub use user::*;
