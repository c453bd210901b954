//! Domain records
//!
//! One module per administrative area. Each record type implements
//! [`Record`](crate::store::Record) (ownership, integrity checks, filtering)
//! and, when it is exposed for create/update, [`Resource`](crate::store::Resource).

/// Declares a closed set of string-labelled states or kinds.
///
/// The label is the wire form used by serde, query filters, and pages.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $variant:ident => $label:literal ),+ $(,)?
        }
        default = $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label, )+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod accounts;
pub mod certifications;
pub mod courses;
pub mod employers;
pub mod financials;
pub mod students;
pub mod value_objects;

pub use accounts::*;
pub use certifications::*;
pub use courses::*;
pub use employers::*;
pub use financials::*;
pub use students::*;
pub use value_objects::*;
