//! Newtype IDs for type-safe entity references.
//!
//! The managed backend hands out opaque string identifiers (UUIDs for users,
//! UUIDs or slugs for listings). Use the `define_id!` macro to wrap them so a
//! listing id can never be passed where a user id is expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use rentswipe_core::define_id;
/// define_id!(ListingId);
/// define_id!(UserId);
///
/// let listing = ListingId::new("a1");
/// let user = UserId::new("a1");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = listing;
/// assert_eq!(listing.as_str(), user.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ListingId);
define_id!(UserId);
define_id!(DeviceId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_their_inner_value() {
        let id = ListingId::new("3f2c");
        assert_eq!(id.to_string(), "3f2c");
        assert_eq!(id.as_str(), "3f2c");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = UserId::from("user-1");
        assert_eq!(serde_json::to_string(&id).ok().as_deref(), Some("\"user-1\""));
    }
}
