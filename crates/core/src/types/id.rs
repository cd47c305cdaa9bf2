//! Newtype IDs for type-safe entity references.
//!
//! The hosted backend hands out identifiers as opaque strings (UUIDs in
//! practice, but nothing here relies on that). Use the `define_id!` macro to
//! create wrappers that prevent accidentally mixing IDs from different tables.

/// Macro to define a type-safe, string-backed ID wrapper.
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
/// # use shophub_core::define_id;
/// define_id!(WishlistId);
/// define_id!(OrderId);
///
/// let wishlist = WishlistId::new("a1");
/// let order = OrderId::new("a1");
/// assert_eq!(wishlist.as_str(), order.as_str());
///
/// // These are different types, so this won't compile:
/// // let _: WishlistId = order;
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

// Entity IDs issued by the hosted backend
define_id!(UserId);
define_id!(ProductId);
define_id!(CartItemId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_is_raw_value() {
        let id = ProductId::new("7f0c2a");
        assert_eq!(id.to_string(), "7f0c2a");
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = CartItemId::new("line-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"line-1\"");

        let parsed: CartItemId = serde_json::from_str("\"line-2\"").unwrap();
        assert_eq!(parsed.as_str(), "line-2");
    }

    #[test]
    fn test_id_conversions() {
        let from_str: UserId = "u1".into();
        let from_string: UserId = String::from("u1").into();
        assert_eq!(from_str, from_string);
        assert_eq!(from_str.into_inner(), "u1");
    }
}
