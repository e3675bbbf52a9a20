//! Newtype IDs for type-safe entity references.
//!
//! The bookshop API hands out opaque string identifiers. Use the
//! `define_id!` macro to create type-safe wrappers that prevent
//! accidentally passing, say, a genre ID where a book ID is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
/// - `Display` forwarding to the inner string
///
/// # Example
///
/// ```rust
/// # use bitshelf_core::define_id;
/// define_id!(BookId);
/// define_id!(GenreId);
///
/// let book_id = BookId::new("b-42");
/// let genre_id = GenreId::new("g-7");
///
/// // These are different types, so this won't compile:
/// // let _: BookId = genre_id;
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
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
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

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(BookId);
define_id!(GenreId);
define_id!(UserId);
define_id!(TransactionId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = BookId::new("abc-123");
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(String::from(id), "abc-123");
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = GenreId::new("g-9");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"g-9\"");

        let back: GenreId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ids_are_distinct_types() {
        // Compile-time property; here we just check equality semantics.
        let a = TransactionId::new("t-1");
        let b = TransactionId::from("t-1");
        assert_eq!(a, b);
    }
}
