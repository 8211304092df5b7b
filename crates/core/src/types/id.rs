//! Opaque identifiers issued by the remote commerce store.
//!
//! Use the `define_token!` macro to create type-safe wrappers that prevent
//! accidentally passing a cart id where a line item id is expected. The store
//! owns the format of every token; this side never parses or generates them.

/// Macro to define a type-safe opaque token wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use cartsync_core::define_token;
/// define_token!(ProductId);
/// define_token!(CartId);
///
/// let product = ProductId::new("prod_1");
/// let cart = CartId::new("cart_1");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = cart;
/// # assert_eq!(product.as_str(), "prod_1");
/// # assert_eq!(cart.as_str(), "cart_1");
/// ```
#[macro_export]
macro_rules! define_token {
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
            /// Wrap a token issued by the remote store.
            #[must_use]
            pub fn new(token: impl Into<String>) -> Self {
                Self(token.into())
            }

            /// Borrow the raw token.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the raw token.
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
            fn from(token: String) -> Self {
                Self(token)
            }
        }

        impl From<&str> for $name {
            fn from(token: &str) -> Self {
                Self(token.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_token!(ProductId);
define_token!(CartId);
define_token!(LineItemId);
define_token!(OrderId);
define_token!(CheckoutToken);
