//! Domain models owned by the storefront itself.
//!
//! Only two pieces of state live on this side of the API boundary:
//! the bearer credential and the shopping cart. Both are kept in the
//! session.

pub mod cart;
pub mod session;

pub use cart::{Cart, CartLine};
pub use session::{BearerToken, keys as session_keys};
