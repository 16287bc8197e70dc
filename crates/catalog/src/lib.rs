//! Catalog domain module.
//!
//! Product and product-class collaborators consumed by the partner layer,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage).

pub mod product;

pub use product::{Product, ProductClass};
