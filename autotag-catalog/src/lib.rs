//! Catalog data source boundary for the autotag system.
//!
//! Products are consumed as ephemeral [`ProductView`] values produced one
//! page at a time by a [`CatalogSource`] implementation. The crate ships
//! an in-memory catalog used by tests and local development; production
//! deployments plug their own source in behind the same trait.

mod error;
mod memory;
mod product;
mod source;

pub use error::CatalogError;
pub use memory::{MemoryCatalog, TagWrite};
pub use product::{parse_decimal, PageInfo, ProductPage, ProductView, VariantView};
pub use source::CatalogSource;
