//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel.
//! - **fs_image_store**: post images written under the upload directory.
//!
//! Adapters translate between domain types and storage representations and
//! contain no business rules.

mod fs_image_store;
pub mod persistence;

pub use fs_image_store::FsImageStore;
