//! Filesystem adapters for the sift review queue.
//!
//! - [`JsonStateStore`] persists queue progress, the trash set, and the
//!   total-count cache as one JSON document per concern under a data
//!   directory
//! - [`DirSource`] exposes a directory of media files as a stable-ordered,
//!   cursor-paginated page source

mod dir_source;
mod json_store;

pub use dir_source::DirSource;
pub use json_store::JsonStateStore;
