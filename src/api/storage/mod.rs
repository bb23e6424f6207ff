//! Storage module for the API.
//!
//! Provides the document store adapter contract with in-memory and PostgreSQL backends.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::StorageError;
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use traits::{Collection, DocumentStore, Filter, JoinSpec, PullMatcher};
