//! Schema cache
//!
//! Holds the authoritative projection of the connected data source: the table
//! list, columns loaded on demand, user annotations and the connection context.

mod schema_cache;

pub use schema_cache::{AnnotationIngest, Expansion, SchemaCache, SharedSchemaCache};
