//! DataScout Core - Shared types and seams for the schema annotation client
//!
//! This crate provides the vocabulary every other DataScout crate speaks:
//!
//! - `RemoteCall` - Trait for the transport that performs backend requests
//! - `RemoteRequest` - The backend endpoints the client core talks to
//! - `Table` / `Column` - In-memory schema entities the UI annotates
//! - `TableRecord` / `ColumnRecord` - Schema payloads as received from the backend
//! - `Backend` / `ConnectDetails` / `ConnectionInfo` - Connection identity

mod connection;
mod error;
mod remote;
mod schema;

pub use connection::*;
pub use error::*;
pub use remote::*;
pub use schema::*;
