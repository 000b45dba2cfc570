//! Módulo de base de datos
//!
//! Maneja la conexión con PostgreSQL y las dos implementaciones del
//! almacén de documentos.

pub mod connection;
pub mod memory_store;
pub mod postgres_store;
pub mod store;

pub use connection::DatabaseConnection;
pub use memory_store::MemoryDocumentStore;
pub use postgres_store::PgDocumentStore;
pub use store::{Collection, DocumentFilter, DocumentStore};
