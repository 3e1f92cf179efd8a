//! Base repository trait for database operations.
//!
//! A repository is a data access layer for a postgres table. Each repository
//! borrows a connection (usually from an open transaction) and exposes the
//! queries for one entity type. The shared trait covers the read/create shape
//! every catalog entity has; entity-specific queries (position maxima,
//! association probes, duplicate checks) are inherent methods on the
//! individual repositories.

use crate::db::errors::Result;

/// Base repository trait providing common database operations
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities with filtering and pagination
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;
}
