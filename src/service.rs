//! The search backend as seen by the page controller.

use crate::entities::drug::{IdenticalQuery, IdenticalResponse, SearchQuery, SearchResponse};
use crate::error::DrugLookupError;

/// Remote search operations. `SearchApiClient` talks HTTP; tests substitute
/// in-memory fakes.
#[async_trait::async_trait]
pub trait SearchService: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, DrugLookupError>;

    async fn identical(&self, query: &IdenticalQuery)
    -> Result<IdenticalResponse, DrugLookupError>;
}
