// shopdesk-api: Async Rust client for shopdesk REST resource endpoints
//
// One convention per resource name `R`:
//   GET /R, GET /R/:id, GET /R/options, POST /R, PATCH /R/:id,
//   DELETE /R/:id, PATCH /R (bulk), DELETE /R (bulk).

pub mod client;
pub mod error;
pub mod multipart;
pub mod transport;
pub mod types;

pub use client::{ApiClient, ResourceClient};
pub use error::Error;
pub use multipart::{FilePart, FormValue, MultipartPayload};
pub use transport::{TlsMode, TransportConfig};
pub use types::{
    DEFAULT_PAGE_SIZE, OptionItem, PageMeta, PaginatedResult, QueryParams, RESERVED_KEYS,
    ResourceId, SortOrder, is_reserved_key, total_pages,
};
