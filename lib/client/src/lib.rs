//! Client primitives for the SeaTable HTTP API.
//!
//! This crate provides:
//!
//! - **Client registry**: shared map from client ID to connection settings
//! - **Transport**: the `HttpExecutor` trait, a reqwest implementation and a
//!   scripted mock for tests
//! - **Endpoints**: URL builders for the API gateway and file server routes
//! - **Row fetch-by-key**: bounded SQL select of `_id` plus one key column
//! - **Paginator**: offset-based bulk row listing with a max-rows cap
//! - **Files**: attachment upload and file download flows

pub mod config;
pub mod endpoint;
pub mod error;
pub mod files;
pub mod mock;
pub mod paginate;
pub mod registry;
pub mod rows;
pub mod transport;
pub mod value;

pub use config::{ConnectionConfig, HttpConfig};
pub use error::{ApiError, TransportError};
pub use files::{UploadLink, download_to, get_download_link, get_upload_link, upload_file};
pub use mock::{MockCall, MockExecutor};
pub use paginate::{PageRequest, RowBatch, fetch_all_rows};
pub use registry::ClientRegistry;
pub use rows::{SqlQuery, fetch_rows_for_key};
pub use transport::{
    ApiRequest, ApiResponse, DownloadResponse, HttpExecutor, HttpMethod, ReqwestExecutor,
    UploadRequest,
};
pub use value::{Row, row_string, value_to_key};
