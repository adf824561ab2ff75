pub mod api_client;
pub mod blob;
pub mod retry;

pub use api_client::{ApiClient, ProgressCallback, RequestOptions};
pub use blob::BlobSink;
pub use retry::RetryPolicy;
