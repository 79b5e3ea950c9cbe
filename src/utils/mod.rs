pub mod content_type;
pub mod filename;
pub mod http_client;
pub mod url;

pub use http_client::{FetchRequest, FetchedResponse, RemoteFetcher};
