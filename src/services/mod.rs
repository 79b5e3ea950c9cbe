//! Service layer
//!
//! Each service owns a clone of the shared [`RemoteFetcher`](crate::utils::RemoteFetcher)
//! and performs at most two outbound requests per call.

pub mod download;
pub mod keepalive;
pub mod metadata;
pub mod probe;
pub mod resolver;

pub use download::{DownloadService, ProxiedDownload};
pub use keepalive::KeepaliveService;
pub use metadata::MetadataService;
pub use probe::ProbeService;
pub use resolver::{ResolveStage, ResolverService};
