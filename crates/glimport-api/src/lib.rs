// glimport-api: Async Rust client for the GitLab REST API (groups + projects)

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::{GitLabClient, PER_PAGE};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use types::{Group, Namespace, Page, PageInfo, Project};
