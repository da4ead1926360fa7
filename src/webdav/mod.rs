//! WebDAV credentials and transport.

mod client;
mod multistatus;
mod store;

pub use client::{Depth, RemoteEntry, WebDavClient};
pub use store::WebDavStore;
