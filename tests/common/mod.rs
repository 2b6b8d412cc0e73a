//! Common test infrastructure for end-to-end tests
//!
//! Every test spawns its own fake transcripts forum plus a corpus server with
//! an empty data directory pointed at it.
//!
//! # Example
//!
//! ```ignore
//! mod common;
//! use common::{TestClient, TestServer, SHOW_ID};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!     client.import(SHOW_ID).await;
//!
//!     let response = client.frequency(SHOW_ID, None, None).await;
//!     assert_eq!(response.status(), reqwest::StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

pub use client::TestClient;
#[allow(unused_imports)]
pub use constants::*;
pub use server::TestServer;
