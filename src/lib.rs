//! `playkey` - Sign in to a video service and resolve playable DRM streams
//!
//! # Features
//!
//! - **Login**: Browser-less authorization-code flow with a cached bearer token
//! - **Resolution**: Video configuration → provider session → final manifest URL
//! - **DRM**: License key descriptors for a Widevine-capable player
//!
//! # Example
//!
//! ```rust,no_run
//! use playkey::{Category, ServiceConfig, SessionClient, StreamProvider, StreamResolver};
//! use playkey::license::KeyType;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::load(None)?;
//!     let client = SessionClient::new(&config.http, None)?;
//!     let resolver = StreamResolver::new(&config, client);
//!
//!     let stream = resolver.resolve(Category::Episodes, "ep-123").await?;
//!     println!("{} -> {}", stream.title, stream.manifest_url);
//!     println!("{}", stream.license_key(KeyType::R, &[], None)?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http_client;
pub mod license;
pub mod settings;
pub mod stream;

pub use api::ApiClient;
pub use auth::{AuthSession, TokenCache};
pub use config::ServiceConfig;
pub use error::{ErrorClass, PlayError, Result};
pub use http_client::SessionClient;
pub use license::{create_license_key, KeyType};
pub use settings::{Credentials, FileSettings, ProxyConfig, Settings};
pub use stream::{Category, ResolvedStream, StreamProvider, StreamResolver};

/// Version of playkey
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
