//! Stream resolution for playkey
//!
//! Turns catalog ids into final manifest URLs and license locations via
//! the first-party video configuration and the delivery platform.

pub mod manifest;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod video_config;

pub use manifest::ManifestRewrite;
pub use provider::{Category, ManifestKind, ResolvedStream, StreamProvider};
pub use resolver::StreamResolver;
pub use video_config::ProviderDescriptor;
