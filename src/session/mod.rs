//! Ambient session state consumed by the pipeline
//!
//! The pipeline reads the current navigation path, the selected tenant, the
//! tenant memberships and the access token through these seams, and owns
//! none of their lifecycles.

pub mod context;
pub mod navigator;
pub mod token;

pub use context::{RequestContextProvider, StaticContext};
pub use navigator::{LogNavigator, Navigator};
pub use token::{is_token_valid, is_token_valid_at, FileTokenStore, MemoryTokenStore, TokenStore};
