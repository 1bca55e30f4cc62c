//! # dualforce-auth
//!
//! Credential handling for the REST transport.
//!
//! ## Security
//!
//! - Sensitive data (tokens, secrets) are redacted in Debug output
//! - Tracing skips credential parameters
//!
//! ## Pieces
//!
//! - [`AuthContextProvider`] - where the user and source ids for the host
//!   auth flow come from
//! - [`CredentialCache`] - the one `{token, rest_url}` pair shared by every
//!   call of a client, refreshed at most once per expiry
//! - [`OAuthClient`] - refresh-token grant used by the HTTP REST proxy
//!
//! ## Example
//!
//! ```rust,ignore
//! use dualforce_auth::{CredentialCache, RestSettings};
//!
//! let settings = RestSettings::from_env()?;
//! let cache = CredentialCache::new(Some(settings.credentials()));
//! ```

mod context;
mod credentials;
mod oauth;

pub use context::{AuthContext, AuthContextProvider, EnvAuthContext, StaticAuthContext};
pub use credentials::{CredentialCache, RestCredentials, RestSettings};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
