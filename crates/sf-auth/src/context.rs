//! Identity handed to the host authentication flow in REST mode.

/// Ids the host auth flow needs to mint credentials for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub source_id: String,
}

impl AuthContext {
    /// Create a new auth context.
    pub fn new(user_id: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            source_id: source_id.into(),
        }
    }
}

/// Source of [`AuthContext`] values, consulted when the client config does
/// not carry explicit ids.
pub trait AuthContextProvider: Send + Sync {
    /// The current user and source ids, if known.
    fn auth_context(&self) -> Option<AuthContext>;
}

impl<F> AuthContextProvider for F
where
    F: Fn() -> Option<AuthContext> + Send + Sync,
{
    fn auth_context(&self) -> Option<AuthContext> {
        self()
    }
}

/// Fixed ids.
#[derive(Debug, Clone)]
pub struct StaticAuthContext(pub AuthContext);

impl AuthContextProvider for StaticAuthContext {
    fn auth_context(&self) -> Option<AuthContext> {
        Some(self.0.clone())
    }
}

/// Reads `SF_USER_ID` and `SF_SOURCE_ID` on every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvAuthContext;

impl AuthContextProvider for EnvAuthContext {
    fn auth_context(&self) -> Option<AuthContext> {
        let user_id = std::env::var("SF_USER_ID").ok().filter(|v| !v.is_empty())?;
        let source_id = std::env::var("SF_SOURCE_ID").ok().filter(|v| !v.is_empty())?;
        Some(AuthContext::new(user_id, source_id))
    }
}
