use async_trait::async_trait;

use super::traits::AuthProvider;
use crate::errors::CoreError;

/// A fixed bearer token, e.g. one handed over by the host application
/// after it completed its own login flow.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken").field("token", &"<redacted>").finish()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl AuthProvider for StaticToken {
    async fn bearer_token(&self) -> Result<String, CoreError> {
        if self.token.trim().is_empty() {
            return Err(CoreError::Auth("no token available".into()));
        }
        Ok(self.token.clone())
    }
}
