//! Session variables forwarded by the gateway in front of the service.

use std::collections::HashMap;

/// Session variable holding the authenticated principal.
pub const USER_ID: &str = "x-user-id";
/// Session variable holding the principal's role.
pub const ROLE: &str = "x-user-role";

/// Variables describing who is calling, as established by the auth layer.
///
/// ```json
/// { "x-user-id": "investor-42", "x-user-role": "investor" }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Session {
    variables: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    /// Session for an authenticated user.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.set(USER_ID, user_id);
        session
    }

    /// The authenticated principal. Blank values count as absent.
    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID).filter(|id| !id.trim().is_empty())
    }

    pub fn role(&self) -> Option<&str> {
        self.get(ROLE)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }
}
