use serde::{Deserialize, Serialize};

/// Role attached to an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

/// The signed-in user as persisted alongside the access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: u64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
}

impl SessionUser {
    pub fn new(id: u64, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            full_name: None,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
