//! User profiles managed by the user manager service.

use serde::{Deserialize, Serialize};

/// Payload of a user creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Unique email address (primary key).
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl NewUser {
    /// Minimal shape check: non-empty names and an `@` in the email.
    pub fn is_valid(&self) -> bool {
        self.email.contains('@')
            && !self.first_name.trim().is_empty()
            && !self.last_name.trim().is_empty()
    }
}

/// A stored user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique email address.
    pub email: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Telegram chat used for alert delivery, once linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_chat_id: Option<String>,
}

impl From<NewUser> for User {
    fn from(new: NewUser) -> Self {
        Self {
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            telegram_chat_id: None,
        }
    }
}

/// Payload linking a Telegram chat to an existing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramLink {
    /// User to update.
    pub email: String,
    /// Telegram chat identifier.
    pub telegram_chat_id: String,
}
