//! User Registry - Idempotent User Creation
//!
//! In-memory user store of the user manager service. Creation honours an
//! optional idempotency key: the first request under a key is executed and
//! its reply stored; every repeat of the key gets the stored reply back,
//! whatever its payload. Only the most recent keys are remembered; the
//! oldest is forgotten once `key_capacity` is exceeded.

use std::collections::{HashMap, VecDeque};

use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::domain::reply::Reply;
use crate::domain::user::{NewUser, TelegramLink, User};

/// Status of a newly created user.
pub const CREATED: u16 = 201;
/// Status when the email is already registered.
pub const CONFLICT: u16 = 409;
/// Status of a rejected payload.
pub const BAD_REQUEST: u16 = 400;
/// Idempotency keys remembered by [`UserRegistry::new`].
pub const DEFAULT_KEY_CAPACITY: usize = 10_000;

#[derive(Default)]
struct Store {
  /// Users by email.
  users: HashMap<String, User>,
  /// Replies already sent, by idempotency key.
  replies: HashMap<String, Reply<Value>>,
  /// Keys of `replies`, oldest first.
  key_order: VecDeque<String>,
}

impl Store {
  fn remember(&mut self, key: &str, reply: Reply<Value>, capacity: usize) {
    self.replies.insert(key.to_string(), reply);
    self.key_order.push_back(key.to_string());
    while self.key_order.len() > capacity {
      if let Some(oldest) = self.key_order.pop_front() {
        debug!(key = %oldest, "Forgetting idempotency key");
        self.replies.remove(&oldest);
      }
    }
  }
}

/// Thread-safe user store with idempotent creation.
pub struct UserRegistry {
  store: Mutex<Store>,
  key_capacity: usize,
}

impl Default for UserRegistry {
  fn default() -> Self {
    Self::with_key_capacity(DEFAULT_KEY_CAPACITY)
  }
}

impl UserRegistry {
  /// Empty registry remembering [`DEFAULT_KEY_CAPACITY`] keys.
  pub fn new() -> Self {
    Self::default()
  }

  /// Empty registry remembering at most `key_capacity` keys (at least one).
  pub fn with_key_capacity(key_capacity: usize) -> Self {
    Self {
      store: Mutex::new(Store::default()),
      key_capacity: key_capacity.max(1),
    }
  }

  /// Create a user.
  ///
  /// `201` on creation, `409` when the email exists, `400` on an invalid
  /// payload. With a key, the whole check-and-create runs under the store
  /// lock so concurrent requests sharing a key see exactly one execution.
  #[instrument(skip(self, new_user), fields(email = %new_user.email))]
  pub async fn create(&self, idempotency_key: Option<&str>, new_user: NewUser) -> Reply<Value> {
    let mut store = self.store.lock().await;

    if let Some(key) = idempotency_key {
      if let Some(stored) = store.replies.get(key) {
        debug!(key, "Replaying stored reply for idempotency key");
        return stored.clone();
      }
    }

    let reply = if !new_user.is_valid() {
      Reply::with_status(json!({ "error": "invalid user payload" }), BAD_REQUEST)
    } else if store.users.contains_key(&new_user.email) {
      Reply::with_status(json!({ "error": "user already exists" }), CONFLICT)
    } else {
      let user = User::from(new_user);
      info!(email = %user.email, "User created");
      let body = json!({ "message": "user created", "user": user });
      store.users.insert(user.email.clone(), user);
      Reply::with_status(body, CREATED)
    };

    if let Some(key) = idempotency_key {
      store.remember(key, reply.clone(), self.key_capacity);
    }
    reply
  }

  /// Look up a user by email.
  pub async fn get(&self, email: &str) -> Option<User> {
    self.store.lock().await.users.get(email).cloned()
  }

  /// Attach a Telegram chat to an existing user; `false` if unknown.
  pub async fn link_telegram(&self, link: TelegramLink) -> bool {
    let mut store = self.store.lock().await;
    match store.users.get_mut(&link.email) {
      Some(user) => {
        user.telegram_chat_id = Some(link.telegram_chat_id);
        true
      }
      None => false,
    }
  }

  /// Number of stored users.
  pub async fn len(&self) -> usize {
    self.store.lock().await.users.len()
  }
}
