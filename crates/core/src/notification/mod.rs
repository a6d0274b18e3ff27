//! In-app notifications.
//!
//! Lifecycle operations announce notable events (payment registered,
//! payment confirmed, proof uploaded, invoice created). Delivery is
//! fire-and-forget: a failed notification is logged and never undoes the
//! operation that triggered it.

pub mod service;
pub mod types;

pub use service::{DEFAULT_LIST_LIMIT, Notifier};
pub use types::{Notification, NotificationKind};
