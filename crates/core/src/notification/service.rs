//! Notification delivery.

use std::sync::Arc;

use chrono::Utc;
use tally_shared::types::{NotificationId, UserId};
use tokio::sync::broadcast;

use super::types::{Notification, NotificationKind};
use crate::store::{NotificationStore, StoreError};

/// Default page size for notification listings.
pub const DEFAULT_LIST_LIMIT: u64 = 50;

const CHANNEL_CAPACITY: usize = 256;

/// Stores notifications and fans them out to live subscribers.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn NotificationStore>,
    sender: broadcast::Sender<Notification>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.sender.receiver_count())
            .finish_non_exhaustive()
    }
}

impl Notifier {
    /// Creates a notifier over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { store, sender }
    }

    /// Stores and publishes a notification. Never fails: errors are logged.
    pub async fn notify(
        &self,
        user_id: UserId,
        kind: NotificationKind,
        message: impl Into<String>,
        data: serde_json::Value,
    ) {
        let notification = Notification {
            id: NotificationId::new(),
            user_id,
            kind,
            message: message.into(),
            data,
            read: false,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_notification(&notification).await {
            tracing::warn!(error = %e, kind = kind.as_str(), "failed to store notification");
            return;
        }
        // No live subscribers is not an error.
        let _ = self.sender.send(notification);
    }

    /// Receives every notification published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Lists a user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store fails.
    pub async fn list(&self, user_id: UserId, limit: u64) -> Result<Vec<Notification>, StoreError> {
        self.store.list_notifications(user_id, limit).await
    }

    /// Counts a user's unread notifications.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store fails.
    pub async fn unread_count(&self, user_id: UserId) -> Result<u64, StoreError> {
        self.store.count_unread(user_id).await
    }

    /// Marks one notification read; false when it is not the user's.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store fails.
    pub async fn mark_read(&self, user_id: UserId, id: NotificationId) -> Result<bool, StoreError> {
        self.store.mark_read(user_id, id).await
    }

    /// Marks all of a user's notifications read.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store fails.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, StoreError> {
        self.store.mark_all_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn notifier() -> Notifier {
        Notifier::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_notify_stores_and_publishes() {
        let notifier = notifier();
        let mut rx = notifier.subscribe();
        let user = UserId::new();

        notifier
            .notify(
                user,
                NotificationKind::InvoiceCreated,
                "Invoice FAC-2026-0001 created",
                serde_json::json!({ "number": "FAC-2026-0001" }),
            )
            .await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.kind, NotificationKind::InvoiceCreated);
        assert_eq!(received.user_id, user);

        let listed = notifier.list(user, DEFAULT_LIST_LIMIT).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(notifier.unread_count(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_notify_without_subscribers() {
        let notifier = notifier();
        let user = UserId::new();
        notifier
            .notify(user, NotificationKind::PaymentRegistered, "m", serde_json::Value::Null)
            .await;
        assert_eq!(notifier.unread_count(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_scoped_to_owner() {
        let notifier = notifier();
        let owner = UserId::new();
        let stranger = UserId::new();
        notifier
            .notify(owner, NotificationKind::ProofUploaded, "m", serde_json::Value::Null)
            .await;
        let id = notifier.list(owner, 10).await.unwrap()[0].id;

        assert!(!notifier.mark_read(stranger, id).await.unwrap());
        assert!(notifier.mark_read(owner, id).await.unwrap());
        assert_eq!(notifier.unread_count(owner).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let notifier = notifier();
        let user = UserId::new();
        for _ in 0..3 {
            notifier
                .notify(user, NotificationKind::PaymentConfirmed, "m", serde_json::Value::Null)
                .await;
        }
        assert_eq!(notifier.mark_all_read(user).await.unwrap(), 3);
        assert_eq!(notifier.unread_count(user).await.unwrap(), 0);
        assert_eq!(notifier.mark_all_read(user).await.unwrap(), 0);
    }
}
