//! Notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{NotificationId, UserId};

/// Event that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A payment was recorded.
    PaymentRegistered,
    /// A payment was confirmed.
    PaymentConfirmed,
    /// A proof file was attached to a payment.
    ProofUploaded,
    /// An invoice was created from a quote.
    InvoiceCreated,
    /// A user asked to recover their password.
    PasswordRecoveryRequested,
}

impl NotificationKind {
    /// Returns the storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentRegistered => "payment_registered",
            Self::PaymentConfirmed => "payment_confirmed",
            Self::ProofUploaded => "proof_uploaded",
            Self::InvoiceCreated => "invoice_created",
            Self::PasswordRecoveryRequested => "password_recovery_requested",
        }
    }

    /// Parses a storage name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        [
            Self::PaymentRegistered,
            Self::PaymentConfirmed,
            Self::ProofUploaded,
            Self::InvoiceCreated,
            Self::PasswordRecoveryRequested,
        ]
        .into_iter()
        .find(|k| k.as_str() == s)
    }
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Event kind.
    pub kind: NotificationKind,
    /// Human-readable text.
    pub message: String,
    /// Event payload (ids, numbers, amounts).
    pub data: serde_json::Value,
    /// Whether the recipient has seen it.
    pub read: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
