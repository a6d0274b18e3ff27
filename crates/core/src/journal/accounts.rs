//! Well-known chart-of-accounts keys.

/// Cash on hand and in bank.
pub const CASH: &str = "cash";

/// Amounts owed by customers.
pub const ACCOUNTS_RECEIVABLE: &str = "accounts_receivable";

/// Subcategory used for income recognized from invoice payments.
pub const SALES_SUBCATEGORY: &str = "sales";
