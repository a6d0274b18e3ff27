//! Aggregations over confirmed journal entries.
//!
//! Callers pass entries already restricted to the right state and date
//! range; these functions only group and sum.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tally_shared::types::JournalEntryId;

use super::accounts::ACCOUNTS_RECEIVABLE;
use super::aging::AgingReport;
use super::types::{EntryKind, JournalEntry, PostingCategory, Side};

/// Debit, credit and net balance of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    /// Account key.
    pub account: String,
    /// Sum of debits.
    pub debit: Decimal,
    /// Sum of credits.
    pub credit: Decimal,
    /// `debit - credit`.
    pub balance: Decimal,
}

/// Per-account balances as of a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSheet {
    /// Reference day.
    pub as_of: NaiveDate,
    /// Accounts sorted by key.
    pub accounts: Vec<AccountBalance>,
    /// Sum of debits.
    pub total_debit: Decimal,
    /// Sum of credits.
    pub total_credit: Decimal,
}

impl BalanceSheet {
    /// Builds the balance sheet.
    #[must_use]
    pub fn build<'a>(as_of: NaiveDate, entries: impl IntoIterator<Item = &'a JournalEntry>) -> Self {
        let mut by_account: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
        for posting in entries.into_iter().flat_map(|e| e.postings.iter()) {
            let slot = by_account
                .entry(posting.account.as_str())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            match posting.side {
                Side::Debit => slot.0 += posting.amount,
                Side::Credit => slot.1 += posting.amount,
            }
        }

        let accounts: Vec<AccountBalance> = by_account
            .into_iter()
            .map(|(account, (debit, credit))| AccountBalance {
                account: account.to_string(),
                debit,
                credit,
                balance: debit - credit,
            })
            .collect();

        Self {
            as_of,
            total_debit: accounts.iter().map(|a| a.debit).sum(),
            total_credit: accounts.iter().map(|a| a.credit).sum(),
            accounts,
        }
    }

    /// Returns the balance of one account, zero if it never moved.
    #[must_use]
    pub fn balance_of(&self, account: &str) -> Decimal {
        self.accounts
            .iter()
            .find(|a| a.account == account)
            .map_or(Decimal::ZERO, |a| a.balance)
    }
}

/// One (category, subcategory) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeStatementLine {
    /// Income or expense.
    pub category: PostingCategory,
    /// Subcategory, if any.
    pub subcategory: Option<String>,
    /// Sum of amounts.
    pub amount: Decimal,
}

/// Income and expense grouped by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeStatement {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
    /// Groups, income first.
    pub lines: Vec<IncomeStatementLine>,
    /// Sum of income lines.
    pub total_income: Decimal,
    /// Sum of expense lines.
    pub total_expense: Decimal,
    /// `total_income - total_expense`.
    pub net_income: Decimal,
}

impl IncomeStatement {
    /// Builds the income statement.
    #[must_use]
    pub fn build<'a>(
        start: NaiveDate,
        end: NaiveDate,
        entries: impl IntoIterator<Item = &'a JournalEntry>,
    ) -> Self {
        let mut groups: BTreeMap<(PostingCategory, Option<&str>), Decimal> = BTreeMap::new();
        for posting in entries.into_iter().flat_map(|e| e.postings.iter()) {
            if let Some(category) = posting.category {
                *groups
                    .entry((category, posting.subcategory.as_deref()))
                    .or_default() += posting.amount;
            }
        }

        let lines: Vec<IncomeStatementLine> = groups
            .into_iter()
            .map(|((category, subcategory), amount)| IncomeStatementLine {
                category,
                subcategory: subcategory.map(str::to_string),
                amount,
            })
            .collect();

        let sum_of = |category| -> Decimal {
            lines
                .iter()
                .filter(|l| l.category == category)
                .map(|l| l.amount)
                .sum()
        };
        let total_income = sum_of(PostingCategory::Income);
        let total_expense = sum_of(PostingCategory::Expense);

        Self {
            start,
            end,
            lines,
            total_income,
            total_expense,
            net_income: total_income - total_expense,
        }
    }
}

/// One (entry kind, posting category) group of cash movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashFlowLine {
    /// Entry kind.
    pub kind: EntryKind,
    /// Posting category, if any.
    pub category: Option<PostingCategory>,
    /// Sum of amounts.
    pub amount: Decimal,
}

/// Cash movements grouped by kind and category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashFlowStatement {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
    /// Groups.
    pub lines: Vec<CashFlowLine>,
    /// Sum over all groups.
    pub total: Decimal,
}

impl CashFlowStatement {
    /// Builds the cash-flow statement.
    #[must_use]
    pub fn build<'a>(
        start: NaiveDate,
        end: NaiveDate,
        entries: impl IntoIterator<Item = &'a JournalEntry>,
    ) -> Self {
        let mut groups: BTreeMap<(EntryKind, Option<PostingCategory>), Decimal> = BTreeMap::new();
        for entry in entries {
            for posting in entry.postings.iter().filter(|p| p.affects_cash) {
                *groups.entry((entry.kind, posting.category)).or_default() += posting.amount;
            }
        }

        let lines: Vec<CashFlowLine> = groups
            .into_iter()
            .map(|((kind, category), amount)| CashFlowLine {
                kind,
                category,
                amount,
            })
            .collect();

        Self {
            start,
            end,
            total: lines.iter().map(|l| l.amount).sum(),
            lines,
        }
    }
}

/// Ages entries touching accounts receivable by their date.
#[must_use]
pub fn receivables_aging<'a>(
    as_of: NaiveDate,
    entries: impl IntoIterator<Item = &'a JournalEntry>,
) -> AgingReport {
    AgingReport::build(
        as_of,
        entries
            .into_iter()
            .filter(|e| e.touches(ACCOUNTS_RECEIVABLE))
            .map(|e| (e.day(), e.total)),
    )
}

/// One posting on an account with the balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountMovement {
    /// Entry the posting belongs to.
    pub entry_id: JournalEntryId,
    /// Entry date.
    pub date: DateTime<Utc>,
    /// Entry description.
    pub description: String,
    /// Entry reference.
    pub reference: Option<String>,
    /// Debit or credit.
    pub side: Side,
    /// Posting amount.
    pub amount: Decimal,
    /// Running `debit - credit` after this posting.
    pub running_balance: Decimal,
}

/// Lists postings on `account` in date order with a running balance.
#[must_use]
pub fn account_movements<'a>(
    account: &str,
    entries: impl IntoIterator<Item = &'a JournalEntry>,
) -> Vec<AccountMovement> {
    let mut sorted: Vec<&JournalEntry> = entries.into_iter().collect();
    sorted.sort_by_key(|e| (e.date, e.created_at));

    let mut running = Decimal::ZERO;
    let mut movements = Vec::new();
    for entry in sorted {
        for posting in entry.postings.iter().filter(|p| p.account == account) {
            running += posting.signed_amount();
            movements.push(AccountMovement {
                entry_id: entry.id,
                date: entry.date,
                description: entry.description.clone(),
                reference: entry.reference.clone(),
                side: posting.side,
                amount: posting.amount,
                running_balance: running,
            });
        }
    }
    movements
}
