use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tally_shared::types::{JournalEntryId, UserId};

use super::accounts::{ACCOUNTS_RECEIVABLE, CASH};
use super::statements::{account_movements, receivables_aging};
use super::*;
use crate::testing::fixture;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn entry(date: DateTime<Utc>, kind: EntryKind, postings: Vec<Posting>) -> JournalEntry {
    let total = PostingTotals::of(&postings).unwrap().debit;
    JournalEntry {
        id: JournalEntryId::new(),
        date,
        kind,
        description: "test".to_string(),
        reference: None,
        postings,
        total,
        state: EntryState::Confirmed,
        created_by: UserId::new(),
        created_at: date,
        confirmed_at: Some(date),
    }
}

fn payment_entry(date: DateTime<Utc>, amount: Decimal) -> JournalEntry {
    entry(
        date,
        EntryKind::Income,
        vec![
            Posting::debit(CASH, amount)
                .categorized(PostingCategory::Income, Some("sales"))
                .cash(),
            Posting::credit(ACCOUNTS_RECEIVABLE, amount),
        ],
    )
}

fn rent_entry(date: DateTime<Utc>, amount: Decimal) -> JournalEntry {
    entry(
        date,
        EntryKind::Expense,
        vec![
            Posting::debit("rent", amount).categorized(PostingCategory::Expense, Some("rent")),
            Posting::credit(CASH, amount)
                .categorized(PostingCategory::Expense, Some("rent"))
                .cash(),
        ],
    )
}

// ========== Pure Statements ==========

#[test]
fn test_balance_sheet_per_account() {
    let entries = [
        payment_entry(at(2026, 1, 5), dec!(21.40)),
        rent_entry(at(2026, 1, 6), dec!(5.00)),
    ];
    let sheet = BalanceSheet::build(NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(), &entries);

    assert_eq!(sheet.balance_of(CASH), dec!(16.40));
    assert_eq!(sheet.balance_of(ACCOUNTS_RECEIVABLE), dec!(-21.40));
    assert_eq!(sheet.balance_of("rent"), dec!(5.00));
    assert_eq!(sheet.balance_of("unknown"), dec!(0));
    assert_eq!(sheet.total_debit, sheet.total_credit);
}

#[test]
fn test_income_statement_groups_by_category() {
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    let entries = [
        payment_entry(at(2026, 1, 5), dec!(100)),
        payment_entry(at(2026, 1, 9), dec!(50)),
        rent_entry(at(2026, 1, 6), dec!(30)),
    ];
    let statement = IncomeStatement::build(start, end, &entries);

    assert_eq!(statement.total_income, dec!(150));
    // both rent postings carry the expense category
    assert_eq!(statement.total_expense, dec!(60));
    assert_eq!(statement.net_income, dec!(90));
    assert_eq!(statement.lines.len(), 2);
}

#[test]
fn test_cash_flow_counts_cash_postings_only() {
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    let entries = [
        payment_entry(at(2026, 1, 5), dec!(100)),
        rent_entry(at(2026, 1, 6), dec!(30)),
    ];
    let flow = CashFlowStatement::build(start, end, &entries);

    assert_eq!(flow.lines.len(), 2);
    assert_eq!(flow.lines[0].kind, EntryKind::Income);
    assert_eq!(flow.lines[0].amount, dec!(100));
    assert_eq!(flow.lines[1].kind, EntryKind::Expense);
    assert_eq!(flow.total, dec!(130));
}

#[test]
fn test_account_movements_running_balance() {
    let entries = [
        rent_entry(at(2026, 1, 6), dec!(5)),
        payment_entry(at(2026, 1, 5), dec!(20)),
    ];
    let movements = account_movements(CASH, &entries);

    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].side, Side::Debit);
    assert_eq!(movements[0].running_balance, dec!(20));
    assert_eq!(movements[1].side, Side::Credit);
    assert_eq!(movements[1].running_balance, dec!(15));
}

#[test]
fn test_receivables_aging_buckets_by_entry_date() {
    let today = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
    let days_ago = |n: u64| {
        let day = today.checked_sub_days(Days::new(n)).unwrap();
        Utc.from_utc_datetime(&day.and_hms_opt(9, 0, 0).unwrap())
    };
    let entries = [
        payment_entry(days_ago(30), dec!(10)),
        payment_entry(days_ago(31), dec!(20)),
        payment_entry(days_ago(91), dec!(40)),
        rent_entry(days_ago(200), dec!(99)),
    ];
    let report = receivables_aging(today, &entries);

    assert_eq!(report.buckets.len(), 4);
    assert_eq!(report.bucket(AgingBucket::Current).unwrap().total, dec!(10));
    assert_eq!(report.bucket(AgingBucket::Days31To60).unwrap().total, dec!(20));
    assert_eq!(report.bucket(AgingBucket::Days61To90).unwrap().count, 0);
    assert_eq!(report.bucket(AgingBucket::Over90).unwrap().total, dec!(40));
    assert_eq!(report.total_receivable, dec!(70));
    assert_eq!(report.total_overdue, dec!(60));
}

// ========== Service ==========

fn draft(postings: Vec<Posting>) -> EntryDraft {
    EntryDraft {
        date: None,
        kind: EntryKind::Adjustment,
        description: "Owner contribution".to_string(),
        reference: Some("  ".to_string()),
        postings,
    }
}

#[tokio::test]
async fn test_post_rejects_unbalanced_entry() {
    let f = fixture();
    let result = f
        .services
        .journal
        .post_entry(
            &f.admin,
            draft(vec![Posting::debit(CASH, dec!(10)), Posting::credit("equity", dec!(9))]),
        )
        .await;

    assert!(matches!(result, Err(JournalError::Unbalanced { .. })));
}

#[tokio::test]
async fn test_post_rejects_blank_description() {
    let f = fixture();
    let mut input = draft(vec![Posting::debit(CASH, dec!(1)), Posting::credit("equity", dec!(1))]);
    input.description = "   ".to_string();

    let result = f.services.journal.post_entry(&f.admin, input).await;
    assert!(matches!(result, Err(JournalError::BlankDescription)));
}

#[tokio::test]
async fn test_pending_entries_stay_out_of_statements() {
    let f = fixture();
    let journal = &f.services.journal;
    let posted = journal
        .post_entry(
            &f.admin,
            draft(vec![Posting::debit(CASH, dec!(10)), Posting::credit("equity", dec!(10))]),
        )
        .await
        .unwrap();
    assert_eq!(posted.state, EntryState::Pending);
    assert_eq!(posted.total, dec!(10));
    assert!(posted.reference.is_none());

    let today = Utc::now().date_naive();
    assert_eq!(journal.balance_sheet(today).await.unwrap().balance_of(CASH), dec!(0));

    let confirmed = journal.confirm(&f.admin, posted.id).await.unwrap();
    assert_eq!(confirmed.state, EntryState::Confirmed);
    let again = journal.confirm(&f.admin, posted.id).await.unwrap();
    assert_eq!(again.confirmed_at, confirmed.confirmed_at);

    assert_eq!(journal.balance_sheet(today).await.unwrap().balance_of(CASH), dec!(10));
    let movements = journal.account_movements("equity", None, None).await.unwrap();
    assert_eq!(movements[0].running_balance, dec!(-10));
}

#[tokio::test]
async fn test_confirm_unknown_entry() {
    let f = fixture();
    let result = f.services.journal.confirm(&f.admin, JournalEntryId::new()).await;
    assert!(matches!(result, Err(JournalError::NotFound(_))));
}

#[tokio::test]
async fn test_statement_range_checked() {
    let f = fixture();
    let start = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();

    assert!(matches!(
        f.services.journal.income_statement(start, end).await,
        Err(JournalError::InvalidDateRange)
    ));
    assert!(matches!(
        f.services.journal.cash_flow(start, end).await,
        Err(JournalError::InvalidDateRange)
    ));
}
