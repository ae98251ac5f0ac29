//! Sponsorship and expense models. All amounts are integer cents.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sponsorship {
    pub id: String,
    pub startup_id: String,
    pub sponsor_id: String,
    pub amount: i64,
    pub note: String,
    pub created_at: String,
}

/// Sponsorship with sponsor details for list views
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SponsorshipWithSponsor {
    pub id: String,
    pub startup_id: String,
    pub sponsor_id: String,
    pub amount: i64,
    pub note: String,
    pub created_at: String,
    pub sponsor_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: String,
    pub startup_id: String,
    pub amount: i64,
    pub category: String,
    pub note: String,
    pub incurred_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSponsorshipRequest {
    pub amount: i64,
    #[serde(default)]
    pub note: String,
    /// Admins may record a sponsorship on behalf of a sponsor account
    pub sponsor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub amount: i64,
    pub category: String,
    #[serde(default)]
    pub note: String,
    pub incurred_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub amount: Option<i64>,
    pub category: Option<String>,
    pub note: Option<String>,
    pub incurred_at: Option<String>,
}

/// Financial position of a startup, recomputed from rows on every read
#[derive(Debug, Clone, Serialize)]
pub struct FinancialSummary {
    pub total_sponsored: i64,
    pub total_expenses: i64,
    /// total_sponsored - total_expenses
    pub balance: i64,
}

impl FinancialSummary {
    pub fn new(total_sponsored: i64, total_expenses: i64) -> Self {
        Self {
            total_sponsored,
            total_expenses,
            balance: total_sponsored - total_expenses,
        }
    }

    pub fn from_rows(sponsorships: &[SponsorshipWithSponsor], expenses: &[Expense]) -> Self {
        let total_sponsored = sponsorships.iter().map(|s| s.amount).sum();
        let total_expenses = expenses.iter().map(|e| e.amount).sum();
        Self::new(total_sponsored, total_expenses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sponsorship(id: &str, amount: i64) -> SponsorshipWithSponsor {
        SponsorshipWithSponsor {
            id: id.into(),
            startup_id: "s".into(),
            sponsor_id: "u".into(),
            amount,
            note: String::new(),
            created_at: String::new(),
            sponsor_name: "Sponsor".into(),
        }
    }

    fn expense(id: &str, amount: i64) -> Expense {
        Expense {
            id: id.into(),
            startup_id: "s".into(),
            amount,
            category: "ops".into(),
            note: String::new(),
            incurred_at: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_balance_is_sponsorships_minus_expenses() {
        let summary = FinancialSummary::from_rows(
            &[sponsorship("a", 500_000), sponsorship("b", 250_000)],
            &[expense("c", 100_000), expense("d", 50_000)],
        );
        assert_eq!(summary.total_sponsored, 750_000);
        assert_eq!(summary.total_expenses, 150_000);
        assert_eq!(summary.balance, 600_000);
    }

    #[test]
    fn test_balance_recomputes_after_single_mutation() {
        let mut sponsorships = vec![sponsorship("a", 300_000)];
        let mut expenses = vec![expense("b", 120_000)];
        assert_eq!(
            FinancialSummary::from_rows(&sponsorships, &expenses).balance,
            180_000
        );

        // add a sponsorship
        sponsorships.push(sponsorship("c", 100_000));
        assert_eq!(
            FinancialSummary::from_rows(&sponsorships, &expenses).balance,
            280_000
        );

        // delete the expense
        expenses.clear();
        assert_eq!(
            FinancialSummary::from_rows(&sponsorships, &expenses).balance,
            400_000
        );
    }

    #[test]
    fn test_balance_can_go_negative() {
        let summary = FinancialSummary::from_rows(&[], &[expense("e", 10_000)]);
        assert_eq!(summary.balance, -10_000);
    }

    #[test]
    fn test_empty_rows() {
        let summary = FinancialSummary::from_rows(&[], &[]);
        assert_eq!(summary.total_sponsored, 0);
        assert_eq!(summary.total_expenses, 0);
        assert_eq!(summary.balance, 0);
    }
}
