use serde::Serialize;

use crate::models::{Expense, Partner, PerPartner, Settlement, CENT_EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OwingDirection {
    AOwesB,
    BOwesA,
    Balanced,
}

impl OwingDirection {
    /// Direction implied by a signed "A overpaid by" amount.
    pub fn from_signed(net_signed: f64) -> Self {
        if net_signed.abs() < CENT_EPSILON {
            OwingDirection::Balanced
        } else if net_signed > 0.0 {
            OwingDirection::BOwesA
        } else {
            OwingDirection::AOwesB
        }
    }

    /// The partner who owes, if anyone.
    pub fn debtor(self) -> Option<Partner> {
        match self {
            OwingDirection::AOwesB => Some(Partner::A),
            OwingDirection::BOwesA => Some(Partner::B),
            OwingDirection::Balanced => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceState {
    pub total_by_partner: PerPartner,
    pub combined_total: f64,
    pub fair_share: f64,
    /// `paid_a - fair_share`; positive means B owes A.
    pub net_signed: f64,
    pub net_balance: f64,
    pub direction: OwingDirection,
    /// Settlement totals keyed by payer.
    pub settlements_out: PerPartner,
    /// Settlement totals keyed by recipient.
    pub settlements_in: PerPartner,
    /// `net_signed` after netting recorded settlements. Reported alongside the
    /// headline numbers, which never include settlements.
    pub settled_net_signed: f64,
}

impl BalanceState {
    pub fn settled_direction(&self) -> OwingDirection {
        OwingDirection::from_signed(self.settled_net_signed)
    }
}

/// Headline balance under a 50/50 split. Expenses whose payer is neither
/// partner are left out of both partitions.
pub fn compute_balance(expenses: &[Expense]) -> BalanceState {
    let mut totals = PerPartner::default();
    for expense in expenses {
        if let Some(partner) = expense.paid_by {
            totals.add(partner, expense.amount);
        }
    }

    let combined_total = totals.sum();
    let fair_share = combined_total / 2.0;
    let net_signed = totals.a - fair_share;

    BalanceState {
        total_by_partner: totals,
        combined_total,
        fair_share,
        net_signed,
        net_balance: net_signed.abs(),
        direction: OwingDirection::from_signed(net_signed),
        settlements_out: PerPartner::default(),
        settlements_in: PerPartner::default(),
        settled_net_signed: net_signed,
    }
}

/// Same headline as [`compute_balance`], plus settlement running totals.
pub fn compute_balance_with_settlements(expenses: &[Expense], settlements: &[Settlement]) -> BalanceState {
    let mut state = compute_balance(expenses);
    for s in settlements {
        state.settlements_out.add(s.paid_by, s.amount);
        state.settlements_in.add(s.paid_to, s.amount);
    }
    // A paying B deepens what B owes A; B paying A reduces it.
    let a_to_b = state.settlements_out.get(Partner::A);
    let b_to_a = state.settlements_out.get(Partner::B);
    state.settled_net_signed = state.net_signed + a_to_b - b_to_a;
    state
}
