use super::allocation::{ALLOCATION_TOLERANCE, safe_savings, stock_total};
use super::error::AllocationError;
use super::returns::ReturnTable;
use super::types::{AllocationProposal, FinancialProfile, Portfolio, PredictedReturns, StockAllocations};

/// An accepted reallocation, ready to be persisted by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    pub stock_allocations: StockAllocations,
    pub gold_allocation: f64,
    pub savings_allocation: f64,
    pub new_total_value: f64,
    pub unallocated_amount: f64,
    pub predicted_returns: PredictedReturns,
}

impl Adjustment {
    /// A remainder above the tolerance stays unassigned; it is reported, not swept.
    pub fn has_unallocated_remainder(&self) -> bool {
        self.unallocated_amount > ALLOCATION_TOLERANCE
    }

    pub fn apply_to(&self, portfolio: &Portfolio) -> Portfolio {
        Portfolio {
            allocations: self.stock_allocations.clone(),
            gold_allocation: self.gold_allocation,
            savings_allocation: self.savings_allocation,
            ..portfolio.clone()
        }
    }
}

fn check_amount(key: &str, value: f64) -> Result<(), AllocationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AllocationError::InvalidAllocation {
            key: key.to_string(),
            value,
        })
    }
}

/// Checks, in order: non-negative amounts, the safe savings floor, then the
/// investment ceiling. Nothing is mutated on failure.
pub fn validate_adjustment(
    profile: &FinancialProfile,
    proposal: &AllocationProposal,
    proposed_savings: f64,
    returns: &ReturnTable,
) -> Result<Adjustment, AllocationError> {
    for (key, value) in &proposal.stock_allocations {
        check_amount(key, *value)?;
    }
    check_amount(AllocationProposal::GOLD_KEY, proposal.gold_allocation)?;
    check_amount("savings", proposed_savings)?;

    let investment = profile.initial_investment_amount;
    let floor = safe_savings(investment, profile.savings_threshold);
    if proposed_savings < floor {
        return Err(AllocationError::BelowSafeSavingsFloor {
            proposed: proposed_savings,
            floor,
        });
    }

    let total =
        stock_total(&proposal.stock_allocations) + proposal.gold_allocation + proposed_savings;
    if total > investment + ALLOCATION_TOLERANCE {
        return Err(AllocationError::OverAllocated { total, investment });
    }

    Ok(Adjustment {
        stock_allocations: proposal.stock_allocations.clone(),
        gold_allocation: proposal.gold_allocation,
        savings_allocation: proposed_savings,
        new_total_value: total,
        unallocated_amount: investment - total,
        predicted_returns: returns.predicted_returns(
            &proposal.stock_allocations,
            profile.annual_savings_interest_rate,
        ),
    })
}
