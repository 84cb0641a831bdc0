use super::allocation::{ALLOCATION_TOLERANCE, safe_savings};
use super::error::ProfileError;
use super::types::{FinancialProfile, Portfolio, SUPPORTED_COUNTRY, SavingsThreshold};

pub const MIN_INVESTMENT: f64 = 1_000.0;

fn require_finite(field: &'static str, value: f64) -> Result<(), ProfileError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProfileError::invalid(field, "must be a finite number"))
    }
}

pub fn validate_profile(profile: &FinancialProfile) -> Result<(), ProfileError> {
    let name_len = profile.full_name.trim().chars().count();
    if !(2..=100).contains(&name_len) {
        return Err(ProfileError::invalid(
            "fullName",
            "must be between 2 and 100 characters",
        ));
    }

    let location = &profile.location;
    if location.state.trim().is_empty() {
        return Err(ProfileError::invalid("location.state", "state is required"));
    }
    if location.city.trim().is_empty() {
        return Err(ProfileError::invalid("location.city", "city is required"));
    }
    if let Some(coordinates) = location.coordinates {
        if !(-90.0..=90.0).contains(&coordinates.lat) {
            return Err(ProfileError::invalid(
                "location.coordinates.lat",
                "must be between -90 and 90",
            ));
        }
        if !(-180.0..=180.0).contains(&coordinates.lng) {
            return Err(ProfileError::invalid(
                "location.coordinates.lng",
                "must be between -180 and 180",
            ));
        }
    }
    if location.country != SUPPORTED_COUNTRY {
        return Err(ProfileError::UnsupportedCountry);
    }

    let investment = profile.initial_investment_amount;
    require_finite("initialInvestmentAmount", investment)?;
    if investment < MIN_INVESTMENT {
        return Err(ProfileError::invalid(
            "initialInvestmentAmount",
            "minimum investment is 1000",
        ));
    }

    let threshold_value = profile.savings_threshold.value();
    require_finite("savingsThreshold.value", threshold_value)?;
    if threshold_value < 0.0 {
        return Err(ProfileError::invalid("savingsThreshold.value", "must be >= 0"));
    }
    match profile.savings_threshold {
        SavingsThreshold::Percentage { value } if value > 100.0 => {
            return Err(ProfileError::invalid(
                "savingsThreshold.value",
                "percentage must be between 0 and 100",
            ));
        }
        SavingsThreshold::Fixed { value } if value > investment => {
            return Err(ProfileError::invalid(
                "savingsThreshold.value",
                "fixed safe savings cannot exceed the investment amount",
            ));
        }
        _ => {}
    }

    let rate = profile.annual_savings_interest_rate;
    require_finite("annualSavingsInterestRate", rate)?;
    if !(0.0..=100.0).contains(&rate) {
        return Err(ProfileError::invalid(
            "annualSavingsInterestRate",
            "must be between 0 and 100",
        ));
    }

    Ok(())
}

/// Must run against the stored profile and portfolio before either is changed.
pub fn check_investment_change(
    current: &FinancialProfile,
    portfolio: Option<&Portfolio>,
    new_investment: f64,
) -> Result<(), ProfileError> {
    let Some(portfolio) = portfolio else {
        return Ok(());
    };

    let unallocated = portfolio.unallocated_amount(current.initial_investment_amount);
    let reduction = current.initial_investment_amount - new_investment;
    if reduction > 0.0 && reduction > unallocated {
        return Err(ProfileError::InvestmentReductionExceedsUnallocated {
            reduction,
            unallocated,
        });
    }
    Ok(())
}

/// Savings allocation that satisfies `profile`'s floor, topping up from the
/// unallocated amount when needed. Returns `None` when nothing changes.
pub fn reconcile_savings_floor(
    portfolio: &Portfolio,
    profile: &FinancialProfile,
) -> Result<Option<f64>, ProfileError> {
    if !portfolio.onboarding_complete {
        return Ok(None);
    }

    let floor = safe_savings(profile.initial_investment_amount, profile.savings_threshold);
    let shortfall = floor - portfolio.savings_allocation;
    if shortfall <= 0.0 {
        return Ok(None);
    }

    let unallocated = portfolio.unallocated_amount(profile.initial_investment_amount);
    if shortfall > unallocated + ALLOCATION_TOLERANCE {
        return Err(ProfileError::SafeSavingsUnreachable {
            floor,
            available: portfolio.savings_allocation + unallocated.max(0.0),
        });
    }

    Ok(Some(floor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Coordinates, Location};

    fn sample_profile() -> FinancialProfile {
        FinancialProfile {
            full_name: "Asha Rao".to_string(),
            location: Location {
                state: "Karnataka".to_string(),
                city: "Bengaluru".to_string(),
                coordinates: Some(Coordinates {
                    lat: 12.97,
                    lng: 77.59,
                }),
                country: "India".to_string(),
            },
            initial_investment_amount: 100_000.0,
            savings_threshold: SavingsThreshold::Percentage { value: 20.0 },
            annual_savings_interest_rate: 6.5,
        }
    }

    fn active_portfolio(stock: f64, gold: f64, savings: f64) -> Portfolio {
        Portfolio {
            selected_stock_ids: vec!["A".to_string()],
            allocations: [("A".to_string(), stock)].into(),
            gold_allocation: gold,
            savings_allocation: savings,
            onboarding_complete: true,
        }
    }

    #[test]
    fn accepts_sample_profile() {
        validate_profile(&sample_profile()).expect("sample profile is valid");
    }

    #[test]
    fn rejects_foreign_country() {
        let mut profile = sample_profile();
        profile.location.country = "Nepal".to_string();
        assert_eq!(
            validate_profile(&profile),
            Err(ProfileError::UnsupportedCountry)
        );
    }

    #[test]
    fn rejects_small_investment() {
        let mut profile = sample_profile();
        profile.initial_investment_amount = 999.0;
        let err = validate_profile(&profile).expect_err("must reject investment below minimum");
        assert!(err.to_string().contains("initialInvestmentAmount"));
    }

    #[test]
    fn rejects_percentage_above_hundred() {
        let mut profile = sample_profile();
        profile.savings_threshold = SavingsThreshold::Percentage { value: 120.0 };
        let err = validate_profile(&profile).expect_err("must reject percentage > 100");
        assert!(err.to_string().contains("savingsThreshold"));
    }

    #[test]
    fn rejects_fixed_threshold_above_investment() {
        let mut profile = sample_profile();
        profile.savings_threshold = SavingsThreshold::Fixed { value: 150_000.0 };
        assert!(validate_profile(&profile).is_err());
    }

    #[test]
    fn rejects_out_of_range_coordinates_and_rate() {
        let mut profile = sample_profile();
        profile.location.coordinates = Some(Coordinates { lat: 91.0, lng: 0.0 });
        assert!(validate_profile(&profile).is_err());

        let mut profile = sample_profile();
        profile.annual_savings_interest_rate = 101.0;
        let err = validate_profile(&profile).expect_err("must reject rate > 100");
        assert!(err.to_string().contains("annualSavingsInterestRate"));
    }

    #[test]
    fn rejects_short_name() {
        let mut profile = sample_profile();
        profile.full_name = " A ".to_string();
        assert!(validate_profile(&profile).is_err());
    }

    #[test]
    fn reduction_within_unallocated_is_allowed() {
        let portfolio = active_portfolio(40_000.0, 10_000.0, 20_000.0);
        check_investment_change(&sample_profile(), Some(&portfolio), 70_000.0)
            .expect("reduction equal to unallocated amount is allowed");
    }

    #[test]
    fn reduction_beyond_unallocated_is_rejected() {
        let portfolio = active_portfolio(40_000.0, 10_000.0, 20_000.0);
        let err = check_investment_change(&sample_profile(), Some(&portfolio), 60_000.0)
            .expect_err("reduction beyond unallocated must be rejected");
        assert_eq!(
            err,
            ProfileError::InvestmentReductionExceedsUnallocated {
                reduction: 40_000.0,
                unallocated: 30_000.0
            }
        );
    }

    #[test]
    fn increase_and_missing_portfolio_are_always_allowed() {
        let portfolio = active_portfolio(80_000.0, 0.0, 20_000.0);
        check_investment_change(&sample_profile(), Some(&portfolio), 150_000.0)
            .expect("increase is allowed");
        check_investment_change(&sample_profile(), None, 1_000.0)
            .expect("no portfolio means nothing to protect");
    }

    #[test]
    fn raised_floor_is_topped_up_from_unallocated() {
        let portfolio = active_portfolio(40_000.0, 10_000.0, 20_000.0);
        let mut profile = sample_profile();
        profile.savings_threshold = SavingsThreshold::Percentage { value: 30.0 };
        assert_eq!(
            reconcile_savings_floor(&portfolio, &profile),
            Ok(Some(30_000.0))
        );
    }

    #[test]
    fn unreachable_floor_is_rejected() {
        let portfolio = active_portfolio(70_000.0, 10_000.0, 20_000.0);
        let mut profile = sample_profile();
        profile.savings_threshold = SavingsThreshold::Percentage { value: 30.0 };
        let err = reconcile_savings_floor(&portfolio, &profile)
            .expect_err("no unallocated money to cover the floor");
        assert!(matches!(err, ProfileError::SafeSavingsUnreachable { .. }));
    }

    #[test]
    fn floor_already_met_needs_no_change() {
        let portfolio = active_portfolio(40_000.0, 10_000.0, 20_000.0);
        assert_eq!(reconcile_savings_floor(&portfolio, &sample_profile()), Ok(None));
        assert_eq!(
            reconcile_savings_floor(&Portfolio::default(), &sample_profile()),
            Ok(None)
        );
    }
}
