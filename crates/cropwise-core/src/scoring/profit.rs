use crate::crops::schema::CropTable;
use crate::scoring::outcome::{CostBreakdown, ProfitBreakdown, ProfitResult};
use crate::scoring::round_dp;

/// Revenue, cost and risk-adjusted profit per hectare.
#[derive(Debug, Clone, Copy)]
pub struct ProfitCalculator<'a> {
    table: &'a CropTable,
}

impl<'a> ProfitCalculator<'a> {
    pub fn new(table: &'a CropTable) -> Self {
        ProfitCalculator { table }
    }

    /// Estimate profit for `crop` at `expected_yield` kg/ha.
    ///
    /// `yield_multiplier` scales the yield for current conditions;
    /// `risk_adjustment` scales how much of the crop's risk factor is
    /// deducted from gross profit. Unknown crops use default economics.
    pub fn calculate(
        &self,
        crop: &str,
        expected_yield: f64,
        yield_multiplier: f64,
        risk_adjustment: f64,
    ) -> ProfitResult {
        let econ = self.table.economics_for(crop);

        let adjusted_yield = expected_yield * yield_multiplier;
        let revenue = adjusted_yield * econ.market_price;
        let total_costs = econ.total_costs();
        let gross_profit = revenue - total_costs;
        let risk_adjusted_profit = gross_profit * (1.0 - econ.risk_factor * risk_adjustment);

        let profit_margin_pct = if revenue > 0.0 {
            risk_adjusted_profit / revenue * 100.0
        } else {
            0.0
        };
        let roi = if total_costs > 0.0 {
            risk_adjusted_profit / total_costs * 100.0
        } else {
            0.0
        };

        ProfitResult {
            crop_name: crop.to_string(),
            expected_yield: round_dp(adjusted_yield, 2),
            market_price_per_kg: econ.market_price,
            revenue: round_dp(revenue, 2),
            input_costs: econ.input_cost,
            labor_costs: econ.labor_cost,
            total_costs,
            gross_profit: round_dp(gross_profit, 2),
            risk_factor: econ.risk_factor,
            risk_factor_percentage: round_dp(econ.risk_factor * 100.0, 1),
            risk_adjusted_profit: round_dp(risk_adjusted_profit, 2),
            profit_margin_percentage: round_dp(profit_margin_pct, 2),
            roi: round_dp(roi, 2),
            breakdown: ProfitBreakdown {
                revenue: round_dp(revenue, 2),
                costs: CostBreakdown {
                    inputs: econ.input_cost,
                    labor: econ.labor_cost,
                    total: total_costs,
                },
                profit: round_dp(risk_adjusted_profit, 2),
            },
        }
    }

    /// `calculate` with no yield scaling and the crop's full risk factor.
    pub fn calculate_default(&self, crop: &str, expected_yield: f64) -> ProfitResult {
        self.calculate(crop, expected_yield, 1.0, 1.0)
    }
}
