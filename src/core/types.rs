use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A one-off expense charged in full in a single simulated month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FutureExpense {
    pub month: u32,
    pub amount: f64,
}

/// A wealth threshold tracked for its first month of achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub name: String,
    pub amount: f64,
}

/// Rates are annual percentages: `12.0` means 12% per year.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParameters {
    pub initial_wealth: f64,
    pub monthly_income: f64,
    pub monthly_expense: f64,
    pub salary_increase_rate: f64,
    pub investment_return_rate: f64,
    pub inflation_rate: f64,
    pub time_horizon_years: i32,
    pub future_expenses: Vec<FutureExpense>,
    pub goals: Vec<Goal>,
}

impl SimulationParameters {
    /// Number of simulated months; zero for a non-positive horizon.
    pub fn horizon_months(&self) -> u32 {
        (self.time_horizon_years.max(0) as u32).saturating_mul(12)
    }

    pub fn future_expense_in_month(&self, month: u32) -> f64 {
        self.future_expenses
            .iter()
            .filter(|expense| expense.month == month)
            .map(|expense| expense.amount)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProjection {
    pub month: u32,
    pub year: u32,
    pub date: NaiveDate,
    pub income: f64,
    pub expenses: f64,
    pub savings: f64,
    pub investment_gains: f64,
    pub wealth: f64,
    pub real_wealth: f64,
    pub savings_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProjection {
    pub name: String,
    pub target_amount: f64,
    pub reached_month: Option<u32>,
    pub reached_date: Option<NaiveDate>,
}

impl GoalProjection {
    pub(crate) fn pending(goal: &Goal) -> Self {
        Self {
            name: goal.name.clone(),
            target_amount: goal.amount,
            reached_month: None,
            reached_date: None,
        }
    }

    pub fn is_reached(&self) -> bool {
        self.reached_month.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub projections: Vec<MonthlyProjection>,
    pub goal_projections: Vec<GoalProjection>,
    pub break_even_month: Option<u32>,
    pub break_even_date: Option<NaiveDate>,
    pub recommended_savings_rate: f64,
    pub final_wealth: f64,
    pub final_real_wealth: f64,
    pub total_saved: f64,
    pub total_investment_gains: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearSummary {
    pub year: u32,
    pub months: u32,
    pub income: f64,
    pub expenses: f64,
    pub savings: f64,
    pub investment_gains: f64,
    pub end_wealth: f64,
    pub end_real_wealth: f64,
}
