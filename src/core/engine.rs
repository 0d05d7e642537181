use chrono::{Months, NaiveDate};

use super::clock::Clock;
use super::types::{
    GoalProjection, MonthlyProjection, SimulationParameters, SimulationResult, YearSummary,
};

const EMERGENCY_FUND_MONTHS: f64 = 6.0;
const UNDERFUNDED_SAVINGS_NUDGE: f64 = 10.0;
const MIN_RECOMMENDED_SAVINGS_RATE: f64 = 10.0;
const MAX_RECOMMENDED_SAVINGS_RATE: f64 = 50.0;

#[derive(Debug, Clone, Copy)]
struct MonthlyRates {
    salary: f64,
    investment: f64,
    inflation: f64,
}

impl MonthlyRates {
    fn from_params(params: &SimulationParameters) -> Self {
        Self {
            salary: monthly_rate(params.salary_increase_rate),
            investment: monthly_rate(params.investment_return_rate),
            inflation: monthly_rate(params.inflation_rate),
        }
    }
}

#[derive(Debug)]
struct RunningState {
    wealth: f64,
    income: f64,
    expense: f64,
    cumulative_inflation: f64,
    total_saved: f64,
    total_investment_gains: f64,
}

impl RunningState {
    fn new(params: &SimulationParameters) -> Self {
        Self {
            wealth: params.initial_wealth,
            income: params.monthly_income,
            expense: params.monthly_expense,
            cumulative_inflation: 1.0,
            total_saved: 0.0,
            total_investment_gains: 0.0,
        }
    }

    fn advance(
        &mut self,
        params: &SimulationParameters,
        rates: MonthlyRates,
        month: u32,
        start_date: NaiveDate,
    ) -> MonthlyProjection {
        self.income *= 1.0 + rates.salary;
        self.expense *= 1.0 + rates.inflation;
        self.cumulative_inflation *= 1.0 + rates.inflation;

        let expenses = self.expense + params.future_expense_in_month(month);
        let savings = self.income - expenses;
        self.total_saved += savings.max(0.0);

        // Return is earned on the balance entering the month.
        let investment_gains = self.wealth * rates.investment;
        self.total_investment_gains += investment_gains;
        self.wealth += investment_gains + savings;

        let savings_rate = if self.income > 0.0 {
            savings / self.income * 100.0
        } else {
            0.0
        };

        MonthlyProjection {
            month,
            year: month.div_ceil(12),
            date: month_date(start_date, month),
            income: self.income,
            expenses,
            savings,
            investment_gains,
            wealth: self.wealth,
            real_wealth: self.wealth / self.cumulative_inflation,
            savings_rate,
        }
    }
}

/// Converts an annual percentage into the monthly rate that compounds to it
/// over twelve months.
pub fn monthly_rate(annual_rate_pct: f64) -> f64 {
    (1.0 + annual_rate_pct / 100.0).powf(1.0 / 12.0) - 1.0
}

pub fn run_simulation<C: Clock + ?Sized>(
    params: &SimulationParameters,
    clock: &C,
) -> SimulationResult {
    run_simulation_from(params, clock.today())
}

/// Runs the month-by-month forecast with calendar dates offset from
/// `start_date`. Never fails; degenerate input yields degenerate output.
pub fn run_simulation_from(
    params: &SimulationParameters,
    start_date: NaiveDate,
) -> SimulationResult {
    let rates = MonthlyRates::from_params(params);
    let total_months = params.horizon_months();

    let mut state = RunningState::new(params);
    let mut projections = Vec::with_capacity(total_months as usize);
    let mut goal_projections: Vec<GoalProjection> =
        params.goals.iter().map(GoalProjection::pending).collect();
    let mut break_even: Option<(u32, NaiveDate)> = None;

    for month in 1..=total_months {
        let projection = state.advance(params, rates, month, start_date);

        if break_even.is_none() && projection.savings < 0.0 {
            break_even = Some((month, projection.date));
        }
        mark_reached_goals(&mut goal_projections, &projection);

        projections.push(projection);
    }

    let final_monthly_expense = projections
        .last()
        .map(|p| p.expenses)
        .unwrap_or(params.monthly_expense);
    let recommended_savings_rate =
        recommended_savings_rate(params, final_monthly_expense, state.wealth);
    let (final_wealth, final_real_wealth) = projections
        .last()
        .map(|p| (p.wealth, p.real_wealth))
        .unwrap_or((0.0, 0.0));

    log::debug!(
        "simulated {total_months} months: final wealth {final_wealth:.2}, break-even {:?}",
        break_even.map(|(month, _)| month)
    );

    SimulationResult {
        projections,
        goal_projections,
        break_even_month: break_even.map(|(month, _)| month),
        break_even_date: break_even.map(|(_, date)| date),
        recommended_savings_rate,
        final_wealth,
        final_real_wealth,
        total_saved: state.total_saved,
        total_investment_gains: state.total_investment_gains,
    }
}

/// Folds monthly projections into one row per simulated year.
pub fn summarize_years(projections: &[MonthlyProjection]) -> Vec<YearSummary> {
    let mut years: Vec<YearSummary> = Vec::new();
    for projection in projections {
        let needs_new_year = years
            .last()
            .is_none_or(|summary| summary.year != projection.year);
        if needs_new_year {
            years.push(YearSummary {
                year: projection.year,
                months: 0,
                income: 0.0,
                expenses: 0.0,
                savings: 0.0,
                investment_gains: 0.0,
                end_wealth: 0.0,
                end_real_wealth: 0.0,
            });
        }
        let Some(summary) = years.last_mut() else {
            continue;
        };
        summary.months += 1;
        summary.income += projection.income;
        summary.expenses += projection.expenses;
        summary.savings += projection.savings;
        summary.investment_gains += projection.investment_gains;
        summary.end_wealth = projection.wealth;
        summary.end_real_wealth = projection.real_wealth;
    }
    years
}

// Offsets from the anchor each time, so Jan 31 gives Feb 29 then Mar 31.
fn month_date(start_date: NaiveDate, month: u32) -> NaiveDate {
    start_date
        .checked_add_months(Months::new(month))
        .unwrap_or(NaiveDate::MAX)
}

fn mark_reached_goals(goals: &mut [GoalProjection], projection: &MonthlyProjection) {
    for goal in goals.iter_mut().filter(|goal| !goal.is_reached()) {
        if projection.wealth >= goal.target_amount {
            goal.reached_month = Some(projection.month);
            goal.reached_date = Some(projection.date);
        }
    }
}

fn recommended_savings_rate(
    params: &SimulationParameters,
    final_monthly_expense: f64,
    final_wealth: f64,
) -> f64 {
    let target_emergency_fund = final_monthly_expense * EMERGENCY_FUND_MONTHS;
    let current_savings_rate = if params.monthly_income > 0.0 {
        (params.monthly_income - params.monthly_expense) / params.monthly_income * 100.0
    } else {
        0.0
    };
    let recommended = if final_wealth < target_emergency_fund {
        current_savings_rate + UNDERFUNDED_SAVINGS_NUDGE
    } else {
        current_savings_rate
    };
    recommended
        .max(MIN_RECOMMENDED_SAVINGS_RATE)
        .min(MAX_RECOMMENDED_SAVINGS_RATE)
}
