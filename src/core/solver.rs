use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use super::engine::run_simulation_from;
use super::types::SimulationParameters;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalType {
    /// Smallest extra monthly income that reaches the goal in time.
    RequiredSavings,
    /// Largest baseline monthly expense that still reaches the goal in time.
    MaxExpense,
}

#[derive(Debug, Clone, Copy)]
pub struct GoalSolveConfig {
    pub goal_type: GoalType,
    pub goal_amount: f64,
    pub target_month: u32,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub reached: bool,
    pub reached_month: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSolveResult {
    pub goal_type: GoalType,
    pub goal_amount: f64,
    pub target_month: u32,
    pub target_date: NaiveDate,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub solved_value: Option<f64>,
    pub reached_month: Option<u32>,
    pub reached_date: Option<NaiveDate>,
    pub iterations: Vec<GoalSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("goal amount must be > 0")]
    GoalAmount,
    #[error("target month must be between 1 and the {horizon_months}-month horizon, got {target_month}")]
    TargetMonth { target_month: u32, horizon_months: u32 },
    #[error("search bounds must be finite")]
    NonFiniteBounds,
    #[error("search max must be greater than search min")]
    EmptySearchRange,
    #[error("search min must be >= 0")]
    NegativeSearchMin,
    #[error("tolerance must be > 0")]
    Tolerance,
    #[error("max iterations must be > 0")]
    MaxIterations,
}

#[derive(Debug, Clone, Copy)]
struct CandidateEval {
    reached_month: Option<u32>,
    reached_date: Option<NaiveDate>,
}

impl CandidateEval {
    fn reached(self) -> bool {
        self.reached_month.is_some()
    }
}

pub fn solve_goal(
    params: &SimulationParameters,
    config: GoalSolveConfig,
    start_date: NaiveDate,
) -> Result<GoalSolveResult, SolveError> {
    validate_config(params, config)?;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_eval = evaluate_candidate(params, config, config.search_min, start_date);
    let high_eval = evaluate_candidate(params, config, config.search_max, start_date);

    let mut solved_value = None;
    let mut converged = false;
    let feasible;
    let message;

    match config.goal_type {
        GoalType::RequiredSavings => {
            if low_eval.reached() {
                solved_value = Some(config.search_min);
                converged = true;
                feasible = true;
                message = "Goal is already reached at the lower savings bound.".to_string();
            } else if !high_eval.reached() {
                feasible = false;
                message = "No extra savings within the search bounds reaches the goal in time."
                    .to_string();
            } else {
                let mut lo = config.search_min;
                let mut hi = config.search_max;
                let mut it = 0;
                while it < config.max_iterations {
                    it += 1;
                    let mid = (lo + hi) * 0.5;
                    let eval = evaluate_candidate(params, config, mid, start_date);
                    iterations.push(iteration_row(it, lo, hi, mid, eval));

                    if eval.reached() {
                        hi = mid;
                    } else {
                        lo = mid;
                    }

                    if (hi - lo).abs() <= config.tolerance {
                        converged = true;
                        break;
                    }
                }
                solved_value = Some(hi);
                feasible = true;
                message = if converged {
                    "Solved required extra monthly savings.".to_string()
                } else {
                    "Reached max iterations before tolerance was met; returning best estimate."
                        .to_string()
                };
            }
        }
        GoalType::MaxExpense => {
            if !low_eval.reached() {
                feasible = false;
                message = "Goal is not reached in time even at the lower expense bound.".to_string();
            } else if high_eval.reached() {
                solved_value = Some(config.search_max);
                converged = true;
                feasible = true;
                message = "Upper expense bound still reaches the goal; increase search max."
                    .to_string();
            } else {
                let mut lo = config.search_min;
                let mut hi = config.search_max;
                let mut it = 0;
                while it < config.max_iterations {
                    it += 1;
                    let mid = (lo + hi) * 0.5;
                    let eval = evaluate_candidate(params, config, mid, start_date);
                    iterations.push(iteration_row(it, lo, hi, mid, eval));

                    if eval.reached() {
                        lo = mid;
                    } else {
                        hi = mid;
                    }

                    if (hi - lo).abs() <= config.tolerance {
                        converged = true;
                        break;
                    }
                }
                solved_value = Some(lo);
                feasible = true;
                message = if converged {
                    "Solved maximum monthly expense.".to_string()
                } else {
                    "Reached max iterations before tolerance was met; returning best estimate."
                        .to_string()
                };
            }
        }
    }

    let final_eval =
        solved_value.map(|value| evaluate_candidate(params, config, value, start_date));
    log::debug!(
        "{:?} solve for {:.2} by month {}: feasible={feasible}, value={solved_value:?}, {} iterations",
        config.goal_type,
        config.goal_amount,
        config.target_month,
        iterations.len()
    );

    Ok(GoalSolveResult {
        goal_type: config.goal_type,
        goal_amount: config.goal_amount,
        target_month: config.target_month,
        target_date: start_date
            .checked_add_months(chrono::Months::new(config.target_month))
            .unwrap_or(NaiveDate::MAX),
        search_min: config.search_min,
        search_max: config.search_max,
        tolerance: config.tolerance,
        max_iterations: config.max_iterations,
        solved_value,
        reached_month: final_eval.and_then(|eval| eval.reached_month),
        reached_date: final_eval.and_then(|eval| eval.reached_date),
        iterations,
        converged,
        feasible,
        message,
    })
}

fn iteration_row(
    iteration: u32,
    lower_bound: f64,
    upper_bound: f64,
    candidate_value: f64,
    eval: CandidateEval,
) -> GoalSolveIteration {
    log::trace!(
        "iteration {iteration}: [{lower_bound:.4}, {upper_bound:.4}] candidate {candidate_value:.4} reached {:?}",
        eval.reached_month
    );
    GoalSolveIteration {
        iteration,
        lower_bound,
        upper_bound,
        candidate_value,
        reached: eval.reached(),
        reached_month: eval.reached_month,
    }
}

fn evaluate_candidate(
    base_params: &SimulationParameters,
    config: GoalSolveConfig,
    candidate_value: f64,
    start_date: NaiveDate,
) -> CandidateEval {
    let mut params = base_params.clone();
    // Only wealth matters here; the caller's goals would just add bookkeeping.
    params.goals.clear();

    match config.goal_type {
        GoalType::RequiredSavings => {
            params.monthly_income = base_params.monthly_income + candidate_value.max(0.0);
        }
        GoalType::MaxExpense => {
            params.monthly_expense = candidate_value.max(0.0);
        }
    }

    let result = run_simulation_from(&params, start_date);
    result
        .projections
        .iter()
        .take(config.target_month as usize)
        .find(|projection| projection.wealth >= config.goal_amount)
        .map(|projection| CandidateEval {
            reached_month: Some(projection.month),
            reached_date: Some(projection.date),
        })
        .unwrap_or(CandidateEval {
            reached_month: None,
            reached_date: None,
        })
}

fn validate_config(params: &SimulationParameters, config: GoalSolveConfig) -> Result<(), SolveError> {
    if !config.goal_amount.is_finite() || config.goal_amount <= 0.0 {
        return Err(SolveError::GoalAmount);
    }
    let horizon_months = params.horizon_months();
    if config.target_month == 0 || config.target_month > horizon_months {
        return Err(SolveError::TargetMonth {
            target_month: config.target_month,
            horizon_months,
        });
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(SolveError::NonFiniteBounds);
    }
    if config.search_min < 0.0 {
        return Err(SolveError::NegativeSearchMin);
    }
    if config.search_max <= config.search_min {
        return Err(SolveError::EmptySearchRange);
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SolveError::Tolerance);
    }
    if config.max_iterations == 0 {
        return Err(SolveError::MaxIterations);
    }
    Ok(())
}
