use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    Clock, FixedClock, FutureExpense, Goal, GoalSolveConfig, GoalSolveResult, GoalType,
    SimulationParameters, SimulationResult, SolveError, SystemClock, YearSummary,
    run_simulation_from, solve_goal, summarize_years,
};

const MAX_HORIZON_YEARS: i32 = 100;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("--time-horizon-years must be between 1 and 100, got {0}")]
    TimeHorizon(i32),
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must be >= 0")]
    Negative { field: &'static str },
    #[error("{field} must be > -100")]
    RateBelowFloor { field: &'static str },
    #[error("--future-expense month must be >= 1")]
    FutureExpenseMonth,
    #[error("--future-expense amount must be a finite number >= 0, got {0}")]
    FutureExpenseAmount(f64),
    #[error("--goal name must not be empty")]
    EmptyGoalName,
    #[error("--goal name {0:?} is used more than once")]
    DuplicateGoal(String),
    #[error("--goal {name:?} amount must be a finite number > 0")]
    GoalAmount { name: String },
    #[error("expected {expected}, got {value:?}")]
    Malformed {
        expected: &'static str,
        value: String,
    },
    #[error("{0} is required")]
    Missing(&'static str),
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("failed to encode response: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
enum ApiError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiGoalType {
    #[serde(alias = "requiredSavings", alias = "required_savings")]
    RequiredSavings,
    #[serde(alias = "maxExpense", alias = "max_expense")]
    MaxExpense,
}

impl From<ApiGoalType> for GoalType {
    fn from(value: ApiGoalType) -> Self {
        match value {
            ApiGoalType::RequiredSavings => GoalType::RequiredSavings,
            ApiGoalType::MaxExpense => GoalType::MaxExpense,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_wealth: Option<f64>,
    monthly_income: Option<f64>,
    monthly_expense: Option<f64>,
    salary_increase_rate: Option<f64>,
    investment_return_rate: Option<f64>,
    inflation_rate: Option<f64>,
    time_horizon_years: Option<i32>,
    future_expenses: Option<Vec<FutureExpense>>,
    goals: Option<Vec<Goal>>,
    start_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SolvePayload {
    #[serde(flatten)]
    simulation: SimulatePayload,
    goal_type: Option<ApiGoalType>,
    goal_amount: Option<f64>,
    target_month: Option<u32>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Parser, Debug)]
#[command(
    name = "forecast",
    about = "Month-by-month personal wealth forecast (income, expenses, returns, inflation, goals)"
)]
struct Cli {
    #[arg(
        long,
        default_value_t = 10_000.0,
        allow_negative_numbers = true,
        help = "Starting net worth"
    )]
    initial_wealth: f64,
    #[arg(long, default_value_t = 4_000.0, help = "Monthly income at month 0")]
    monthly_income: f64,
    #[arg(long, default_value_t = 3_000.0, help = "Monthly expense at month 0")]
    monthly_expense: f64,
    #[arg(
        long,
        default_value_t = 3.0,
        allow_negative_numbers = true,
        help = "Annual salary increase in percent"
    )]
    salary_increase_rate: f64,
    #[arg(
        long,
        default_value_t = 6.0,
        allow_negative_numbers = true,
        help = "Annual investment return in percent"
    )]
    investment_return_rate: f64,
    #[arg(
        long,
        default_value_t = 2.5,
        allow_negative_numbers = true,
        help = "Annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(long, default_value_t = 10, help = "Years to simulate")]
    time_horizon_years: i32,
    #[arg(
        long = "future-expense",
        value_name = "MONTH:AMOUNT",
        value_parser = parse_future_expense,
        help = "One-off expense in a simulated month; repeatable"
    )]
    future_expenses: Vec<FutureExpense>,
    #[arg(
        long = "goal",
        value_name = "NAME:AMOUNT",
        value_parser = parse_goal,
        help = "Wealth goal to track; repeatable"
    )]
    goals: Vec<Goal>,
    #[arg(long, help = "Anchor date for month offsets (YYYY-MM-DD); defaults to today")]
    start_date: Option<NaiveDate>,
}

#[derive(Debug)]
struct ApiRequest {
    params: SimulationParameters,
    start_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    start_date: NaiveDate,
    parameters: SimulationParameters,
    result: SimulationResult,
    years: Vec<YearSummary>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn parse_future_expense(raw: &str) -> Result<FutureExpense, InputError> {
    let malformed = || InputError::Malformed {
        expected: "MONTH:AMOUNT",
        value: raw.to_string(),
    };
    let (month, amount) = raw.split_once(':').ok_or_else(malformed)?;
    Ok(FutureExpense {
        month: month.trim().parse().map_err(|_| malformed())?,
        amount: amount.trim().parse().map_err(|_| malformed())?,
    })
}

fn parse_goal(raw: &str) -> Result<Goal, InputError> {
    let malformed = || InputError::Malformed {
        expected: "NAME:AMOUNT",
        value: raw.to_string(),
    };
    let (name, amount) = raw.rsplit_once(':').ok_or_else(malformed)?;
    Ok(Goal {
        name: name.trim().to_string(),
        amount: amount.trim().parse().map_err(|_| malformed())?,
    })
}

fn build_parameters(cli: Cli) -> Result<SimulationParameters, InputError> {
    if !(1..=MAX_HORIZON_YEARS).contains(&cli.time_horizon_years) {
        return Err(InputError::TimeHorizon(cli.time_horizon_years));
    }

    if !cli.initial_wealth.is_finite() {
        return Err(InputError::NotFinite {
            field: "--initial-wealth",
        });
    }

    for (field, amount) in [
        ("--monthly-income", cli.monthly_income),
        ("--monthly-expense", cli.monthly_expense),
    ] {
        if !amount.is_finite() {
            return Err(InputError::NotFinite { field });
        }
        if amount < 0.0 {
            return Err(InputError::Negative { field });
        }
    }

    for (field, rate) in [
        ("--salary-increase-rate", cli.salary_increase_rate),
        ("--investment-return-rate", cli.investment_return_rate),
        ("--inflation-rate", cli.inflation_rate),
    ] {
        if !rate.is_finite() {
            return Err(InputError::NotFinite { field });
        }
        if rate <= -100.0 {
            return Err(InputError::RateBelowFloor { field });
        }
    }

    for expense in &cli.future_expenses {
        if expense.month == 0 {
            return Err(InputError::FutureExpenseMonth);
        }
        if !expense.amount.is_finite() || expense.amount < 0.0 {
            return Err(InputError::FutureExpenseAmount(expense.amount));
        }
    }

    let mut seen_goals = HashSet::new();
    for goal in &cli.goals {
        if goal.name.trim().is_empty() {
            return Err(InputError::EmptyGoalName);
        }
        if !seen_goals.insert(goal.name.as_str()) {
            return Err(InputError::DuplicateGoal(goal.name.clone()));
        }
        if !goal.amount.is_finite() || goal.amount <= 0.0 {
            return Err(InputError::GoalAmount {
                name: goal.name.clone(),
            });
        }
    }

    Ok(SimulationParameters {
        initial_wealth: cli.initial_wealth,
        monthly_income: cli.monthly_income,
        monthly_expense: cli.monthly_expense,
        salary_increase_rate: cli.salary_increase_rate,
        investment_return_rate: cli.investment_return_rate,
        inflation_rate: cli.inflation_rate,
        time_horizon_years: cli.time_horizon_years,
        future_expenses: cli.future_expenses,
        goals: cli.goals,
    })
}

/// Parses command-line flags, runs one forecast and returns the response JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let start_date = cli.start_date;
    let params = build_parameters(cli)?;
    let response = simulate(ApiRequest { params, start_date });
    Ok(serde_json::to_string_pretty(&response)?)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/solve", post(solve_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    log::info!("forecast HTTP API listening on http://{addr}");
    log::info!("local access: http://127.0.0.1:{port}/api/simulate");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload).await
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    match api_request_from_payload(payload) {
        Ok(request) => json_response(StatusCode::OK, simulate(request)),
        Err(err) => {
            log::warn!("rejected simulate request: {err}");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

async fn solve_post_handler(Json(payload): Json<SolvePayload>) -> Response {
    match solve_from_payload(payload) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) => {
            log::warn!("rejected solve request: {err}");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn anchor_clock(start_date: Option<NaiveDate>) -> Box<dyn Clock + Send> {
    match start_date {
        Some(date) => Box::new(FixedClock(date)),
        None => Box::new(SystemClock),
    }
}

fn simulate(request: ApiRequest) -> SimulateResponse {
    let start_date = anchor_clock(request.start_date).today();
    let result = run_simulation_from(&request.params, start_date);
    let years = summarize_years(&result.projections);
    SimulateResponse {
        start_date,
        parameters: request.params,
        result,
        years,
    }
}

fn solve_from_payload(payload: SolvePayload) -> Result<GoalSolveResult, ApiError> {
    let request = api_request_from_payload(payload.simulation)?;
    let goal_amount = payload
        .goal_amount
        .ok_or(InputError::Missing("goalAmount"))?;
    let config = GoalSolveConfig {
        goal_type: payload
            .goal_type
            .map(GoalType::from)
            .unwrap_or(GoalType::RequiredSavings),
        goal_amount,
        target_month: payload
            .target_month
            .unwrap_or_else(|| request.params.horizon_months()),
        search_min: payload.search_min.unwrap_or(0.0),
        search_max: payload.search_max.unwrap_or(100_000.0),
        tolerance: payload.tolerance.unwrap_or(0.01),
        max_iterations: payload.max_iterations.unwrap_or(60),
    };
    let start_date = anchor_clock(request.start_date).today();
    Ok(solve_goal(&request.params, config, start_date)?)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: SimulatePayload) -> Result<ApiRequest, InputError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.initial_wealth {
        cli.initial_wealth = v;
    }
    if let Some(v) = payload.monthly_income {
        cli.monthly_income = v;
    }
    if let Some(v) = payload.monthly_expense {
        cli.monthly_expense = v;
    }
    if let Some(v) = payload.salary_increase_rate {
        cli.salary_increase_rate = v;
    }
    if let Some(v) = payload.investment_return_rate {
        cli.investment_return_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.time_horizon_years {
        cli.time_horizon_years = v;
    }
    if let Some(v) = payload.future_expenses {
        cli.future_expenses = v;
    }
    if let Some(v) = payload.goals {
        cli.goals = v;
    }
    if let Some(v) = payload.start_date {
        cli.start_date = Some(v);
    }

    let start_date = cli.start_date;
    let params = build_parameters(cli)?;
    Ok(ApiRequest { params, start_date })
}

fn default_cli_for_api() -> Cli {
    Cli {
        initial_wealth: 10_000.0,
        monthly_income: 4_000.0,
        monthly_expense: 3_000.0,
        salary_increase_rate: 3.0,
        investment_return_rate: 6.0,
        inflation_rate: 2.5,
        time_horizon_years: 10,
        future_expenses: Vec::new(),
        goals: Vec::new(),
        start_date: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    fn assert_golden_snapshot(path: &str, actual: &str) {
        let update = matches!(
            std::env::var("UPDATE_GOLDEN").as_deref(),
            Ok("1") | Ok("true") | Ok("TRUE")
        );
        let snapshot_path = Path::new(path);

        if update {
            if let Some(parent) = snapshot_path.parent() {
                fs::create_dir_all(parent).expect("failed to create snapshot directory");
            }
            fs::write(snapshot_path, actual).expect("failed to write golden snapshot");
            return;
        }

        let expected = fs::read_to_string(snapshot_path).unwrap_or_else(|_| {
            panic!("missing golden snapshot at {path}; run with UPDATE_GOLDEN=1 to generate")
        });
        assert_eq!(
            actual, expected,
            "snapshot mismatch for {path}; run with UPDATE_GOLDEN=1 to refresh if expected"
        );
    }

    #[test]
    fn parsed_defaults_match_api_defaults() {
        let parsed = Cli::try_parse_from(["forecast"]).expect("defaults parse");
        let defaults = default_cli_for_api();
        assert_approx(parsed.initial_wealth, defaults.initial_wealth);
        assert_approx(parsed.monthly_income, defaults.monthly_income);
        assert_approx(parsed.monthly_expense, defaults.monthly_expense);
        assert_approx(parsed.salary_increase_rate, defaults.salary_increase_rate);
        assert_approx(parsed.investment_return_rate, defaults.investment_return_rate);
        assert_approx(parsed.inflation_rate, defaults.inflation_rate);
        assert_eq!(parsed.time_horizon_years, defaults.time_horizon_years);
        assert!(parsed.future_expenses.is_empty());
        assert!(parsed.goals.is_empty());
        assert_eq!(parsed.start_date, None);
    }

    #[test]
    fn cli_parses_repeated_goals_and_future_expenses() {
        let cli = Cli::try_parse_from([
            "forecast",
            "--initial-wealth",
            "-500",
            "--inflation-rate",
            "-1.5",
            "--goal",
            "Car:5000",
            "--goal",
            "Trip: Japan:2500.5",
            "--future-expense",
            "6:3000",
            "--future-expense",
            "18:250",
            "--start-date",
            "2024-01-31",
        ])
        .expect("flags should parse");

        assert_approx(cli.initial_wealth, -500.0);
        assert_approx(cli.inflation_rate, -1.5);
        assert_eq!(
            cli.goals,
            vec![
                Goal {
                    name: "Car".to_string(),
                    amount: 5000.0,
                },
                Goal {
                    name: "Trip: Japan".to_string(),
                    amount: 2500.5,
                },
            ]
        );
        assert_eq!(
            cli.future_expenses,
            vec![
                FutureExpense {
                    month: 6,
                    amount: 3000.0,
                },
                FutureExpense {
                    month: 18,
                    amount: 250.0,
                },
            ]
        );
        assert_eq!(cli.start_date, NaiveDate::from_ymd_opt(2024, 1, 31));
    }

    #[test]
    fn cli_rejects_malformed_future_expense() {
        assert!(Cli::try_parse_from(["forecast", "--future-expense", "6"]).is_err());
        assert!(Cli::try_parse_from(["forecast", "--future-expense", "six:100"]).is_err());
        assert!(Cli::try_parse_from(["forecast", "--goal", "5000"]).is_err());
    }

    #[test]
    fn parse_helpers_report_expected_shape() {
        let err = parse_future_expense("june:100").expect_err("must reject month name");
        assert_eq!(
            err,
            InputError::Malformed {
                expected: "MONTH:AMOUNT",
                value: "june:100".to_string(),
            }
        );
        let goal = parse_goal(" Emergency fund : 6000 ").expect("valid goal");
        assert_eq!(goal.name, "Emergency fund");
        assert_approx(goal.amount, 6000.0);
    }

    #[test]
    fn build_parameters_accepts_defaults() {
        let params = build_parameters(sample_cli()).expect("valid inputs");
        assert_eq!(params.time_horizon_years, 10);
        assert_eq!(params.horizon_months(), 120);
        assert_approx(params.inflation_rate, 2.5);
    }

    #[test]
    fn build_parameters_rejects_out_of_range_horizon() {
        for years in [0, -1, 101] {
            let mut cli = sample_cli();
            cli.time_horizon_years = years;
            let err = build_parameters(cli).expect_err("must reject horizon");
            assert_eq!(err, InputError::TimeHorizon(years));
            assert!(err.to_string().contains("--time-horizon-years"));
        }
    }

    #[test]
    fn build_parameters_rejects_negative_income() {
        let mut cli = sample_cli();
        cli.monthly_income = -1.0;
        let err = build_parameters(cli).expect_err("must reject negative income");
        assert!(err.to_string().contains("--monthly-income"));
    }

    #[test]
    fn build_parameters_rejects_non_finite_values() {
        let mut cli = sample_cli();
        cli.initial_wealth = f64::NAN;
        let err = build_parameters(cli).expect_err("must reject NaN wealth");
        assert!(err.to_string().contains("--initial-wealth"));

        let mut cli = sample_cli();
        cli.investment_return_rate = f64::INFINITY;
        let err = build_parameters(cli).expect_err("must reject infinite rate");
        assert!(err.to_string().contains("--investment-return-rate"));
    }

    #[test]
    fn build_parameters_rejects_total_loss_rates() {
        let mut cli = sample_cli();
        cli.inflation_rate = -100.0;
        let err = build_parameters(cli).expect_err("must reject <= -100 rate");
        assert_eq!(
            err,
            InputError::RateBelowFloor {
                field: "--inflation-rate"
            }
        );
    }

    #[test]
    fn build_parameters_rejects_invalid_future_expense() {
        let mut cli = sample_cli();
        cli.future_expenses = vec![FutureExpense {
            month: 0,
            amount: 100.0,
        }];
        assert_eq!(
            build_parameters(cli).expect_err("must reject month 0"),
            InputError::FutureExpenseMonth
        );

        let mut cli = sample_cli();
        cli.future_expenses = vec![FutureExpense {
            month: 3,
            amount: -5.0,
        }];
        assert_eq!(
            build_parameters(cli).expect_err("must reject negative amount"),
            InputError::FutureExpenseAmount(-5.0)
        );
    }

    #[test]
    fn build_parameters_rejects_duplicate_and_invalid_goals() {
        let mut cli = sample_cli();
        cli.goals = vec![
            Goal {
                name: "Car".to_string(),
                amount: 5000.0,
            },
            Goal {
                name: "Car".to_string(),
                amount: 8000.0,
            },
        ];
        assert_eq!(
            build_parameters(cli).expect_err("must reject duplicate goal"),
            InputError::DuplicateGoal("Car".to_string())
        );

        let mut cli = sample_cli();
        cli.goals = vec![Goal {
            name: "  ".to_string(),
            amount: 5000.0,
        }];
        assert_eq!(
            build_parameters(cli).expect_err("must reject blank name"),
            InputError::EmptyGoalName
        );

        let mut cli = sample_cli();
        cli.goals = vec![Goal {
            name: "House".to_string(),
            amount: 0.0,
        }];
        assert_eq!(
            build_parameters(cli).expect_err("must reject zero amount"),
            InputError::GoalAmount {
                name: "House".to_string()
            }
        );
    }

    #[test]
    fn api_request_from_json_parses_web_keys() {
        let json = r#"{
          "initialWealth": 2500,
          "monthlyIncome": 5200,
          "monthlyExpense": 3900,
          "salaryIncreaseRate": 4,
          "investmentReturnRate": 7.5,
          "inflationRate": 2,
          "timeHorizonYears": 15,
          "futureExpenses": [{ "month": 24, "amount": 12000 }],
          "goals": [{ "name": "House", "amount": 60000 }],
          "startDate": "2025-06-30"
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let params = request.params;

        assert_approx(params.initial_wealth, 2500.0);
        assert_approx(params.monthly_income, 5200.0);
        assert_approx(params.monthly_expense, 3900.0);
        assert_approx(params.salary_increase_rate, 4.0);
        assert_approx(params.investment_return_rate, 7.5);
        assert_approx(params.inflation_rate, 2.0);
        assert_eq!(params.time_horizon_years, 15);
        assert_eq!(
            params.future_expenses,
            vec![FutureExpense {
                month: 24,
                amount: 12_000.0,
            }]
        );
        assert_eq!(params.goals[0].name, "House");
        assert_eq!(request.start_date, NaiveDate::from_ymd_opt(2025, 6, 30));
    }

    #[test]
    fn api_request_from_json_keeps_defaults_for_missing_keys() {
        let request = api_request_from_json(r#"{ "monthlyIncome": 4500 }"#).expect("parse");
        assert_approx(request.params.monthly_income, 4500.0);
        assert_approx(request.params.monthly_expense, 3000.0);
        assert_eq!(request.params.time_horizon_years, 10);
        assert!(request.start_date.is_none());
    }

    #[test]
    fn api_request_from_json_reports_validation_error() {
        let err = api_request_from_json(r#"{ "timeHorizonYears": 0 }"#)
            .expect_err("must reject zero horizon");
        assert!(err.contains("--time-horizon-years"));

        let err = api_request_from_json(r#"{ "goals": [{ "name": "Car" }] }"#)
            .expect_err("must reject goal without amount");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn simulate_uses_pinned_start_date() {
        let request = api_request_from_json(
            r#"{ "timeHorizonYears": 2, "startDate": "2024-01-31" }"#,
        )
        .expect("json should parse");
        let response = simulate(request);

        assert_eq!(response.start_date, NaiveDate::from_ymd_opt(2024, 1, 31).expect("date"));
        assert_eq!(response.result.projections.len(), 24);
        assert_eq!(response.years.len(), 2);
        assert_eq!(
            Some(response.result.projections[0].date),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn solve_payload_runs_required_savings_search() {
        let json = r#"{
          "initialWealth": 0,
          "monthlyIncome": 1000,
          "monthlyExpense": 1000,
          "salaryIncreaseRate": 0,
          "investmentReturnRate": 0,
          "inflationRate": 0,
          "timeHorizonYears": 2,
          "startDate": "2025-01-01",
          "goalType": "required-savings",
          "goalAmount": 6000,
          "targetMonth": 12,
          "searchMax": 2000,
          "tolerance": 0.01
        }"#;
        let payload: SolvePayload = serde_json::from_str(json).expect("payload should parse");
        let result = solve_from_payload(payload).expect("must solve");

        assert!(result.feasible);
        assert_eq!(result.goal_type, GoalType::RequiredSavings);
        let value = result.solved_value.expect("value expected");
        assert!((value - 500.0).abs() <= 0.01, "got {value}");
        assert_eq!(result.target_date, NaiveDate::from_ymd_opt(2026, 1, 1).expect("date"));
    }

    #[test]
    fn solve_payload_requires_goal_amount() {
        let payload: SolvePayload =
            serde_json::from_str(r#"{ "goalType": "maxExpense" }"#).expect("payload should parse");
        let err = solve_from_payload(payload).expect_err("must require amount");
        assert!(err.to_string().contains("goalAmount"));
    }

    #[test]
    fn solve_payload_surfaces_config_errors() {
        let payload: SolvePayload = serde_json::from_str(
            r#"{ "timeHorizonYears": 1, "goalAmount": 1000, "targetMonth": 13 }"#,
        )
        .expect("payload should parse");
        let err = solve_from_payload(payload).expect_err("must reject month past horizon");
        assert!(matches!(
            err,
            ApiError::Solve(SolveError::TargetMonth {
                target_month: 13,
                horizon_months: 12
            })
        ));
    }

    #[test]
    fn run_cli_prints_simulation_json() {
        let output = run_cli([
            "forecast",
            "--time-horizon-years",
            "1",
            "--goal",
            "Car:5000",
            "--start-date",
            "2024-01-15",
        ])
        .expect("cli run should succeed");
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(value["startDate"], "2024-01-15");
        assert_eq!(
            value["result"]["projections"]
                .as_array()
                .map(|rows| rows.len()),
            Some(12)
        );
        assert_eq!(value["result"]["goalProjections"][0]["name"], "Car");
    }

    #[test]
    fn run_cli_reports_input_errors() {
        let err = run_cli(["forecast", "--time-horizon-years", "0"]).expect_err("must fail");
        assert!(matches!(err, CliError::Input(InputError::TimeHorizon(0))));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let request = api_request_from_json(r#"{ "startDate": "2024-03-01" }"#).expect("parse");
        let response = simulate(request);
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"startDate\":\"2024-03-01\""));
        assert!(json.contains("\"parameters\""));
        assert!(json.contains("\"projections\""));
        assert!(json.contains("\"goalProjections\""));
        assert!(json.contains("\"breakEvenMonth\""));
        assert!(json.contains("\"recommendedSavingsRate\""));
        assert!(json.contains("\"realWealth\""));
        assert!(json.contains("\"years\""));
        assert!(json.contains("\"endWealth\""));
    }

    #[test]
    fn golden_snapshot_small_forecast_json() {
        let json = r#"{
          "initialWealth": 0,
          "monthlyIncome": 1000,
          "monthlyExpense": 500,
          "salaryIncreaseRate": 0,
          "investmentReturnRate": 0,
          "inflationRate": 0,
          "timeHorizonYears": 1,
          "futureExpenses": [{ "month": 3, "amount": 700 }],
          "goals": [{ "name": "Car", "amount": 5000 }],
          "startDate": "2024-01-31"
        }"#;
        let request = api_request_from_json(json).expect("json should parse");
        let response = simulate(request);
        let json = format!(
            "{}\n",
            serde_json::to_string(&response).expect("response should serialize")
        );

        assert_golden_snapshot("tests/golden/small_forecast.json", &json);
    }
}
