mod clock;
mod engine;
mod solver;
mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{monthly_rate, run_simulation, run_simulation_from, summarize_years};
pub use solver::{
    GoalSolveConfig, GoalSolveIteration, GoalSolveResult, GoalType, SolveError, solve_goal,
};
pub use types::{
    FutureExpense, Goal, GoalProjection, MonthlyProjection, SimulationParameters,
    SimulationResult, YearSummary,
};
