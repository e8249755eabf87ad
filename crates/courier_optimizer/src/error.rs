use thiserror::Error;

use crate::{problem::dispatch_problem::ProblemError, solver::cost::EvaluationError};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid search parameters: {0}")]
    InvalidParams(String),
    #[error("no vehicles available for assignment")]
    EmptyFleet,
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
