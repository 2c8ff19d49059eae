use thiserror::Error;
use crate::model::condition::Score;

pub type Index = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub group_index: Index,
    pub member_index: Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap(pub Position, pub Position);

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("Invalid position")]
    InvalidPosition,
    #[error("Both positions are in group {0}")]
    SameGroup(Index),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    ScoreDiff(Score),
    Failed(ActionError),
}

impl ActionResult {
    pub fn score_diff(&self) -> Option<Score> {
        match self {
            ActionResult::ScoreDiff(diff) => Some(*diff),
            ActionResult::Failed(_) => None,
        }
    }
}

impl From<Result<Score, ActionError>> for ActionResult {
    fn from(result: Result<Score, ActionError>) -> Self {
        match result {
            Ok(diff) => ActionResult::ScoreDiff(diff),
            Err(err) => ActionResult::Failed(err),
        }
    }
}
