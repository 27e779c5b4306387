use parser::Pos;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RuleError {
    pub locations: Vec<Pos>,
    pub message: String,
}
