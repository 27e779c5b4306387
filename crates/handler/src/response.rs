use indexmap::IndexMap;
use parser::Pos;
use publicgate_validation::RuleError;
use serde::{Deserialize, Serialize};
use value::ConstValue;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    pub message: String,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub locations: Vec<Pos>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub path: Vec<ConstValue>,
}

impl ServerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }
    }

    #[must_use]
    pub fn at(self, pos: Pos) -> Self {
        Self {
            locations: vec![pos],
            ..self
        }
    }
}

impl From<RuleError> for ServerError {
    fn from(err: RuleError) -> Self {
        Self {
            message: err.message,
            locations: err.locations,
            path: Vec::new(),
        }
    }
}

impl From<parser::Error> for ServerError {
    fn from(err: parser::Error) -> Self {
        Self {
            message: err.to_string(),
            locations: err.positions().collect(),
            path: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub data: ConstValue,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<ServerError>,

    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    pub extensions: IndexMap<String, ConstValue>,
}

impl Response {
    pub fn new(data: ConstValue) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// A response with `data: null` carrying `errors`.
    pub fn from_errors(errors: Vec<ServerError>) -> Self {
        Self {
            data: ConstValue::Null,
            errors,
            extensions: Default::default(),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
