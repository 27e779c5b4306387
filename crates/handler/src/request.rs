use serde::{Deserialize, Serialize};
use value::Variables;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Request {
    pub query: String,
    #[serde(rename = "operationName", default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "variables_is_empty")]
    pub variables: Variables,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn operation(self, name: impl Into<String>) -> Self {
        Self {
            operation_name: Some(name.into()),
            ..self
        }
    }

    #[must_use]
    pub fn variables(self, variables: Variables) -> Self {
        Self { variables, ..self }
    }
}

#[inline]
fn variables_is_empty(variables: &Variables) -> bool {
    variables.is_empty()
}
