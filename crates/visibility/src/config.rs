use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unterminated placeholder in \"{template}\".")]
    UnterminatedPlaceholder { template: String },

    #[error("Unsupported placeholder \"{{{placeholder}}}\", only \"{{env.NAME}}\" is supported.")]
    UnsupportedPlaceholder { placeholder: String },
}

/// Whether the public schema is enabled.
///
/// Either a boolean, or a string resolved against the environment where only the exact
/// result `"true"` enables it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnabledFlag {
    Bool(bool),
    Template(String),
}

impl Default for EnabledFlag {
    fn default() -> Self {
        EnabledFlag::Bool(false)
    }
}

impl EnabledFlag {
    pub fn resolve(&self) -> bool {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> bool {
        match self {
            EnabledFlag::Bool(enabled) => *enabled,
            EnabledFlag::Template(template) => match interpolate(template, lookup) {
                Ok(value) => value == "true",
                Err(err) => {
                    tracing::warn!(error = %err, "Invalid public schema flag, the public schema stays disabled.");
                    false
                },
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PublicSchemaConfig {
    #[serde(default)]
    pub enabled: EnabledFlag,
}

/// Replaces every `{env.NAME}` placeholder in `template` with the value returned by `lookup`.
///
/// Missing variables interpolate as an empty string.
pub fn interpolate(template: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('}') else {
            return Err(ConfigError::UnterminatedPlaceholder {
                template: template.to_string(),
            });
        };
        let placeholder = rest[start + 1..start + len].trim();
        let Some(name) = placeholder.strip_prefix("env.") else {
            return Err(ConfigError::UnsupportedPlaceholder {
                placeholder: placeholder.to_string(),
            });
        };
        match lookup(name) {
            Some(value) => output.push_str(&value),
            None => tracing::warn!(variable = name, "Environment variable is not set."),
        }
        rest = &rest[start + len + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "PUBLIC_SCHEMA" => Some("true".to_string()),
            "PREFIX" => Some("tr".to_string()),
            "DISABLED" => Some("false".to_string()),
            _ => None,
        }
    }

    #[test_case(EnabledFlag::Bool(true), true; "literal true")]
    #[test_case(EnabledFlag::Bool(false), false; "literal false")]
    #[test_case(EnabledFlag::Template("true".into()), true; "plain string")]
    #[test_case(EnabledFlag::Template("TRUE".into()), false; "case sensitive")]
    #[test_case(EnabledFlag::Template("{env.PUBLIC_SCHEMA}".into()), true; "env variable")]
    #[test_case(EnabledFlag::Template("{env.PREFIX}ue".into()), true; "partial template")]
    #[test_case(EnabledFlag::Template("{env.DISABLED}".into()), false; "env false")]
    #[test_case(EnabledFlag::Template("{env.MISSING}".into()), false; "missing variable")]
    #[test_case(EnabledFlag::Template("{context.enabled}".into()), false; "unsupported placeholder")]
    #[test_case(EnabledFlag::Template("{env.PUBLIC_SCHEMA".into()), false; "unterminated")]
    fn resolve(flag: EnabledFlag, expected: bool) {
        assert_eq!(flag.resolve_with(env), expected);
    }

    #[test]
    fn interpolate_errors() {
        assert_eq!(
            interpolate("{env.A", env),
            Err(ConfigError::UnterminatedPlaceholder {
                template: "{env.A".to_string()
            })
        );
        assert_eq!(
            interpolate("x{ context.a }", env),
            Err(ConfigError::UnsupportedPlaceholder {
                placeholder: "context.a".to_string()
            })
        );
        assert_eq!(interpolate("a{env.MISSING}b", env), Ok("ab".to_string()));
    }

    #[test]
    fn deserialize_config_shapes() {
        #[derive(Deserialize)]
        struct Wrapper {
            public_schema: PublicSchemaConfig,
        }

        let value: Wrapper = serde_json::from_str(r#"{ "public_schema": { "enabled": true } }"#).unwrap();
        assert_eq!(value.public_schema.enabled, EnabledFlag::Bool(true));

        let value: Wrapper = serde_json::from_str(r#"{ "public_schema": { "enabled": "{env.X}" } }"#).unwrap();
        assert_eq!(value.public_schema.enabled, EnabledFlag::Template("{env.X}".to_string()));

        let value: Wrapper = serde_json::from_str(r#"{ "public_schema": {} }"#).unwrap();
        assert_eq!(value.public_schema.enabled, EnabledFlag::Bool(false));
    }
}
