use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A user-facing alias produced by a generator or supplied by a caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

impl Alias {
    /// Wraps an alias string. Empty strings are allowed here.
    pub fn new(alias: impl Into<String>) -> Self {
        Self(alias.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Alias {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Alias {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<Alias> for String {
    fn from(value: Alias) -> Self {
        value.0
    }
}
