use crate::error::{AliasError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use typed_builder::TypedBuilder;

/// Default alias length for random alias generators.
pub const DEFAULT_RAND_MINLEN: usize = 8;
/// Default character set for random alias generators.
pub const DEFAULT_RAND_CHARS: &str = "abcdefghijklmnopqrstuvwzyz0123456789";

/// Which generator strategy a definition uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    /// `prefix` followed by `minlen` characters sampled from `chars`.
    Rand,
    /// Random UUID v4 in its textual form.
    Uuid,
    /// Decimal value of a per-definition counter.
    Seq,
}

impl GeneratorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorKind::Rand => "rand",
            GeneratorKind::Uuid => "uuid",
            GeneratorKind::Seq => "seq",
        }
    }
}

impl Display for GeneratorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorKind {
    type Err = AliasError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rand" => Ok(GeneratorKind::Rand),
            "uuid" => Ok(GeneratorKind::Uuid),
            "seq" => Ok(GeneratorKind::Seq),
            "" => Err(AliasError::Validation("type required".to_string())),
            _ => Err(AliasError::Validation("unknown type".to_string())),
        }
    }
}

/// Lower bounds for `rand` definitions.
///
/// These keep the candidate space large enough that the collision retry loop
/// rarely runs more than once at small scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct RandLimits {
    #[builder(default = 4)]
    pub min_len: usize,
    #[builder(default = 8)]
    pub min_chars: usize,
}

impl Default for RandLimits {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A named alias generator definition.
///
/// Stored as JSON under the definition id. Omitted fields take the values of
/// [`Def::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Def {
    /// Internal id, assigned once at creation and never reused.
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Initial counter value for `seq` definitions.
    pub offset: i64,
    pub chars: String,
    pub minlen: usize,
    pub prefix: String,
    /// Soft-delete flag. The name is unbound once this is set.
    #[serde(rename = "archived")]
    pub deleted: bool,
}

impl Default for Def {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            kind: String::new(),
            offset: 0,
            chars: DEFAULT_RAND_CHARS.to_string(),
            minlen: DEFAULT_RAND_MINLEN,
            prefix: String::new(),
            deleted: false,
        }
    }
}

impl Def {
    /// Creates a definition with default settings.
    pub fn new(name: impl Into<String>, kind: GeneratorKind) -> Self {
        Self {
            name: name.into(),
            kind: kind.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Validates the definition and returns its generator kind.
    pub fn validate(&self, limits: &RandLimits) -> Result<GeneratorKind> {
        validate_name(&self.name)?;

        let kind: GeneratorKind = self.kind.parse()?;

        if kind == GeneratorKind::Rand {
            if self.minlen < limits.min_len {
                return Err(AliasError::Validation(format!(
                    "rand min length too small: {} < {}",
                    self.minlen, limits.min_len
                )));
            }

            if self.chars.chars().count() < limits.min_chars {
                return Err(AliasError::Validation(format!(
                    "too few chars for rand: {} < {}",
                    self.chars.chars().count(),
                    limits.min_chars
                )));
            }
        }

        Ok(kind)
    }

    /// Serializes the definition for storage.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AliasError::CorruptDefinition {
            key: self.name.clone(),
            reason: format!("failed to encode definition: {e}"),
        })
    }

    /// Decodes a stored definition. `key` names the value for error reporting.
    pub fn from_json(key: &str, raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| AliasError::CorruptDefinition {
            key: key.to_string(),
            reason: format!("failed to decode definition: {e}"),
        })
    }
}

/// Checks that a definition name is non-empty and matches `[A-Za-z0-9._-]+`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AliasError::Validation("name required".to_string()));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(AliasError::Validation(format!(
            "name may only contain [A-Za-z0-9-_.] chars: '{}'",
            name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rand_def(chars: &str, minlen: usize) -> Def {
        Def {
            chars: chars.to_string(),
            minlen,
            ..Def::new("r", GeneratorKind::Rand)
        }
    }

    fn reason(err: AliasError) -> String {
        match err {
            AliasError::Validation(reason) => reason,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_names() {
        assert!(validate_name("abc").is_ok());
        assert!(validate_name("a.b-c_D9").is_ok());
    }

    #[test]
    fn invalid_names() {
        assert_eq!(reason(validate_name("").unwrap_err()), "name required");
        assert!(validate_name("a b").is_err());
        assert!(validate_name("a/b").is_err());
        assert!(validate_name("a:b").is_err());
    }

    #[test]
    fn type_is_required() {
        let def = Def {
            name: "t".to_string(),
            ..Def::default()
        };
        assert_eq!(reason(def.validate(&RandLimits::default()).unwrap_err()), "type required");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let def = Def {
            name: "t".to_string(),
            kind: "snowflake".to_string(),
            ..Def::default()
        };
        assert_eq!(reason(def.validate(&RandLimits::default()).unwrap_err()), "unknown type");
    }

    #[test]
    fn rand_minimums_are_enforced() {
        let limits = RandLimits::default();

        assert!(rand_def("abcdefgh", 4).validate(&limits).is_ok());
        assert!(reason(rand_def("abcdefgh", 3).validate(&limits).unwrap_err())
            .starts_with("rand min length too small"));
        assert!(reason(rand_def("abcdefg", 4).validate(&limits).unwrap_err())
            .starts_with("too few chars for rand"));
    }

    #[test]
    fn rand_minimums_are_configurable() {
        let limits = RandLimits::builder().min_len(2).min_chars(2).build();
        assert!(rand_def("ab", 2).validate(&limits).is_ok());
    }

    #[test]
    fn rand_limits_do_not_apply_to_other_kinds() {
        let def = Def {
            chars: String::new(),
            minlen: 0,
            ..Def::new("s", GeneratorKind::Seq)
        };
        assert_eq!(def.validate(&RandLimits::default()).unwrap(), GeneratorKind::Seq);
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let def: Def = serde_json::from_str(r#"{"name":"t","type":"rand"}"#).unwrap();
        assert_eq!(def.chars, DEFAULT_RAND_CHARS);
        assert_eq!(def.minlen, DEFAULT_RAND_MINLEN);
        assert!(!def.deleted);
    }

    #[test]
    fn deleted_flag_uses_archived_field() {
        let def = Def {
            deleted: true,
            ..Def::new("t", GeneratorKind::Uuid)
        };
        let json = def.to_json().unwrap();
        assert!(json.contains("\"archived\":true"));
        assert!(json.contains("\"type\":\"uuid\""));
        assert_eq!(Def::from_json("v:0", &json).unwrap(), def);
    }

    #[test]
    fn undecodable_value_is_corrupt() {
        let err = Def::from_json("v:7", "{not json").unwrap_err();
        assert!(matches!(err, AliasError::CorruptDefinition { ref key, .. } if key == "v:7"));
    }
}
