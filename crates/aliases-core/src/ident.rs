use serde::{Deserialize, Serialize};

/// Outcome for one identifier in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The identifier already had an alias.
    Exists,
    /// A new alias was committed for the identifier.
    Created,
    /// Read-only lookup found no alias.
    Missing,
}

/// One identifier of a batch request, paired with its alias and outcome.
///
/// `alias` is empty until resolved. `status` stays `None` for entries the
/// store skipped (empty identifiers).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentAlias {
    pub ident: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl IdentAlias {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            ..Self::default()
        }
    }

    /// An identifier with a caller-chosen alias, as used by explicit sets.
    pub fn with_alias(ident: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            alias: alias.into(),
            status: None,
        }
    }

    /// Builds a batch from identifiers, preserving their order.
    pub fn batch<I, S>(idents: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        idents.into_iter().map(Self::new).collect()
    }

    pub fn resolve(&mut self, alias: impl Into<String>, status: Status) {
        self.alias = alias.into();
        self.status = Some(status);
    }

    pub fn mark_missing(&mut self) {
        self.alias.clear();
        self.status = Some(Status::Missing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_preserves_order() {
        let batch = IdentAlias::batch(["c", "a", "b"]);
        let idents: Vec<_> = batch.iter().map(|ia| ia.ident.as_str()).collect();
        assert_eq!(idents, ["c", "a", "b"]);
        assert!(batch.iter().all(|ia| ia.alias.is_empty() && ia.status.is_none()));
    }

    #[test]
    fn json_shape() {
        let mut ia = IdentAlias::new("a");
        ia.resolve("100001", Status::Created);
        assert_eq!(
            serde_json::to_string(&ia).unwrap(),
            r#"{"ident":"a","alias":"100001","status":"created"}"#
        );

        let unresolved = IdentAlias::new("b");
        assert_eq!(
            serde_json::to_string(&unresolved).unwrap(),
            r#"{"ident":"b","alias":""}"#
        );
    }

    #[test]
    fn decodes_put_records_without_status() {
        let ia: IdentAlias = serde_json::from_str(r#"{"ident":"a","alias":"x"}"#).unwrap();
        assert_eq!(ia, IdentAlias::with_alias("a", "x"));
    }
}
