use aliases_core::{Def, GeneratorKind, Result};
use aliases_generator::Strategy;

/// A loaded definition together with its generator strategy.
///
/// The strategy is built once here and reused for every alias generated
/// under the definition.
#[derive(Debug, Clone)]
pub struct Definition {
    def: Def,
    strategy: Strategy,
}

impl Definition {
    /// Builds the strategy selected by `def.kind`.
    pub fn new(def: Def) -> Result<Self> {
        let kind: GeneratorKind = def.kind.parse()?;
        Ok(Self::with_kind(def, kind))
    }

    pub(crate) fn with_kind(def: Def, kind: GeneratorKind) -> Self {
        let strategy = Strategy::from_def(&def, kind);
        Self { def, strategy }
    }

    pub fn id(&self) -> u64 {
        self.def.id
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn kind(&self) -> GeneratorKind {
        self.strategy.kind()
    }

    pub fn def(&self) -> &Def {
        &self.def
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn into_def(self) -> Def {
        self.def
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aliases_core::AliasError;

    #[test]
    fn strategy_follows_type() {
        let def = Def {
            id: 3,
            ..Def::new("s", GeneratorKind::Seq)
        };
        let definition = Definition::new(def.clone()).unwrap();

        assert_eq!(definition.kind(), GeneratorKind::Seq);
        assert_eq!(definition.id(), 3);
        assert_eq!(definition.name(), "s");
        assert_eq!(definition.into_def(), def);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let def = Def {
            name: "x".to_string(),
            kind: "hash".to_string(),
            ..Def::default()
        };
        assert!(matches!(Definition::new(def), Err(AliasError::Validation(_))));
    }
}
