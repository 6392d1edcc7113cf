//! Alias generator strategies.
//!
//! Every definition selects one strategy. The pure ones implement
//! [`Generator`]; the sequential one draws from a counter in the shared
//! store. [`Strategy`] is the closed set of all three, built once when a
//! definition is loaded.

pub mod random;
pub mod seq;
pub mod uuid;

use aliases_core::{Alias, Def, GeneratorKind, KvConn, StoreResult};

pub use random::RandomGenerator;
pub use seq::SequentialGenerator;
pub use self::uuid::UuidGenerator;

/// Trait for generating aliases without touching storage.
///
/// Implementations may collide; the alias store detects collisions and asks
/// again.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<Alias>;

    /// Produces a candidate alias.
    fn generate(&self) -> Self::Output;
}

/// The generator strategy of one definition.
#[derive(Debug, Clone)]
pub enum Strategy {
    Random(RandomGenerator),
    Uuid(UuidGenerator),
    Sequential(SequentialGenerator),
}

impl Strategy {
    /// Builds the strategy for an already validated definition.
    pub fn from_def(def: &Def, kind: GeneratorKind) -> Self {
        match kind {
            GeneratorKind::Rand => {
                Strategy::Random(RandomGenerator::new(&def.prefix, &def.chars, def.minlen))
            }
            GeneratorKind::Uuid => Strategy::Uuid(UuidGenerator),
            GeneratorKind::Seq => Strategy::Sequential(SequentialGenerator::new(def.id)),
        }
    }

    pub fn kind(&self) -> GeneratorKind {
        match self {
            Strategy::Random(_) => GeneratorKind::Rand,
            Strategy::Uuid(_) => GeneratorKind::Uuid,
            Strategy::Sequential(_) => GeneratorKind::Seq,
        }
    }

    /// Produces a candidate alias. Only the sequential strategy uses `conn`.
    pub async fn generate<C: KvConn>(&self, conn: &mut C) -> StoreResult<Alias> {
        match self {
            Strategy::Random(generator) => Ok(generator.generate().into()),
            Strategy::Uuid(generator) => Ok(generator.generate().into()),
            Strategy::Sequential(generator) => generator.next(conn).await,
        }
    }
}
