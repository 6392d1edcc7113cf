//! Key layout of the shared store.
//!
//! Everything that belongs to a definition is namespaced by its numeric id,
//! so renaming a definition never moves data.

/// Global counter used to allocate definition ids.
pub const DEF_ID_KEY: &str = "_:def:id";

/// Prefix of the id-indexed definition values.
pub const VALUE_PREFIX: &str = "v:";

/// Value stored under reverse keys. Only its presence matters.
pub const REVERSE_MARKER: &str = "1";

/// `d:{name}` -> definition id.
pub fn name_key(name: &str) -> String {
    format!("d:{name}")
}

/// `v:{id}` -> serialized definition.
pub fn value_key(id: u64) -> String {
    format!("{VALUE_PREFIX}{id}")
}

/// `s:{id}` -> sequence counter of a `seq` definition.
pub fn seq_key(id: u64) -> String {
    format!("s:{id}")
}

/// `k:{id}:{ident}` -> alias.
pub fn forward_key(id: u64, ident: &str) -> String {
    format!("k:{id}:{ident}")
}

/// `a:{id}:{alias}` -> marker.
pub fn reverse_key(id: u64, alias: &str) -> String {
    format!("a:{id}:{alias}")
}
