use crate::definition::Definition;
use aliases_core::keys::{forward_key, reverse_key, REVERSE_MARKER};
use aliases_core::{
    AliasError, Commit, IdentAlias, KvConn, KvStore, Result, Status, StoreError, Write,
};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Default bound on candidates tried for one identifier.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Counts returned by [`AliasStore::delete`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Identifiers whose alias was removed.
    pub removed: usize,
    /// Identifiers that had no alias.
    pub skipped: usize,
}

/// Identifier to alias mappings of definitions.
///
/// Every definition owns a forward table (`identifier -> alias`) and a
/// reverse table (`alias -> marker`). All writes touch both inside one
/// transaction, and generated aliases are committed only if neither key
/// changed since it was checked, so no process-local locking is needed for
/// concurrent callers.
#[derive(Debug)]
pub struct AliasStore<S> {
    kv: Arc<S>,
    max_attempts: usize,
}

impl<S> Clone for AliasStore<S> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            max_attempts: self.max_attempts,
        }
    }
}

impl<S: KvStore> AliasStore<S> {
    pub fn new(kv: Arc<S>) -> Self {
        Self {
            kv,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets how many candidates are tried per identifier before
    /// [`AliasError::MaxAttemptsReached`]. At least one is always tried.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Returns the alias of every identifier, generating and committing one
    /// where none exists yet.
    ///
    /// Entries are processed in order. Empty identifiers are left untouched.
    /// The first failure aborts the batch; aliases committed before it stay.
    pub async fn assign(
        &self,
        definition: &Definition,
        mut idents: Vec<IdentAlias>,
    ) -> Result<Vec<IdentAlias>> {
        let mut conn = self.kv.acquire().await?;
        let mut created = 0usize;

        for entry in idents.iter_mut() {
            if entry.ident.is_empty() {
                continue;
            }
            self.assign_one(&mut conn, definition, entry).await?;
            if entry.status == Some(Status::Created) {
                created += 1;
            }
        }

        info!(
            definition = %definition.name(),
            total = idents.len(),
            created,
            "assigned aliases"
        );
        Ok(idents)
    }

    async fn assign_one<C: KvConn>(
        &self,
        conn: &mut C,
        definition: &Definition,
        entry: &mut IdentAlias,
    ) -> Result<()> {
        let id = definition.id();
        let forward = forward_key(id, &entry.ident);

        if let Some(alias) = conn.get(&forward).await? {
            entry.resolve(alias, Status::Exists);
            return Ok(());
        }

        for attempt in 1..=self.max_attempts {
            conn.watch(std::slice::from_ref(&forward)).await?;

            // Another caller may have assigned this identifier meanwhile.
            if let Some(alias) = conn.get(&forward).await? {
                conn.unwatch().await?;
                entry.resolve(alias, Status::Exists);
                return Ok(());
            }

            // A `seq` counter only advances for identifiers still unmapped here.
            let candidate = definition.strategy().generate(conn).await?;
            let reverse = reverse_key(id, candidate.as_str());
            conn.watch(std::slice::from_ref(&reverse)).await?;

            if conn.exists(&reverse).await? {
                conn.unwatch().await?;
                trace!(ident = %entry.ident, candidate = %candidate, attempt, "alias taken");
                continue;
            }

            let writes = [
                Write::set(forward.as_str(), candidate.as_str()),
                Write::set(reverse, REVERSE_MARKER),
            ];
            match conn.exec(&writes).await? {
                Commit::Applied => {
                    debug!(
                        definition = %definition.name(),
                        ident = %entry.ident,
                        alias = %candidate,
                        attempts = attempt,
                        "created alias"
                    );
                    entry.resolve(candidate.into_string(), Status::Created);
                    return Ok(());
                }
                Commit::Conflict => {
                    trace!(ident = %entry.ident, candidate = %candidate, attempt, "commit conflict");
                }
            }
        }

        Err(AliasError::MaxAttemptsReached {
            definition: definition.name().to_string(),
            ident: entry.ident.clone(),
            attempts: self.max_attempts,
        })
    }

    /// Reads the aliases of `idents` without generating any.
    ///
    /// Entries without an alias are marked [`Status::Missing`].
    pub async fn lookup(
        &self,
        definition: &Definition,
        mut idents: Vec<IdentAlias>,
    ) -> Result<Vec<IdentAlias>> {
        let mut conn = self.kv.acquire().await?;

        let keys: Vec<String> = idents
            .iter()
            .map(|entry| forward_key(definition.id(), &entry.ident))
            .collect();
        let aliases = conn.mget(&keys).await?;

        for (entry, alias) in idents.iter_mut().zip(aliases) {
            match alias {
                Some(alias) => entry.resolve(alias, Status::Exists),
                None => entry.mark_missing(),
            }
        }

        Ok(idents)
    }

    /// Stores caller-chosen aliases, overwriting existing mappings.
    ///
    /// No uniqueness check is made against other identifiers. The previous
    /// reverse entry of a re-mapped identifier is removed in the same commit.
    /// Returns the number of pairs written.
    pub async fn put(&self, definition: &Definition, pairs: &[IdentAlias]) -> Result<usize> {
        let pairs: Vec<&IdentAlias> = pairs.iter().filter(|p| !p.ident.is_empty()).collect();
        if let Some(blank) = pairs.iter().find(|p| p.alias.is_empty()) {
            return Err(AliasError::EmptyAlias(blank.ident.clone()));
        }

        let mut conn = self.kv.acquire().await?;
        let id = definition.id();

        for pair in &pairs {
            let forward = forward_key(id, &pair.ident);
            let mut committed = false;

            for _ in 0..self.max_attempts {
                conn.watch(std::slice::from_ref(&forward)).await?;
                let previous = conn.get(&forward).await?;

                let mut writes = vec![
                    Write::set(forward.as_str(), pair.alias.as_str()),
                    Write::set(reverse_key(id, &pair.alias), REVERSE_MARKER),
                ];
                if let Some(previous) = previous.filter(|old| *old != pair.alias) {
                    writes.push(Write::del(reverse_key(id, &previous)));
                }

                if conn.exec(&writes).await? == Commit::Applied {
                    committed = true;
                    break;
                }
                trace!(ident = %pair.ident, "commit conflict on put");
            }

            if !committed {
                return Err(StoreError::Operation(format!(
                    "put of '{}' in '{}' kept conflicting after {} attempts",
                    pair.ident,
                    definition.name(),
                    self.max_attempts
                ))
                .into());
            }
        }

        info!(definition = %definition.name(), written = pairs.len(), "stored aliases");
        Ok(pairs.len())
    }

    /// Removes the forward and reverse entries of every identifier that has
    /// an alias.
    pub async fn delete<I: AsRef<str>>(
        &self,
        definition: &Definition,
        idents: &[I],
    ) -> Result<DeleteReport> {
        let mut conn = self.kv.acquire().await?;
        let id = definition.id();
        let mut report = DeleteReport::default();

        for ident in idents {
            let ident = ident.as_ref();
            let forward = forward_key(id, ident);
            let mut done = false;

            for _ in 0..self.max_attempts {
                conn.watch(std::slice::from_ref(&forward)).await?;
                let Some(alias) = conn.get(&forward).await? else {
                    conn.unwatch().await?;
                    report.skipped += 1;
                    done = true;
                    break;
                };

                let writes = [Write::del(forward.as_str()), Write::del(reverse_key(id, &alias))];
                if conn.exec(&writes).await? == Commit::Applied {
                    report.removed += 1;
                    done = true;
                    break;
                }
                trace!(ident, "commit conflict on delete");
            }

            if !done {
                return Err(StoreError::Operation(format!(
                    "delete of '{}' in '{}' kept conflicting after {} attempts",
                    ident,
                    definition.name(),
                    self.max_attempts
                ))
                .into());
            }
        }

        info!(
            definition = %definition.name(),
            removed = report.removed,
            skipped = report.skipped,
            "deleted aliases"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aliases_core::{Def, GeneratorKind};
    use aliases_storage::InMemoryKv;

    fn store() -> (InMemoryKv, AliasStore<InMemoryKv>) {
        let kv = InMemoryKv::new();
        (kv.clone(), AliasStore::new(Arc::new(kv)))
    }

    fn seq_definition(id: u64) -> Definition {
        Definition::new(Def {
            id,
            ..Def::new("t", GeneratorKind::Seq)
        })
        .unwrap()
    }

    #[tokio::test]
    async fn assign_skips_empty_identifiers() {
        let (kv, store) = store();
        let definition = seq_definition(1);

        let result = store
            .assign(&definition, IdentAlias::batch(["", "a"]))
            .await
            .unwrap();

        assert_eq!(result[0], IdentAlias::new(""));
        assert_eq!(result[1].alias, "1");
        assert_eq!(result[1].status, Some(Status::Created));
        assert!(!kv.entries().contains_key("k:1:"));
    }

    #[tokio::test]
    async fn assign_returns_existing_forward_alias() {
        let (kv, store) = store();
        let definition = seq_definition(1);
        let mut conn = kv.acquire().await.unwrap();
        conn.mset(&[("k:1:a".to_string(), "x".to_string())])
            .await
            .unwrap();

        let result = store
            .assign(&definition, IdentAlias::batch(["a"]))
            .await
            .unwrap();

        assert_eq!(result[0].alias, "x");
        assert_eq!(result[0].status, Some(Status::Exists));
        // No candidate was drawn.
        assert!(!kv.entries().contains_key("s:1"));
    }

    #[tokio::test]
    async fn assign_skips_taken_candidates() {
        let (kv, store) = store();
        let definition = seq_definition(1);
        let mut conn = kv.acquire().await.unwrap();
        conn.mset(&[("a:1:1".to_string(), "1".to_string())])
            .await
            .unwrap();

        let result = store
            .assign(&definition, IdentAlias::batch(["a"]))
            .await
            .unwrap();

        assert_eq!(result[0].alias, "2");
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        let (_, store) = store();
        assert_eq!(store.with_max_attempts(0).max_attempts(), 1);
    }

    #[tokio::test]
    async fn lookup_marks_missing() {
        let (_, store) = store();
        let definition = seq_definition(1);
        store
            .assign(&definition, IdentAlias::batch(["a"]))
            .await
            .unwrap();

        let result = store
            .lookup(&definition, IdentAlias::batch(["z", "a"]))
            .await
            .unwrap();

        assert_eq!(result[0].status, Some(Status::Missing));
        assert!(result[0].alias.is_empty());
        assert_eq!(result[1].status, Some(Status::Exists));
        assert_eq!(result[1].alias, "1");
    }

    #[tokio::test]
    async fn put_overwrites_and_drops_previous_reverse() {
        let (kv, store) = store();
        let definition = seq_definition(1);

        let written = store
            .put(&definition, &[IdentAlias::with_alias("a", "x")])
            .await
            .unwrap();
        assert_eq!(written, 1);

        store
            .put(&definition, &[IdentAlias::with_alias("a", "y")])
            .await
            .unwrap();

        let entries = kv.entries();
        assert_eq!(entries["k:1:a"], "y");
        assert!(entries.contains_key("a:1:y"));
        assert!(!entries.contains_key("a:1:x"));
    }

    #[tokio::test]
    async fn put_rejects_empty_alias_before_writing() {
        let (kv, store) = store();
        let definition = seq_definition(1);

        let err = store
            .put(
                &definition,
                &[IdentAlias::with_alias("a", "x"), IdentAlias::with_alias("b", "")],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AliasError::EmptyAlias(ref ident) if ident == "b"));
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn put_skips_empty_identifiers() {
        let (kv, store) = store();
        let definition = seq_definition(1);

        let written = store
            .put(&definition, &[IdentAlias::with_alias("", "")])
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn delete_reports_removed_and_skipped() {
        let (kv, store) = store();
        let definition = seq_definition(1);
        store
            .assign(&definition, IdentAlias::batch(["a", "b"]))
            .await
            .unwrap();

        let report = store.delete(&definition, &["a", "zzz"]).await.unwrap();

        assert_eq!(report, DeleteReport { removed: 1, skipped: 1 });
        let entries = kv.entries();
        assert!(!entries.contains_key("k:1:a"));
        assert!(!entries.contains_key("a:1:1"));
        assert!(entries.contains_key("k:1:b"));
        assert!(entries.contains_key("a:1:2"));
    }
}
