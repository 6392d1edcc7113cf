use crate::definition::Definition;
use aliases_core::keys::{name_key, seq_key, value_key, DEF_ID_KEY, VALUE_PREFIX};
use aliases_core::{
    AliasError, Commit, Def, GeneratorKind, KvConn, KvStore, RandLimits, Result, StoreError,
    Write,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Rounds of the watch/check/commit cycle `create` runs before giving up on
/// a name that keeps changing underneath it.
const CREATE_ATTEMPTS: usize = 16;

/// Named generator definitions kept in the shared store.
///
/// A definition is reachable by name through `d:{name}`; everything else is
/// keyed by its id, which is allocated once and never reused.
#[derive(Debug)]
pub struct Registry<S> {
    kv: Arc<S>,
    limits: RandLimits,
}

impl<S> Clone for Registry<S> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            limits: self.limits,
        }
    }
}

impl<S: KvStore> Registry<S> {
    pub fn new(kv: Arc<S>) -> Self {
        Self {
            kv,
            limits: RandLimits::default(),
        }
    }

    /// Replaces the minimums enforced on `rand` definitions.
    pub fn with_limits(mut self, limits: RandLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Validates and stores a new definition under a freshly allocated id.
    ///
    /// The name binding, the definition value and, for `seq` definitions, the
    /// counter seeded at `offset` are committed together.
    pub async fn create(&self, mut def: Def) -> Result<Definition> {
        let kind = def.validate(&self.limits)?;
        def.deleted = false;

        let mut conn = self.kv.acquire().await?;
        let name_key = name_key(&def.name);

        for _ in 0..CREATE_ATTEMPTS {
            conn.watch(std::slice::from_ref(&name_key)).await?;
            if conn.exists(&name_key).await? {
                conn.unwatch().await?;
                return Err(AliasError::AlreadyExists(def.name));
            }

            def.id = parse_id(DEF_ID_KEY, conn.incr(DEF_ID_KEY).await?)?;

            let mut writes = vec![
                Write::set(name_key.as_str(), def.id.to_string()),
                Write::set(value_key(def.id), def.to_json()?),
            ];
            if kind == GeneratorKind::Seq {
                writes.push(Write::set(seq_key(def.id), def.offset.to_string()));
            }

            match conn.exec(&writes).await? {
                Commit::Applied => {
                    info!(name = %def.name, id = def.id, kind = %kind, "created definition");
                    return Ok(Definition::with_kind(def, kind));
                }
                Commit::Conflict => {
                    debug!(name = %def.name, id = def.id, "name changed during create, retrying");
                }
            }
        }

        Err(StoreError::Operation(format!(
            "create '{}': name kept changing for {CREATE_ATTEMPTS} attempts",
            def.name
        ))
        .into())
    }

    /// Loads the active definition bound to `name`.
    pub async fn get(&self, name: &str) -> Result<Definition> {
        let mut conn = self.kv.acquire().await?;
        load(&mut conn, name).await
    }

    /// Replaces the definition bound to `name`, keeping its id.
    ///
    /// A rename unbinds the old name before binding the new one. Renaming
    /// onto a name owned by another definition fails with
    /// [`AliasError::AlreadyExists`].
    pub async fn update(&self, name: &str, mut def: Def) -> Result<Definition> {
        let kind = def.validate(&self.limits)?;

        let mut conn = self.kv.acquire().await?;
        let current = load(&mut conn, name).await?;
        let id = current.id();

        def.id = id;
        def.deleted = false;

        let new_name_key = name_key(&def.name);
        if def.name != name {
            if let Some(owner) = conn.get(&new_name_key).await? {
                if owner != id.to_string() {
                    return Err(AliasError::AlreadyExists(def.name));
                }
            }
            conn.del(&[name_key(name)]).await?;
        }

        let mut pairs = vec![
            (new_name_key, id.to_string()),
            (value_key(id), def.to_json()?),
        ];
        let counter = seq_key(id);
        if kind == GeneratorKind::Seq && !conn.exists(&counter).await? {
            pairs.push((counter, def.offset.to_string()));
        }
        conn.mset(&pairs).await?;

        info!(name = %name, new_name = %def.name, id, kind = %kind, "updated definition");
        Ok(Definition::with_kind(def, kind))
    }

    /// Soft-deletes the definition bound to `name` and unbinds the name.
    ///
    /// Aliases stored under the definition id are left in place.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let mut conn = self.kv.acquire().await?;
        let mut def = load(&mut conn, name).await?.into_def();
        def.deleted = true;

        let writes = [
            Write::del(name_key(name)),
            Write::set(value_key(def.id), def.to_json()?),
        ];
        match conn.exec(&writes).await? {
            Commit::Applied => {
                info!(name = %name, id = def.id, "deleted definition");
                Ok(())
            }
            Commit::Conflict => Err(StoreError::Operation(format!(
                "delete '{name}': unexpected transaction abort"
            ))
            .into()),
        }
    }

    /// Returns every stored definition, including soft-deleted ones, ordered
    /// by id.
    pub async fn list(&self) -> Result<Vec<Def>> {
        let mut conn = self.kv.acquire().await?;
        let keys = conn.scan_prefix(VALUE_PREFIX).await?;
        let values = conn.mget(&keys).await?;

        let mut defs = Vec::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            // Removed between SCAN and MGET.
            let Some(raw) = value else { continue };
            defs.push(Def::from_json(key, &raw).inspect_err(|e| {
                error!(key = %key, error = %e, "corrupt definition value");
            })?);
        }
        defs.sort_by_key(|def| def.id);

        debug!(count = defs.len(), "listed definitions");
        Ok(defs)
    }
}

/// Resolves `name` to its id and decodes the stored definition.
async fn load<C: KvConn>(conn: &mut C, name: &str) -> Result<Definition> {
    let key = name_key(name);
    let Some(raw_id) = conn.get(&key).await? else {
        return Err(AliasError::NotFound(name.to_string()));
    };
    let id: u64 = raw_id.parse().map_err(|_| {
        corrupt(&key, format!("name binding holds a non-numeric id '{raw_id}'"))
    })?;

    let key = value_key(id);
    let Some(raw) = conn.get(&key).await? else {
        return Err(corrupt(&key, format!("no value for bound name '{name}'")));
    };
    let mut def = Def::from_json(&key, &raw).inspect_err(|e| {
        error!(key = %key, error = %e, "corrupt definition value");
    })?;

    if def.deleted {
        return Err(AliasError::NotFound(name.to_string()));
    }
    def.id = id;

    let kind = def
        .kind
        .parse::<GeneratorKind>()
        .map_err(|e| corrupt(&key, e.to_string()))?;
    Ok(Definition::with_kind(def, kind))
}

fn corrupt(key: &str, reason: String) -> AliasError {
    error!(key = %key, reason = %reason, "corrupt definition");
    AliasError::CorruptDefinition {
        key: key.to_string(),
        reason,
    }
}

fn parse_id(key: &str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{key}: negative id {value}")).into())
}
