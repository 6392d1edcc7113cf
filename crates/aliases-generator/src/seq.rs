use aliases_core::keys::seq_key;
use aliases_core::{Alias, KvConn, StoreResult};

/// Generates decimal aliases from a counter kept in the shared store.
///
/// Unlike the pure generators this one needs a live connection, because the
/// counter is shared by every process serving the definition. Each call
/// advances the counter by exactly one, so the output is collision-free by
/// construction.
#[derive(Debug, Clone)]
pub struct SequentialGenerator {
    counter_key: String,
}

impl SequentialGenerator {
    /// Creates a generator for the counter of definition `def_id`.
    pub fn new(def_id: u64) -> Self {
        Self {
            counter_key: seq_key(def_id),
        }
    }

    /// Increments the counter and renders the new value.
    pub async fn next<C: KvConn>(&self, conn: &mut C) -> StoreResult<Alias> {
        let value = conn.incr(&self.counter_key).await?;
        Ok(Alias::new(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aliases_core::KvStore;
    use aliases_storage::InMemoryKv;

    #[tokio::test]
    async fn continues_from_seeded_counter() {
        let kv = InMemoryKv::new();
        let mut conn = kv.acquire().await.unwrap();
        conn.mset(&[(seq_key(4), "100000".to_string())]).await.unwrap();

        let generator = SequentialGenerator::new(4);

        assert_eq!(generator.next(&mut conn).await.unwrap().as_str(), "100001");
        assert_eq!(generator.next(&mut conn).await.unwrap().as_str(), "100002");
    }

    #[tokio::test]
    async fn starts_at_one_without_seed() {
        let kv = InMemoryKv::new();
        let mut conn = kv.acquire().await.unwrap();

        let generator = SequentialGenerator::new(9);

        assert_eq!(generator.next(&mut conn).await.unwrap().as_str(), "1");
    }

    #[tokio::test]
    async fn counters_are_per_definition() {
        let kv = InMemoryKv::new();
        let mut conn = kv.acquire().await.unwrap();

        let first = SequentialGenerator::new(1);
        let second = SequentialGenerator::new(2);

        first.next(&mut conn).await.unwrap();
        first.next(&mut conn).await.unwrap();

        assert_eq!(second.next(&mut conn).await.unwrap().as_str(), "1");
    }
}
