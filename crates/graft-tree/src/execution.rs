//! Run-scoped shared message bag.

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;

type Message = Arc<dyn Any + Send + Sync>;

/// Messages shared across every document of one rewrite run.
///
/// All operations take `&self` and may be called concurrently from worker
/// threads. Created once per run and dropped with it.
#[derive(Default)]
pub struct ExecutionContext {
    values: DashMap<String, Message>,
    sets: DashMap<String, BTreeSet<String>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_message<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Arc::new(value));
    }

    pub fn get_message<T: Any + Send + Sync + Clone>(&self, key: &str) -> Option<T> {
        let entry = self.values.get(key)?;
        (**entry.value()).downcast_ref::<T>().cloned()
    }

    /// Read and clear a message.
    pub fn poll_message<T: Any + Send + Sync + Clone>(&self, key: &str) -> Option<T> {
        let (_, value) = self.values.remove(key)?;
        (*value).downcast_ref::<T>().cloned()
    }

    /// Add `value` to the set stored under `key`. Returns false if it was already present.
    pub fn put_message_in_set(&self, key: &str, value: impl Into<String>) -> bool {
        self.sets.entry(key.to_owned()).or_default().insert(value.into())
    }

    /// Snapshot of the set stored under `key`; empty if none.
    pub fn message_set(&self, key: &str) -> BTreeSet<String> {
        self.sets
            .get(key)
            .map(|set| set.value().clone())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("values", &self.values.len())
            .field("sets", &self.sets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_get_and_poll() {
        let ctx = ExecutionContext::new();
        ctx.put_message("needs-annotation", 3usize);
        assert_eq!(ctx.get_message::<usize>("needs-annotation"), Some(3));
        assert_eq!(ctx.get_message::<String>("needs-annotation"), None);
        assert_eq!(ctx.poll_message::<usize>("needs-annotation"), Some(3));
        assert_eq!(ctx.get_message::<usize>("needs-annotation"), None);
    }

    #[test]
    fn test_sets_accumulate_across_threads() {
        let ctx = ExecutionContext::new();
        std::thread::scope(|s| {
            for i in 0..4 {
                let ctx = &ctx;
                s.spawn(move || {
                    ctx.put_message_in_set("classes", format!("C{}", i % 2));
                });
            }
        });
        let set = ctx.message_set("classes");
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["C0", "C1"]);
        assert!(ctx.message_set("missing").is_empty());
    }
}
