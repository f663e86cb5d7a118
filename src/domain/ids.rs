// Identifier generation for polygons and trip events
use uuid::Uuid;

/// Source of unique identifiers. Injected wherever ids are assigned so
/// tests can substitute a deterministic sequence.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Production source: random v4 UUIDs.
#[derive(Debug, Clone, Default)]
pub struct UuidIds;

impl IdSource for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
pub struct SequentialIds {
    prefix: &'static str,
    counter: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl SequentialIds {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            counter: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

#[cfg(test)]
impl IdSource for SequentialIds {
    fn next_id(&self) -> String {
        let n = self
            .counter
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        format!("{}-{}", self.prefix, n + 1)
    }
}
