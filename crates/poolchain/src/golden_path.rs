//! # Golden Path
//!
//! The reference walkthrough: build a list in a small arena, edit it, look
//! things up, and show that an oversized request is refused. Each step
//! records what the list rendered so callers can print or assert on it.

use poolchain_core::{ConcurrentList, PoolAllocator, PoolConfig, PoolError, PoolResult};

/// One step of the walkthrough.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    /// What was done.
    pub action: &'static str,
    /// Observed outcome.
    pub outcome: String,
}

impl Step {
    fn new(action: &'static str, outcome: impl Into<String>) -> Self {
        Self {
            action,
            outcome: outcome.into(),
        }
    }
}

/// Runs the walkthrough against a list and a standalone pool sized by
/// `config`.
///
/// # Errors
///
/// Returns the first unexpected failure, e.g. an arena too small to hold
/// three nodes.
pub fn run(config: &PoolConfig) -> PoolResult<Vec<Step>> {
    let mut steps = Vec::new();
    let list: ConcurrentList = ConcurrentList::from_config(config)?;

    for v in [1, 2, 3] {
        list.insert_tail(v)?;
    }
    steps.push(Step::new("insert_tail 1, 2, 3", list.display()));

    list.delete(2)?;
    steps.push(Step::new("delete 2", list.display()));

    let hit = list
        .search(3)
        .map_or_else(|| "not found".to_owned(), |node| format!("value {}", node.value()));
    steps.push(Step::new("search 3", hit));
    let miss = if list.search(9).is_some() { "found" } else { "not found" };
    steps.push(Step::new("search 9", miss));

    let head = list.search(1);
    list.insert_before(head, 0)?;
    steps.push(Step::new("insert_before head 0", list.display()));
    steps.push(Step::new("count", list.count().to_string()));

    let pool: PoolAllocator = PoolAllocator::from_config(config)?;
    let oversized = config.capacity.saturating_add(36);
    let outcome = match pool.allocate(oversized) {
        Ok(h) => format!("granted at {}", h.offset()),
        Err(err @ PoolError::AllocationFailure { .. }) => err.to_string(),
        Err(err) => return Err(err),
    };
    steps.push(Step::new("allocate capacity + 36", outcome));

    list.teardown();
    steps.push(Step::new("teardown", list.display()));

    tracing::info!(steps = steps.len(), "golden path complete");
    Ok(steps)
}
