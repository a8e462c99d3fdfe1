//! Diagnostics snapshot — a serializable picture of world state.
//!
//! Enabled by the `diagnostics` feature flag. [`World::diagnostics_snapshot`]
//! collects entity pool counters, per-store component counts and the
//! per-system timings of the last tick into a [`WorldSnapshot`], which
//! serializes to JSON for logging or an external viewer.
//!
//! [`World::diagnostics_snapshot`]: crate::ecs::world::World::diagnostics_snapshot

use serde::Serialize;

pub use crate::ecs::system::SystemTiming;

// ── Snapshot types (wire format) ────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    /// Completed ticks when the snapshot was taken.
    pub tick: u64,
    pub entity_pool: EntityPoolStats,
    /// One entry per registered component kind, in registration order.
    pub stores: Vec<StoreStats>,
    /// Timings of the most recent tick, in run order.
    pub system_timings: Vec<SystemTiming>,
}

impl WorldSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Total time spent in systems during the last tick, in microseconds.
    pub fn total_system_us(&self) -> f64 {
        self.system_timings.iter().map(|t| t.duration_us).sum()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EntityPoolStats {
    /// Slots ever allocated (live + free).
    pub total_slots: u32,
    pub free_count: usize,
    pub alive_count: usize,
    /// Since the start of the last tick.
    pub created_this_tick: u32,
    pub destroyed_this_tick: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub component: String,
    pub len: usize,
}

/// Shorten a fully-qualified type name for display, e.g.
/// `my_game::components::Position` → `Position`,
/// `alloc::vec::Vec<my_game::Item>` → `Vec<Item>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    for (i, c) in full.char_indices() {
        if matches!(c, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&') {
            out.push_str(last_path_segment(&full[segment_start..i]));
            out.push(c);
            segment_start = i + c.len_utf8();
        }
    }
    out.push_str(last_path_segment(&full[segment_start..]));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
