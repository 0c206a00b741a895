// ── Selection & cursor ──
//
// Marks are keyed by light id, so a refresh that reorders the registry
// keeps them on the same physical lights. The cursor stays a row index.

use std::collections::HashSet;

use crate::model::{Light, LightId};
use crate::registry::LightRegistry;

#[derive(Debug, Clone, Default)]
pub struct Selection {
    cursor: usize,
    marked: HashSet<LightId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move by `delta` rows, clamped to `[0, len - 1]`.
    pub fn move_cursor(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let max = len - 1;
        self.cursor = self.cursor.saturating_add_signed(delta).min(max);
    }

    /// Re-clamp after the registry changed size, and forget marks on
    /// lights that are gone.
    pub fn sync(&mut self, registry: &LightRegistry) {
        self.cursor = self.cursor.min(registry.len().saturating_sub(1));
        self.marked.retain(|id| registry.find_by_id(id).is_some());
    }

    /// Flip the mark on the light at `index`. Returns the new state, or
    /// `None` when the index is out of range.
    pub fn toggle_selection(&mut self, registry: &LightRegistry, index: usize) -> Option<bool> {
        let id = &registry.get(index)?.id;
        if self.marked.remove(id) {
            Some(false)
        } else {
            self.marked.insert(id.clone());
            Some(true)
        }
    }

    pub fn clear_selection(&mut self) {
        self.marked.clear();
    }

    pub fn is_selected(&self, id: &LightId) -> bool {
        self.marked.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Marked lights that still exist, in registry order.
    pub fn selected_lights<'a>(&self, registry: &'a LightRegistry) -> Vec<&'a Light> {
        registry
            .iter()
            .filter(|light| self.marked.contains(&light.id))
            .collect()
    }
}
