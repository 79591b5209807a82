//! Runtime protocol → color resolution.
//!
//! Named entries of the color vector pin a protocol to a color; the first
//! entry naming a protocol wins.  Unnamed entries form a pool handed out, in
//! order, to protocols nobody named.  Once a protocol has drawn a pool color
//! it keeps it until the vector changes.
//!
//! At most [`MAX_ASSIGNED`] such choices are remembered.  Past that, an
//! unnamed protocol's pool color is derived from its name, so it still stays
//! the same between calls without growing the table.

use std::collections::HashMap;

use netdiag_core::{ColorAssignmentList, Rgb24};
use tracing::debug;

use crate::application::ports::ProtocolColoring;

/// Upper bound on remembered pool assignments between reloads.
pub const MAX_ASSIGNED: usize = 4096;

#[derive(Debug, Clone)]
pub struct ProtocolPalette {
    /// Upper-cased protocol name → pinned color.
    named: HashMap<String, Rgb24>,
    pool: Vec<Rgb24>,
    /// Pool colors already handed out, keyed by upper-cased name.
    assigned: HashMap<String, Rgb24>,
    next: usize,
    /// Color for unknown protocols when the pool is empty.
    first: Rgb24,
}

impl Default for ProtocolPalette {
    fn default() -> Self {
        Self::from_list(&ColorAssignmentList::default())
    }
}

impl ProtocolPalette {
    pub fn from_list(list: &ColorAssignmentList) -> Self {
        let mut named = HashMap::new();
        let mut pool = Vec::new();
        for entry in list {
            match &entry.protocol {
                Some(protocol) => {
                    named.entry(protocol.to_uppercase()).or_insert(entry.color);
                }
                None => pool.push(entry.color),
            }
        }
        let first = list.get(0).map_or(Rgb24::FALLBACK_GRAY, |e| e.color);
        Self {
            named,
            pool,
            assigned: HashMap::new(),
            next: 0,
            first,
        }
    }

    /// Returns the color for `protocol`, drawing from the pool on first sight
    /// of an unnamed protocol.
    pub fn color_for(&mut self, protocol: &str) -> Rgb24 {
        let key = protocol.to_uppercase();
        if let Some(color) = self.named.get(&key) {
            return *color;
        }
        if let Some(color) = self.assigned.get(&key) {
            return *color;
        }
        if self.pool.is_empty() {
            return self.first;
        }
        if self.assigned.len() >= MAX_ASSIGNED {
            return self.pool[name_index(&key, self.pool.len())];
        }
        let color = self.pool[self.next % self.pool.len()];
        self.next += 1;
        debug!(protocol = %key, color = %color, "assigned pool color");
        self.assigned.insert(key, color);
        color
    }

    /// Number of pool assignments currently remembered.
    pub fn assigned_count(&self) -> usize {
        self.assigned.len()
    }

    /// Number of protocols pinned by name.
    pub fn named_count(&self) -> usize {
        self.named.len()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }
}

/// FNV-1a over the name, reduced to a pool index.
fn name_index(name: &str, len: usize) -> usize {
    let hash = name
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
        });
    (hash % len as u64) as usize
}

impl ProtocolColoring for ProtocolPalette {
    fn read_pref_vector(&mut self, colors: &[String]) {
        let list = ColorAssignmentList::from_persisted_vector(colors.to_vec());
        *self = Self::from_list(&list);
        debug!(
            named = self.named.len(),
            pool = self.pool.len(),
            "protocol palette reloaded"
        );
    }
}
