use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::query::Address;
use crate::types::asset::OwnershipResult;

/// Session-lifetime cache of enriched ownership results, keyed by
/// normalized address. Entries are never evicted or expired.
#[derive(Debug, Clone, Default)]
pub struct OwnerCache {
    entries: HashMap<Address, OwnershipResult>,
}

impl OwnerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, addr: &Address) -> Option<&OwnershipResult> {
        self.entries.get(addr)
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.entries.contains_key(addr)
    }

    /// Write-once insert: the first completion to populate an address
    /// wins, so a racing duplicate cannot tear the entry. Returns
    /// whether this call populated the key.
    pub fn insert_if_absent(&mut self, addr: Address, result: OwnershipResult) -> bool {
        match self.entries.entry(addr) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(result);
                true
            }
        }
    }

    /// Overwrite an entry unconditionally (test seeding).
    pub fn seed(&mut self, addr: Address, result: OwnershipResult) {
        self.entries.insert(addr, result);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
