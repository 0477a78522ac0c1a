//! Generational arena used for handle tables.
//!
//! Both the task registry and the lock table hand out opaque handles that are
//! arena indices. A slot may be reused once its occupant is removed, but the
//! slot's generation is bumped on every removal, so a stale handle never
//! resolves to the new occupant.

use core::fmt;
use core::hash::{Hash, Hasher};

/// A slot position paired with the generation it was issued under.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArenaIndex {
    index: u32,
    generation: u32,
}

impl ArenaIndex {
    /// Creates an index from raw parts (primarily for testing).
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot position.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation counter.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ArenaIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArenaIndex({}:{})", self.index, self.generation)
    }
}

impl Hash for ArenaIndex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let packed = (u64::from(self.index) << 32) | u64::from(self.generation);
        state.write_u64(packed);
    }
}

#[derive(Debug)]
enum Slot<T> {
    Occupied { value: T, generation: u32 },
    Vacant { next_free: Option<u32>, generation: u32 },
}

/// Slot storage with a free list and per-slot generations.
#[derive(Debug)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no slot is occupied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts a value and returns the index it was stored under.
    pub fn insert(&mut self, value: T) -> ArenaIndex {
        self.insert_with(|_| value)
    }

    /// Inserts the value produced by `f`.
    ///
    /// The closure receives the index the value will live at, so records can
    /// embed their own handle.
    pub fn insert_with<F>(&mut self, f: F) -> ArenaIndex
    where
        F: FnOnce(ArenaIndex) -> T,
    {
        let idx = match self.free_head {
            Some(free_index) => {
                let Slot::Vacant {
                    next_free,
                    generation,
                } = self.slots[free_index as usize]
                else {
                    unreachable!("free list pointed to occupied slot");
                };
                self.free_head = next_free;
                ArenaIndex {
                    index: free_index,
                    generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len()).expect("arena overflow");
                self.slots.push(Slot::Vacant {
                    next_free: None,
                    generation: 0,
                });
                ArenaIndex {
                    index,
                    generation: 0,
                }
            }
        };

        self.slots[idx.index as usize] = Slot::Occupied {
            value: f(idx),
            generation: idx.generation,
        };
        self.len += 1;
        idx
    }

    /// Removes and returns the value at `index`.
    ///
    /// Returns `None` for a vacant slot or a stale generation.
    pub fn remove(&mut self, index: ArenaIndex) -> Option<T> {
        let slot = self.slots.get_mut(index.index as usize)?;
        match slot {
            Slot::Occupied { generation, .. } if *generation == index.generation => {
                let vacant = Slot::Vacant {
                    next_free: self.free_head,
                    generation: generation.wrapping_add(1),
                };
                let Slot::Occupied { value, .. } = core::mem::replace(slot, vacant) else {
                    unreachable!();
                };
                self.free_head = Some(index.index);
                self.len -= 1;
                Some(value)
            }
            _ => None,
        }
    }

    /// Returns a reference to the value at `index`.
    #[must_use]
    pub fn get(&self, index: ArenaIndex) -> Option<&T> {
        match self.slots.get(index.index as usize)? {
            Slot::Occupied { value, generation } if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to the value at `index`.
    pub fn get_mut(&mut self, index: ArenaIndex) -> Option<&mut T> {
        match self.slots.get_mut(index.index as usize)? {
            Slot::Occupied { value, generation } if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Returns true if `index` resolves to an occupied slot.
    #[must_use]
    pub fn contains(&self, index: ArenaIndex) -> bool {
        self.get(index).is_some()
    }

    /// Iterates over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (ArenaIndex, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Occupied { value, generation } => Some((
                    ArenaIndex {
                        index: i as u32,
                        generation: *generation,
                    },
                    value,
                )),
                Slot::Vacant { .. } => None,
            })
    }

    /// Removes every occupied value, bumping each generation.
    pub fn drain(&mut self) -> Vec<(ArenaIndex, T)> {
        let indices: Vec<ArenaIndex> = self.iter().map(|(idx, _)| idx).collect();
        indices
            .into_iter()
            .filter_map(|idx| self.remove(idx).map(|value| (idx, value)))
            .collect()
    }
}
