//! Generation-tagged storage for children

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable reference to a child
///
/// A handle stays valid while its child lives, however other children are
/// added or removed. Once the child is removed, the handle is stale and
/// every lookup through it fails, even if the slot is reused.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildHandle {
    index: u32,
    generation: u32,
}

impl ChildHandle {
    /// Slot index
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation at creation time
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena keeping insertion order for iteration
#[derive(Debug, Clone)]
pub struct ChildArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    order: Vec<ChildHandle>,
}

impl<T> Default for ChildArena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
        }
    }
}

impl<T> ChildArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn insert(&mut self, value: T) -> ChildHandle {
        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation = slot.generation.wrapping_add(1);
                slot.value = Some(value);
                ChildHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                ChildHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.order.push(handle);
        handle
    }

    pub fn remove(&mut self, handle: ChildHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(handle.index);
        self.order.retain(|h| *h != handle);
        Some(value)
    }

    pub fn contains(&self, handle: ChildHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn get(&self, handle: ChildHandle) -> Option<&T> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn get_mut(&mut self, handle: ChildHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.value.as_mut()
    }

    /// Handles in insertion order
    pub fn handles(&self) -> &[ChildHandle] {
        &self.order
    }

    /// Live values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ChildHandle, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |&h| self.get(h).map(|v| (h, v)))
    }

    pub fn clear(&mut self) -> Vec<ChildHandle> {
        let removed = std::mem::take(&mut self.order);
        for handle in &removed {
            let slot = &mut self.slots[handle.index as usize];
            slot.value = None;
            self.free.push(handle.index);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_remove() {
        let mut arena = ChildArena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.get(b), Some(&"b"));
    }

    #[test]
    fn test_stale_handle_after_reuse() {
        let mut arena = ChildArena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let c = arena.insert(3);
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());
        assert!(!arena.contains(a));
        assert_eq!(arena.get(c), Some(&3));
    }

    #[test]
    fn test_insertion_order() {
        let mut arena = ChildArena::new();
        let a = arena.insert('a');
        let b = arena.insert('b');
        let c = arena.insert('c');
        arena.remove(b);
        let d = arena.insert('d');
        // d reuses b's slot but iterates last
        let order: Vec<char> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, vec!['a', 'c', 'd']);
        assert_eq!(arena.handles(), &[a, c, d]);
    }

    #[test]
    fn test_clear() {
        let mut arena = ChildArena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        assert_eq!(arena.clear(), vec![a, b]);
        assert!(arena.is_empty());
        assert!(!arena.contains(a));
        let c = arena.insert(5);
        assert_eq!(arena.get(c), Some(&5));
    }
}
