//! Ordered entity pool
//!
//! An arena of slots threaded into a singly linked list by index. Entities
//! are appended at the tail and walked head to tail, so spawn order is
//! preserved. Freed slots go on a free list and bump their generation so a
//! stale `Handle` can never reach a recycled entity.

/// Stable reference to a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    next: Option<u32>,
    generation: u32,
}

#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    head: Option<u32>,
    tail: Option<u32>,
    len: usize,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Append at the tail
    pub fn push_back(&mut self, value: T) -> Handle {
        let index = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                slot.next = None;
                index
            }
            None => {
                self.slots.push(Slot {
                    value: Some(value),
                    next: None,
                    generation: 0,
                });
                (self.slots.len() - 1) as u32
            }
        };

        match self.tail {
            Some(tail) => self.slots[tail as usize].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        Handle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Walk head to tail, unlinking every entity for which `keep` returns
    /// false. Handles head, tail, interior and sole-node removal.
    pub fn retain_mut<F>(&mut self, mut keep: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut prev: Option<u32> = None;
        let mut cur = self.head;

        while let Some(index) = cur {
            let slot = &mut self.slots[index as usize];
            let next = slot.next;
            let retained = match slot.value.as_mut() {
                Some(value) => keep(value),
                None => false,
            };

            if retained {
                prev = Some(index);
            } else {
                match prev {
                    Some(p) => self.slots[p as usize].next = next,
                    None => self.head = next,
                }
                if self.tail == Some(index) {
                    self.tail = prev;
                }
                self.release(index);
            }
            cur = next;
        }
    }

    /// Visit every entity in order
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut T),
    {
        let mut cur = self.head;
        while let Some(index) = cur {
            let slot = &mut self.slots[index as usize];
            cur = slot.next;
            if let Some(value) = slot.value.as_mut() {
                f(value);
            }
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            pool: self,
            cur: self.head,
        }
    }

    /// Drop every entity
    pub fn clear(&mut self) {
        let mut cur = self.head;
        while let Some(index) = cur {
            cur = self.slots[index as usize].next;
            self.release(index);
        }
        self.head = None;
        self.tail = None;
    }

    fn release(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.value = None;
        slot.next = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
        self.len -= 1;
    }

    /// Check the list invariants: head and tail are both set or both
    /// unset, walking from head ends exactly at tail, and the walk visits
    /// `len` live slots.
    pub fn is_consistent(&self) -> bool {
        if self.head.is_none() != self.tail.is_none() {
            return false;
        }

        let mut count = 0usize;
        let mut last = None;
        let mut cur = self.head;
        while let Some(index) = cur {
            let Some(slot) = self.slots.get(index as usize) else {
                return false;
            };
            if slot.value.is_none() || count > self.slots.len() {
                return false;
            }
            count += 1;
            last = Some(index);
            cur = slot.next;
        }

        last == self.tail && count == self.len && count + self.free.len() == self.slots.len()
    }
}

pub struct Iter<'a, T> {
    pool: &'a Pool<T>,
    cur: Option<u32>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let pool: &'a Pool<T> = self.pool;
        let slot = &pool.slots[self.cur? as usize];
        self.cur = slot.next;
        slot.value.as_ref()
    }
}

impl<T> Extend<T> for Pool<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}
