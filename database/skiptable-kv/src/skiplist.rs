//! An ordered map backed by a skip list.
//!
//! Entries live in an arena and are addressed by index, so a forward link at
//! any level is just an `Option<Index>`. The head is not an entry: it is a
//! bare vector of links with one slot per level `0..=max_level`.
//!
//! ```text
//! [Level 2] head ----------------> c ----------------> None
//! [Level 1] head ------> a ------> c ------> d ------> None
//! [Level 0] head -> a -> b -> c -> d -> e -> None
//! ```

use std::{borrow::Borrow, fmt};

use crate::{config::Config, error::ConfigError, level::LevelGenerator};

type Index = usize;

/// Where a traversal currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Head,
    Entry(Index),
}

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    /// One link per level `0..=entry_level`.
    forward: Vec<Option<Index>>,
}

#[derive(Debug)]
struct Entries<K, V> {
    head: Vec<Option<Index>>,
    slots: Vec<Option<Entry<K, V>>>,
    free: Vec<Index>,
}

impl<K, V> Entries<K, V> {
    fn new(max_level: usize) -> Self {
        Entries {
            head: vec![None; max_level + 1],
            slots: Vec::new(),
            free: vec![],
        }
    }

    fn alloc(&mut self, entry: Entry<K, V>) -> Index {
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(entry);
            index
        } else {
            self.slots.push(Some(entry));
            self.slots.len() - 1
        }
    }

    fn release(&mut self, index: Index) -> Entry<K, V> {
        match self.slots[index].take() {
            Some(entry) => {
                self.free.push(index);
                entry
            }
            None => panic!("entry {} released twice", index),
        }
    }

    fn forward(&self, at: Position, level: usize) -> Option<Index> {
        match at {
            Position::Head => self.head[level],
            Position::Entry(index) => self[index].forward[level],
        }
    }

    fn set_forward(&mut self, at: Position, level: usize, link: Option<Index>) {
        match at {
            Position::Head => self.head[level] = link,
            Position::Entry(index) => self[index].forward[level] = link,
        }
    }
}

impl<K, V> std::ops::Index<Index> for Entries<K, V> {
    type Output = Entry<K, V>;

    fn index(&self, index: Index) -> &Self::Output {
        match &self.slots[index] {
            Some(entry) => entry,
            None => panic!("link to released entry {}", index),
        }
    }
}

impl<K, V> std::ops::IndexMut<Index> for Entries<K, V> {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        match &mut self.slots[index] {
            Some(entry) => entry,
            None => panic!("link to released entry {}", index),
        }
    }
}

/// Outcome of [`SkipList::insert`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStatus {
    /// The key was new and an entry was created.
    Inserted,
    /// The key existed; only its value changed.
    Updated,
}

/// Outcome of [`SkipList::delete`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted,
    NotFound,
}

/// A single-threaded skip list map. Mutation needs `&mut self`; wrap it in a
/// [`MemTable`](crate::MemTable) to share it between threads.
#[derive(Debug)]
pub struct SkipList<K, V> {
    entries: Entries<K, V>,
    levels: LevelGenerator,
    top_level: usize,
    count: usize,
}

impl<K: Ord, V> SkipList<K, V> {
    /// # Panics
    ///
    /// Panics if `max_level` is 0.
    pub fn new(max_level: usize) -> Self {
        Self::with_levels(LevelGenerator::new(max_level))
    }

    /// Like [`SkipList::new`], with reproducible level assignment.
    pub fn with_seed(max_level: usize, seed: u64) -> Self {
        Self::with_levels(LevelGenerator::with_seed(max_level, seed))
    }

    pub fn with_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::with_levels(config.level_generator()?))
    }

    pub fn with_levels(levels: LevelGenerator) -> Self {
        assert!(levels.max_level() >= 1, "max_level must be at least 1");
        SkipList {
            entries: Entries::new(levels.max_level()),
            levels,
            top_level: 0,
            count: 0,
        }
    }

    pub fn max_level(&self) -> usize {
        self.levels.max_level()
    }

    /// Highest level that currently holds at least one entry.
    pub fn top_level(&self) -> usize {
        self.top_level
    }

    pub fn size(&self) -> usize {
        self.count
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Descends from `top_level` to level 0, moving right while the next key
    /// is strictly less than `key`. `visit` sees the last position reached on
    /// each level, i.e. the predecessor of `key` there. Returns the level-0
    /// successor of the final predecessor.
    fn walk<Q>(&self, key: &Q, mut visit: impl FnMut(usize, Position)) -> Option<Index>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = Position::Head;
        for level in (0..=self.top_level).rev() {
            while let Some(next) = self.entries.forward(current, level) {
                if self.entries[next].key.borrow() < key {
                    current = Position::Entry(next);
                } else {
                    break;
                }
            }
            visit(level, current);
        }
        self.entries.forward(current, 0)
    }

    fn find<Q>(&self, key: &Q) -> Option<Index>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.walk(key, |_, _| {})
            .filter(|&index| self.entries[index].key.borrow() == key)
    }

    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|index| &self.entries[index].value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Inserts `key`, or overwrites its value if it is already present. An
    /// overwrite keeps the entry's level and position.
    pub fn insert(&mut self, key: K, value: V) -> InsertStatus {
        // Slots above top_level stay at Head, which is what a taller entry
        // needs as its predecessor on the new levels.
        let mut update = vec![Position::Head; self.max_level() + 1];
        let candidate = self.walk(&key, |level, at| update[level] = at);

        if let Some(index) = candidate {
            let entry = &mut self.entries[index];
            if entry.key == key {
                entry.value = value;
                return InsertStatus::Updated;
            }
        }

        let level = self.levels.next_level();
        if level > self.top_level {
            self.top_level = level;
        }

        let index = self.entries.alloc(Entry {
            key,
            value,
            forward: vec![None; level + 1],
        });
        for (i, &at) in update.iter().enumerate().take(level + 1) {
            let next = self.entries.forward(at, i);
            self.entries[index].forward[i] = next;
            self.entries.set_forward(at, i, Some(index));
        }

        self.count += 1;
        InsertStatus::Inserted
    }

    /// Unlinks `key` and hands back its entry.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut update = vec![Position::Head; self.max_level() + 1];
        let target = match self.walk(key, |level, at| update[level] = at) {
            Some(index) if self.entries[index].key.borrow() == key => index,
            _ => return None,
        };

        // An entry is linked on a contiguous run of levels starting at 0, so
        // the first predecessor that does not point at it ends the run.
        for (level, &at) in update.iter().enumerate().take(self.top_level + 1) {
            if self.entries.forward(at, level) != Some(target) {
                break;
            }
            let next = self.entries[target].forward[level];
            self.entries.set_forward(at, level, next);
        }

        while self.top_level > 0 && self.entries.head[self.top_level].is_none() {
            self.top_level -= 1;
        }

        let entry = self.entries.release(target);
        self.count -= 1;
        Some((entry.key, entry.value))
    }

    pub fn delete<Q>(&mut self, key: &Q) -> DeleteStatus
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.remove(key) {
            Some(_) => DeleteStatus::Deleted,
            None => DeleteStatus::NotFound,
        }
    }
}

impl<K, V> SkipList<K, V> {
    /// Ascending walk over level 0.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.level_iter(0),
            len: self.count,
        }
    }

    /// Walks the chain of a single level.
    ///
    /// # Panics
    ///
    /// Panics if `level` exceeds `max_level`.
    pub fn level_iter(&self, level: usize) -> LevelIter<'_, K, V> {
        LevelIter {
            entries: &self.entries,
            next: self.entries.head[level],
            level,
        }
    }

    /// First level-0 position, for walks that cannot hold a borrow.
    pub(crate) fn first(&self) -> Option<Index> {
        self.entries.head[0]
    }

    /// The entry at `at` and the level-0 position after it. Positions stay
    /// valid only while the list is not mutated.
    pub(crate) fn step(&self, at: Index) -> (&K, &V, Option<Index>) {
        let entry = &self.entries[at];
        (&entry.key, &entry.value, entry.forward[0])
    }

    /// Slots ever handed out by the arena, live or free.
    #[cfg(test)]
    fn allocated(&self) -> usize {
        self.entries.slots.len()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a SkipList<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> Extend<(K, V)> for SkipList<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (key, value) in iter {
            let _ = self.insert(key, value);
        }
    }
}

pub struct LevelIter<'a, K, V> {
    entries: &'a Entries<K, V>,
    next: Option<Index>,
    level: usize,
}

impl<'a, K, V> Iterator for LevelIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let entry = &self.entries[index];
        self.next = entry.forward[self.level];
        Some((&entry.key, &entry.value))
    }
}

pub struct Iter<'a, K, V> {
    inner: LevelIter<'a, K, V>,
    len: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        self.len -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for SkipList<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*****Skip List*****")?;
        for level in (0..=self.top_level).rev() {
            write!(f, "[Level {}] ", level)?;
            for (key, value) in self.level_iter(level) {
                write!(f, "{}:{}; ", key, value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
