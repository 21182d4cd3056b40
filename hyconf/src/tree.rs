//! The property tree: named sections of nested tables.
//!
//! Each section is held behind an `Arc<RwLock<_>>` so that an inheriting
//! section (`[child:parent]`) can share its parent's table. A write through
//! either name is visible through both until [`PropertyTree::detach`] gives
//! the child its own copy.

use crate::options::DEFAULT_SECTION;
use crate::value::{Table, Value};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// A section table that may be shared between several section names.
pub type SharedTable = Arc<RwLock<Table>>;

/// One step of an address into a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Enter the table stored under this key.
    Key(String),
    /// Enter this element of a list.
    Index(usize),
}

/// Ordered map from section name to section table.
#[derive(Debug)]
pub struct PropertyTree {
    sections: IndexMap<String, SharedTable>,
}

pub(crate) fn read(table: &SharedTable) -> RwLockReadGuard<'_, Table> {
    table.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write(table: &SharedTable) -> RwLockWriteGuard<'_, Table> {
    table.write().unwrap_or_else(PoisonError::into_inner)
}

impl PropertyTree {
    /// Creates a tree holding only the empty default section.
    pub fn new() -> Self {
        let mut sections = IndexMap::new();
        sections.insert(DEFAULT_SECTION.to_string(), SharedTable::default());
        PropertyTree { sections }
    }

    /// Section names in the order they were first declared.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn contains_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Returns a handle to the section table, if the section exists.
    pub fn section(&self, name: &str) -> Option<SharedTable> {
        self.sections.get(name).cloned()
    }

    /// Returns the section table, creating an empty one if needed.
    pub fn ensure_section(&mut self, name: &str) -> SharedTable {
        self.sections
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(section = name, "creating section");
                SharedTable::default()
            })
            .clone()
    }

    /// Makes `child` share `parent`'s table, creating `parent` if needed.
    ///
    /// Returns `false` and changes nothing when `child` is empty, equal to
    /// `parent`, or already declared.
    pub fn alias(&mut self, child: &str, parent: &str) -> bool {
        if child.is_empty() || child == parent || self.sections.contains_key(child) {
            return false;
        }
        let table = self.ensure_section(parent);
        self.sections.insert(child.to_string(), table);
        debug!(section = child, parent, "section inherits parent table");
        true
    }

    /// Whether two section names resolve to the same table.
    pub fn shares_table(&self, a: &str, b: &str) -> bool {
        match (self.sections.get(a), self.sections.get(b)) {
            (Some(x), Some(y)) => Arc::ptr_eq(x, y),
            _ => false,
        }
    }

    /// Gives `name` a private deep copy of its table, ending any sharing.
    ///
    /// Returns `false` if the section does not exist.
    pub fn detach(&mut self, name: &str) -> bool {
        let Some(shared) = self.sections.get_mut(name) else {
            return false;
        };
        let copy = read(shared).clone();
        *shared = Arc::new(RwLock::new(copy));
        true
    }

    /// Returns a copy of the section table.
    pub fn snapshot(&self, name: &str) -> Option<Table> {
        self.sections.get(name).map(|table| read(table).clone())
    }

    /// Returns a copy of the value at a dotted `path` inside `section`.
    ///
    /// An empty path returns the whole section as a table.
    pub fn lookup(&self, section: &str, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        self.lookup_path(section, &segments)
    }

    /// Like [`lookup`](Self::lookup), with the path already split into
    /// segments. Segments may contain dots.
    pub fn lookup_path<S: AsRef<str>>(&self, section: &str, segments: &[S]) -> Option<Value> {
        let table = self.sections.get(section)?;
        let guard = read(table);
        let Some((head, rest)) = segments.split_first() else {
            return Some(Value::Table(guard.clone()));
        };

        guard.get(head.as_ref())?.get_path(rest).cloned()
    }

    /// Writes `value` under `key` (already split into segments) at `address`
    /// inside `section`. Missing tables along the way are created.
    pub fn assign(&mut self, section: &str, address: &[Step], key: &[String], value: Value) {
        let shared = self.ensure_section(section);
        let mut guard = write(&shared);
        let table = descend(&mut guard, address);
        insert_path(table, key, value);
    }

    /// Makes sure the table at `address` exists.
    pub fn touch(&mut self, section: &str, address: &[Step]) {
        let shared = self.ensure_section(section);
        let mut guard = write(&shared);
        descend(&mut guard, address);
    }

    /// Appends `item` to the list at `address` inside `section` and returns
    /// its index. A non-list at that address is replaced by a new list.
    pub fn push_item(&mut self, section: &str, address: &[Step], item: Value) -> usize {
        let shared = self.ensure_section(section);
        let mut guard = write(&shared);
        let Some((last, parent)) = address.split_last() else {
            return 0;
        };
        let table = descend(&mut guard, parent);
        let slot = match last {
            Step::Key(key) => table.entry(key.clone()).or_insert_with(|| Value::List(Vec::new())),
            Step::Index(_) => return 0,
        };
        let items = ensure_list(slot);
        items.push(item);
        items.len() - 1
    }

    /// Opens the element of an array-of-tables header `path` selected by the
    /// header counters, and returns its address in `section`.
    pub fn open_array_table(&mut self, section: &str, path: &[String], counters: &[usize]) -> Vec<Step> {
        let shared = self.ensure_section(section);
        let mut guard = write(&shared);
        let mut steps = Vec::new();
        open_array_level(&mut guard, path, counters, 0, &mut steps);
        steps
    }

    /// Resolves a `[a.b]` header nested inside an array-of-tables element.
    ///
    /// Each list met along `path` is entered through its last element.
    pub fn open_sub_table(&mut self, section: &str, path: &[String]) -> Vec<Step> {
        let shared = self.ensure_section(section);
        let mut guard = write(&shared);
        let mut steps = Vec::new();
        let mut table: &mut Table = &mut guard;

        for key in path {
            steps.push(Step::Key(key.clone()));
            let slot = table.entry(key.clone()).or_insert_with(Value::table);
            table = match slot {
                Value::List(items) => {
                    if items.is_empty() {
                        items.push(Value::table());
                    }
                    let last = items.len() - 1;
                    steps.push(Step::Index(last));
                    ensure_table(&mut items[last])
                }
                other => ensure_table(other),
            };
        }

        steps
    }

    /// Merges all sections into one table.
    ///
    /// Keys of the default section come first; every other section appears as
    /// a nested table unless a default key of the same name shadows it.
    pub fn merged(&self) -> Table {
        let mut root = self.snapshot(DEFAULT_SECTION).unwrap_or_default();
        for (name, table) in &self.sections {
            if name == DEFAULT_SECTION || root.contains_key(name) {
                continue;
            }
            root.insert(name.clone(), Value::Table(read(table).clone()));
        }
        root
    }
}

impl Default for PropertyTree {
    fn default() -> Self {
        PropertyTree::new()
    }
}

impl Serialize for PropertyTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (name, table) in &self.sections {
            map.serialize_entry(name, &*read(table))?;
        }
        map.end()
    }
}

/// Walks `address` from `table`, creating tables and padding lists as needed.
pub(crate) fn descend<'t>(table: &'t mut Table, address: &[Step]) -> &'t mut Table {
    let Some((first, rest)) = address.split_first() else {
        return table;
    };

    match first {
        Step::Key(key) => {
            let slot = table.entry(key.clone()).or_insert_with(Value::table);
            match rest.split_first() {
                Some((Step::Index(index), rest)) => {
                    let items = ensure_list(slot);
                    while items.len() <= *index {
                        items.push(Value::table());
                    }
                    descend(ensure_table(&mut items[*index]), rest)
                }
                _ => descend(ensure_table(slot), rest),
            }
        }
        Step::Index(_) => descend(table, rest),
    }
}

/// Inserts `value` at the dotted key `path` below `table`.
///
/// Intermediate segments become tables; a scalar or list in the way is
/// replaced.
pub(crate) fn insert_path(table: &mut Table, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = table;
    for key in parents {
        let slot = current.entry(key.clone()).or_insert_with(Value::table);
        current = ensure_table(slot);
    }
    current.insert(last.clone(), value);
}

fn open_array_level(table: &mut Table, path: &[String], counters: &[usize], depth: usize, steps: &mut Vec<Step>) {
    let Some(key) = path.get(depth) else {
        return;
    };
    steps.push(Step::Key(key.clone()));
    let wanted = counters.get(depth).copied().unwrap_or(0);

    if depth + 1 == path.len() {
        let slot = table.entry(key.clone()).or_insert_with(|| Value::List(Vec::new()));
        let items = ensure_list(slot);
        let index = wanted.saturating_sub(1);
        while items.len() <= index {
            items.push(Value::table());
        }
        steps.push(Step::Index(index));
        ensure_table(&mut items[index]);
        return;
    }

    let slot = table.entry(key.clone()).or_insert_with(Value::table);
    match slot {
        Value::List(items) => {
            if items.is_empty() {
                items.push(Value::table());
            }
            let last = items.len() - 1;
            let index = if wanted == 0 { last } else { (wanted - 1).min(last) };
            steps.push(Step::Index(index));
            open_array_level(ensure_table(&mut items[index]), path, counters, depth + 1, steps);
        }
        other => open_array_level(ensure_table(other), path, counters, depth + 1, steps),
    }
}

fn ensure_table(slot: &mut Value) -> &mut Table {
    if !slot.is_table() {
        *slot = Value::table();
    }
    match slot {
        Value::Table(table) => table,
        _ => unreachable!("slot was just replaced by a table"),
    }
}

fn ensure_list(slot: &mut Value) -> &mut Vec<Value> {
    if !slot.is_list() {
        *slot = Value::List(Vec::new());
    }
    match slot {
        Value::List(items) => items,
        _ => unreachable!("slot was just replaced by a list"),
    }
}
