use serde::{Deserialize, Serialize};

use medq_core::{Record, RecordId};

/// Rows of one record kind, kept sorted by id.
///
/// Ids are handed out from a per-table counter that never goes backwards,
/// so appending keeps the order and lookups can binary-search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table<T> {
    #[serde(default = "first_id")]
    next_id: u64,
    #[serde(default = "Vec::new")]
    rows: Vec<T>,
}

fn first_id() -> u64 {
    1
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            rows: Vec::new(),
        }
    }
}

impl<T: Record> Table<T> {
    /// Allocate the next id and append the row built from it.
    pub fn insert_with(&mut self, build: impl FnOnce(RecordId) -> T) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        self.rows.push(build(id));
        id
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.rows.binary_search_by_key(&id, |row| row.id()).ok()
    }

    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.position(id).map(|index| &self.rows[index])
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut T> {
        self.position(id).map(move |index| &mut self.rows[index])
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.position(id).is_some()
    }

    pub fn remove(&mut self, id: RecordId) -> Option<T> {
        self.position(id).map(|index| self.rows.remove(index))
    }

    pub fn retain(&mut self, keep: impl FnMut(&T) -> bool) {
        self.rows.retain(keep);
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    /// Row ids must not be changed through this.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
