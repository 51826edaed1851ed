//! Cell, batch, and version types.

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;

/// A row key. Rows are opaque byte sequences totally ordered by
/// lexicographic byte comparison.
pub type Row = Vec<u8>;

/// A column qualifier within a row.
pub type Column = Vec<u8>;

/// Per-column version lists, newest first.
pub type ColumnVersions = BTreeMap<Column, Vec<(Version, Bytes)>>;

/// Version stamp of a single cell write.
///
/// Versions are the write pointers of the transactions that produced them:
/// globally monotonic u64 identifiers assigned by an external coordinator,
/// used in place of wall-clock time for ordering. The store never allocates
/// versions itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(pub u64);

impl Version {
    /// The smallest version.
    pub const ZERO: Self = Self(0);
    /// The largest version; upper bound for unconstrained reads.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a new version stamp.
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    /// Returns the raw stamp value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v:{}", self.0)
    }
}

/// The column family all core data is confined to.
///
/// The store partitions data into a fixed data family; sibling families
/// (metadata and the like) are other layers' concern and never touched
/// through this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFamily(String);

impl ColumnFamily {
    /// Creates a family with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the family name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for ColumnFamily {
    fn default() -> Self {
        Self("d".to_string())
    }
}

impl fmt::Display for ColumnFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single versioned cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedCell {
    /// Row key.
    pub row: Row,
    /// Column qualifier.
    pub column: Column,
    /// Version stamp.
    pub version: Version,
    /// Opaque payload bytes.
    pub payload: Bytes,
}

/// A set of row/column writes persisted together at one version.
///
/// This is the unit of commit-flush: the table client drains its write
/// buffer into a batch and the store stamps every cell with the writing
/// transaction's write pointer. Rows iterate in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    rows: BTreeMap<Row, BTreeMap<Column, Bytes>>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a batch from an already-ordered row map.
    #[must_use]
    pub fn from_rows(rows: BTreeMap<Row, BTreeMap<Column, Bytes>>) -> Self {
        Self { rows }
    }

    /// Adds a cell payload, replacing any previous payload for the same
    /// (row, column).
    pub fn insert(&mut self, row: Row, column: Column, payload: Bytes) {
        self.rows.entry(row).or_default().insert(column, payload);
    }

    /// Returns `true` if the batch holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of rows in the batch.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the total number of cells in the batch.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Iterates rows in ascending key order.
    pub fn rows(&self) -> impl Iterator<Item = (&Row, &BTreeMap<Column, Bytes>)> {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_ordering() {
        assert!(Version::new(1) < Version::new(2));
        assert!(Version::ZERO < Version::MAX);
    }

    #[test]
    fn version_display() {
        assert_eq!(format!("{}", Version::new(42)), "v:42");
    }

    #[test]
    fn default_family_is_data() {
        assert_eq!(ColumnFamily::default().name(), "d");
    }

    #[test]
    fn batch_insert_replaces() {
        let mut batch = WriteBatch::new();
        batch.insert(b"r".to_vec(), b"c".to_vec(), Bytes::from_static(b"one"));
        batch.insert(b"r".to_vec(), b"c".to_vec(), Bytes::from_static(b"two"));

        assert_eq!(batch.cell_count(), 1);
        let (_, columns) = batch.rows().next().unwrap();
        assert_eq!(columns.get(b"c".as_ref()).unwrap().as_ref(), b"two");
    }

    #[test]
    fn batch_rows_iterate_in_key_order() {
        let mut batch = WriteBatch::new();
        batch.insert(b"b".to_vec(), b"c".to_vec(), Bytes::new());
        batch.insert(b"a".to_vec(), b"c".to_vec(), Bytes::new());
        batch.insert(b"c".to_vec(), b"c".to_vec(), Bytes::new());

        let keys: Vec<_> = batch.rows().map(|(r, _)| r.clone()).collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn empty_batch() {
        let batch = WriteBatch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.row_count(), 0);
        assert_eq!(batch.cell_count(), 0);
    }
}
