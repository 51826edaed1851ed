//! The visibility filter.
//!
//! Pure resolution of a column's version set under a transaction
//! descriptor. Resolution never fails: a column with no visible version is
//! simply absent.

use crate::cell::{unwrap_payload, Lookup};
use crate::descriptor::TransactionDescriptor;
use crate::error::CoreResult;
use bytes::Bytes;
use std::collections::BTreeMap;
use strata_store::{Column, ColumnVersions, Version};

/// Returns the single visible stored payload among `versions`, or `None`.
///
/// `versions` must be ordered newest first, as the store returns them. The
/// scan skips any version above the descriptor's read pointer or in its
/// exclusion list and stops at the first survivor. The returned payload is
/// still wrapped; the caller decides whether to unwrap tombstones.
#[must_use]
pub fn resolve<'a>(
    versions: &'a [(Version, Bytes)],
    descriptor: &TransactionDescriptor,
) -> Option<&'a Bytes> {
    versions
        .iter()
        .find(|(version, _)| descriptor.is_visible(*version))
        .map(|(_, payload)| payload)
}

/// Resolves a column's version set to its logical value.
///
/// Applies [`resolve`], then unwraps the survivor: a tombstone reports
/// [`Lookup::Deleted`], no survivor reports [`Lookup::Absent`].
///
/// # Errors
///
/// Returns an error only if the surviving payload carries an unrecognized
/// encoding tag.
pub fn resolve_cell(
    versions: &[(Version, Bytes)],
    descriptor: &TransactionDescriptor,
) -> CoreResult<Lookup> {
    match resolve(versions, descriptor) {
        Some(payload) => Ok(match unwrap_payload(payload)? {
            Some(value) => Lookup::Value(value),
            None => Lookup::Deleted,
        }),
        None => Ok(Lookup::Absent),
    }
}

/// Resolves every column of a row, keeping live values only.
///
/// Columns that resolve to deleted or absent are dropped from the result,
/// mirroring how row reads unwrap deletes: the caller sees the row as it
/// logically exists under the snapshot.
///
/// # Errors
///
/// Returns an error if any surviving payload carries an unrecognized
/// encoding tag.
pub fn resolve_row(
    columns: &ColumnVersions,
    descriptor: &TransactionDescriptor,
) -> CoreResult<BTreeMap<Column, Bytes>> {
    let mut out = BTreeMap::new();
    for (column, versions) in columns {
        if let Lookup::Value(value) = resolve_cell(versions, descriptor)? {
            out.insert(column.clone(), value);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{wrap_delete, wrap_value};

    fn descriptor(read: u64, excluded: &[u64]) -> TransactionDescriptor {
        TransactionDescriptor::new(
            Version::new(read + 1),
            Version::new(read),
            excluded.iter().copied().collect(),
        )
    }

    fn wrapped(versions: &[(u64, &[u8])]) -> Vec<(Version, Bytes)> {
        versions
            .iter()
            .map(|(v, payload)| (Version::new(*v), wrap_value(payload)))
            .collect()
    }

    #[test]
    fn newest_in_range_wins() {
        let versions = wrapped(&[(9, b"nine"), (7, b"seven"), (5, b"five")]);
        let d = descriptor(9, &[]);
        assert_eq!(
            resolve_cell(&versions, &d).unwrap(),
            Lookup::Value(Bytes::from_static(b"nine"))
        );
    }

    #[test]
    fn read_pointer_hides_newer() {
        let versions = wrapped(&[(9, b"nine"), (7, b"seven")]);
        let d = descriptor(8, &[]);
        assert_eq!(
            resolve_cell(&versions, &d).unwrap(),
            Lookup::Value(Bytes::from_static(b"seven"))
        );
    }

    #[test]
    fn exclusion_steps_down_version_by_version() {
        let versions = wrapped(&[(9, b"nine"), (7, b"seven"), (5, b"five")]);

        let d = descriptor(9, &[9]);
        assert_eq!(
            resolve_cell(&versions, &d).unwrap(),
            Lookup::Value(Bytes::from_static(b"seven"))
        );

        let d = descriptor(9, &[9, 7]);
        assert_eq!(
            resolve_cell(&versions, &d).unwrap(),
            Lookup::Value(Bytes::from_static(b"five"))
        );

        let d = descriptor(9, &[9, 7, 5]);
        assert_eq!(resolve_cell(&versions, &d).unwrap(), Lookup::Absent);
    }

    #[test]
    fn tombstone_resolves_to_deleted() {
        let versions = vec![
            (Version::new(8), wrap_delete()),
            (Version::new(5), wrap_value(b"old")),
        ];
        let d = descriptor(9, &[]);
        assert_eq!(resolve_cell(&versions, &d).unwrap(), Lookup::Deleted);
    }

    #[test]
    fn excluded_tombstone_reveals_older_value() {
        let versions = vec![
            (Version::new(8), wrap_delete()),
            (Version::new(5), wrap_value(b"old")),
        ];
        let d = descriptor(9, &[8]);
        assert_eq!(
            resolve_cell(&versions, &d).unwrap(),
            Lookup::Value(Bytes::from_static(b"old"))
        );
    }

    #[test]
    fn empty_version_set_is_absent() {
        let d = descriptor(9, &[]);
        assert_eq!(resolve_cell(&[], &d).unwrap(), Lookup::Absent);
    }

    #[test]
    fn resolve_row_drops_deleted_and_hidden() {
        let mut columns = ColumnVersions::new();
        columns.insert(b"live".to_vec(), wrapped(&[(5, b"v")]));
        columns.insert(b"dead".to_vec(), vec![(Version::new(6), wrap_delete())]);
        columns.insert(b"future".to_vec(), wrapped(&[(11, b"unseen")]));

        let d = descriptor(9, &[]);
        let resolved = resolve_row(&columns, &d).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved.get(b"live".as_ref()).unwrap().as_ref(), b"v");
    }

    mod bounded_fetch {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Fetching only the newest `k + 1` in-range versions resolves
            /// to the same value as scanning full history.
            #[test]
            fn top_k_plus_one_suffices(
                stamps in proptest::collection::btree_set(1u64..60, 1..20),
                excluded in proptest::collection::btree_set(1u64..60, 0..8),
                read_pointer in 1u64..60,
            ) {
                let full: Vec<(Version, Bytes)> = stamps
                    .iter()
                    .rev()
                    .map(|&v| (Version::new(v), wrap_value(v.to_be_bytes().as_ref())))
                    .collect();
                let d = TransactionDescriptor::new(
                    Version::new(read_pointer + 1),
                    Version::new(read_pointer),
                    excluded.clone(),
                );

                // What the table client actually fetches: versions in range,
                // newest first, truncated at the fetch bound.
                let bounded: Vec<(Version, Bytes)> = full
                    .iter()
                    .filter(|(v, _)| *v <= d.read_pointer())
                    .take(d.fetch_bound())
                    .cloned()
                    .collect();

                prop_assert_eq!(
                    resolve(&bounded, &d).cloned(),
                    resolve(&full, &d).cloned()
                );
            }
        }
    }
}
