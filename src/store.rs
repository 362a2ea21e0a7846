//! Local ordered key/value store: a thin, explicit contract over `redb`
//! (buckets, put/get/delete, half-open range scans) plus the range-hash
//! digest used by reconciliation.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use redb::{Database, ReadableTable, TableDefinition};
use twox_hash::XxHash64;

use std::hash::Hasher;

use crate::error::{DepotError, DepotResult};

/// One endpoint of a range: a concrete key, or the unbounded minimum/maximum
/// sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Edge {
    /// The unbounded minimum (smaller than every key).
    First,
    /// The unbounded maximum (larger than every key).
    Last,
    /// A concrete key.
    Key(Vec<u8>),
}

impl Edge {
    /// Build an `Edge::Key` from any byte-convertible value.
    pub fn key(bytes: impl Into<Vec<u8>>) -> Edge {
        Edge::Key(bytes.into())
    }
}

/// A digest over a half-open key range: a hex checksum, a count, and the
/// median key (empty when the range is empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeDigest {
    pub digest: String,
    pub median: Vec<u8>,
    pub count: u64,
}

/// `(lower, upper)` bounds implementing the half-open `[first, last)`
/// convention, including the `first == Last` / `last == First` degenerate
/// (always-empty) cases.
fn range_bounds<'a>(first: &'a Edge, last: &'a Edge) -> (Bound<&'a [u8]>, Bound<&'a [u8]>) {
    if matches!(first, Edge::Last) || matches!(last, Edge::First) {
        return (Bound::Excluded(&[][..]), Bound::Excluded(&[][..]));
    }
    let lower = match first {
        Edge::First => Bound::Unbounded,
        Edge::Key(k) => Bound::Included(k.as_slice()),
        Edge::Last => unreachable!(),
    };
    let upper = match last {
        Edge::Last => Bound::Unbounded,
        Edge::Key(k) => Bound::Excluded(k.as_slice()),
        Edge::First => unreachable!(),
    };
    (lower, upper)
}

/// Local ordered store. Buckets are `redb` tables of raw byte strings, named
/// at call time rather than as fixed table constants, since bucket names are
/// a runtime value at this layer.
#[derive(Clone)]
pub struct Store {
    db: Arc<RwLock<Database>>,
    // Interned bucket names: redb's TableDefinition needs a `'static` name,
    // but bucket names only become known at runtime. Each distinct name is
    // leaked exactly once and the resulting `&'static str` reused for every
    // subsequent call, so opening the same bucket repeatedly does not grow
    // unbounded memory.
    bucket_names: Arc<RwLock<std::collections::HashMap<String, &'static str>>>,
}

/// Map a table-open failure to `NoSuchBucket` when the bucket was never
/// created, preserving other `redb` failures unchanged.
fn map_table_err(bucket: &str, err: redb::TableError) -> DepotError {
    match err {
        redb::TableError::TableDoesNotExist(_) => DepotError::NoSuchBucket(bucket.to_string()),
        other => DepotError::Table(other),
    }
}

impl Store {
    fn table_for(&self, name: &str) -> TableDefinition<'static, &'static [u8], &'static [u8]> {
        if let Some(interned) = self.bucket_names.read().get(name) {
            return TableDefinition::new(interned);
        }
        let mut names = self.bucket_names.write();
        let interned = *names
            .entry(name.to_string())
            .or_insert_with(|| Box::leak(name.to_string().into_boxed_str()));
        TableDefinition::new(interned)
    }
}

impl Store {
    /// Open (creating if absent) a store at `path`, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> DepotResult<Store> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Ok(Store {
            db: Arc::new(RwLock::new(db)),
            bucket_names: Arc::new(RwLock::new(std::collections::HashMap::new())),
        })
    }

    /// Idempotently create a bucket.
    pub fn create_bucket(&self, bucket: &str) -> DepotResult<()> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(self.table_for(bucket))?;
        }
        write_txn.commit()?;
        tracing::debug!(bucket, "bucket created");
        Ok(())
    }

    /// Write `key -> value`, overwriting any existing value.
    pub fn put(&self, bucket: &str, key: &[u8], value: &[u8]) -> DepotResult<()> {
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(self.table_for(bucket))?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Read the value for `key`, or `NoSuchKey`.
    pub fn get(&self, bucket: &str, key: &[u8]) -> DepotResult<Vec<u8>> {
        let db = self.db.read();
        let read_txn = db.begin_read()?;
        let table = read_txn
            .open_table(self.table_for(bucket))
            .map_err(|e| map_table_err(bucket, e))?;
        match table.get(key)? {
            Some(value) => Ok(value.value().to_vec()),
            None => Err(DepotError::NoSuchKey),
        }
    }

    /// Delete `key`, no error if absent. Errors with `NoSuchBucket` rather
    /// than silently creating the bucket, since `redb`'s write-side
    /// `open_table` would otherwise create it on demand.
    pub fn delete(&self, bucket: &str, key: &[u8]) -> DepotResult<()> {
        {
            let db = self.db.read();
            let read_txn = db.begin_read()?;
            read_txn
                .open_table(self.table_for(bucket))
                .map_err(|e| map_table_err(bucket, e))?;
        }
        let db = self.db.read();
        let write_txn = db.begin_write()?;
        {
            let mut table = write_txn.open_table(self.table_for(bucket))?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// The ordered keys in the half-open range `[first, last)`.
    pub fn scan_keys(&self, bucket: &str, first: &Edge, last: &Edge) -> DepotResult<Vec<Vec<u8>>> {
        let db = self.db.read();
        let read_txn = db.begin_read()?;
        let table = read_txn
            .open_table(self.table_for(bucket))
            .map_err(|e| map_table_err(bucket, e))?;
        let (lower, upper) = range_bounds(first, last);
        let mut keys = Vec::new();
        for entry in table.range((lower, upper))? {
            let (k, _) = entry?;
            keys.push(k.value().to_vec());
        }
        Ok(keys)
    }

    /// Compute the range digest `(digest, median, count)` over
    /// `[first, last)`, within a single read transaction so both passes
    /// observe the same snapshot.
    pub fn range_digest(&self, bucket: &str, first: &Edge, last: &Edge) -> DepotResult<RangeDigest> {
        let db = self.db.read();
        let read_txn = db.begin_read()?;
        let table = read_txn
            .open_table(self.table_for(bucket))
            .map_err(|e| map_table_err(bucket, e))?;
        let (lower, upper) = range_bounds(first, last);

        let mut hasher = XxHash64::with_seed(0);
        let mut count: u64 = 0;
        for entry in table.range((lower.clone(), upper.clone()))? {
            let (k, _) = entry?;
            hasher.write(k.value());
            count += 1;
        }
        let digest = hex::encode(hasher.finish().to_be_bytes());

        let median_ordinal = count / 2;
        let mut median = Vec::new();
        if count > 0 {
            for (ordinal, entry) in table.range((lower, upper))?.enumerate() {
                if ordinal as u64 == median_ordinal {
                    let (k, _) = entry?;
                    median = k.value().to_vec();
                    break;
                }
            }
        }

        Ok(RangeDigest {
            digest,
            median,
            count,
        })
    }
}
