//! String-to-value maps backed by a minimal automaton.
//!
//! A [`MafsaMapper`] pairs a [`MinTree`] over the keys with a
//! [`ValueStore`] holding the values in key order. A lookup walks the
//! automaton to the key's rank and reads the value at that position, so no
//! key is stored twice and shared prefixes and suffixes are stored once.
//!
//! # Example
//!
//! ```
//! use mafsa_mapper::prelude::*;
//!
//! let mapper = MafsaMapper::from_sorted_pairs(vec![
//!     ("app", "short".to_string()),
//!     ("apple", "fruit".to_string()),
//!     ("apply", "verb".to_string()),
//! ])
//! .unwrap();
//!
//! assert_eq!(mapper.get("apple").map(String::as_str), Some("fruit"));
//! assert_eq!(mapper.get("appl"), None);
//! ```

pub mod config;
pub mod hash_mapper;
pub mod value_store;

use self::config::{DuplicatePolicy, MapperConfig};
use self::value_store::ValueStore;
use crate::automaton::builder::MinTreeBuilder;
use crate::automaton::char_unit::CharUnit;
use crate::automaton::min_tree::MinTree;
use crate::error::{BuildError, Result};
use log::{debug, info};

/// Read-only key/value lookup.
///
/// Implementations are immutable once built and safe to query from many
/// threads at once.
pub trait Mapper<V> {
    /// Value stored for `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Option<&V>;

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// True if nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `key` is stored.
    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// A read-only map from strings to values with a small per-entry footprint.
///
/// Built once through a [`MapperBuilder`] from keys in sorted order, then
/// shared freely between readers.
#[derive(Clone, Debug)]
pub struct MafsaMapper<V = String, U: CharUnit = char> {
    tree: MinTree<U>,
    values: ValueStore<V>,
    from_field: Option<String>,
    to_field: Option<String>,
}

impl<V> MafsaMapper<V> {
    /// Build from `(key, value)` pairs already sorted by key, with the
    /// default configuration.
    ///
    /// # Errors
    ///
    /// Fails with [`BuildError::OutOfOrder`] on the first unsorted key.
    pub fn from_sorted_pairs<I, K>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
    {
        let mut builder = MapperBuilder::new();
        for (key, value) in pairs {
            builder.insert(key.as_ref(), value)?;
        }
        builder.build()
    }
}

impl<V, U: CharUnit> MafsaMapper<V, U> {
    /// Pair an automaton with a value store built from the same keys.
    ///
    /// # Errors
    ///
    /// Fails with [`BuildError::LengthMismatch`] if the store does not hold
    /// exactly one value per accepted key.
    pub fn from_parts(tree: MinTree<U>, values: ValueStore<V>) -> Result<Self> {
        if tree.len() != values.len() {
            return Err(BuildError::LengthMismatch {
                keys: tree.len(),
                values: values.len(),
            });
        }
        Ok(MafsaMapper {
            tree,
            values,
            from_field: None,
            to_field: None,
        })
    }

    /// Value stored for `key`.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.tree.lookup(key).and_then(|rank| self.values.get(rank))
    }

    /// Rank of `key` among the stored keys.
    pub fn rank(&self, key: &str) -> Option<usize> {
        self.tree.lookup(key)
    }

    /// Key and value stored at `rank`.
    pub fn get_by_rank(&self, rank: usize) -> Option<(String, &V)> {
        let value = self.values.get(rank)?;
        self.tree.key_at(rank).map(|key| (key, value))
    }

    /// Iterate `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &V)> + '_ {
        self.tree.keys().zip(self.values.iter())
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// The key automaton.
    pub fn automaton(&self) -> &MinTree<U> {
        &self.tree
    }

    /// The values in key order.
    pub fn values(&self) -> &ValueStore<V> {
        &self.values
    }

    /// Name of the key column, if the input source supplied one.
    pub fn from_field(&self) -> Option<&str> {
        self.from_field.as_deref()
    }

    /// Name of the value column, if the input source supplied one.
    pub fn to_field(&self) -> Option<&str> {
        self.to_field.as_deref()
    }

    /// Split into the automaton and its value store.
    pub fn into_parts(self) -> (MinTree<U>, ValueStore<V>) {
        (self.tree, self.values)
    }
}

impl<V, U: CharUnit> Mapper<V> for MafsaMapper<V, U> {
    fn get(&self, key: &str) -> Option<&V> {
        MafsaMapper::get(self, key)
    }

    fn len(&self) -> usize {
        self.tree.len()
    }
}

/// Builder feeding keys to the automaton and values to the store in
/// lockstep.
///
/// # Example
///
/// ```
/// use mafsa_mapper::prelude::*;
///
/// let mut builder = MapperBuilder::new()
///     .duplicate_policy(DuplicatePolicy::KeepLast)
///     .fields("word", "kind");
/// builder.insert("apple", "fruit").unwrap();
/// builder.insert("apple", "tree").unwrap();
/// builder.insert("apply", "verb").unwrap();
/// let mapper = builder.build().unwrap();
///
/// assert_eq!(mapper.get("apple"), Some(&"tree"));
/// assert_eq!(mapper.from_field(), Some("word"));
/// ```
pub struct MapperBuilder<V = String, U: CharUnit = char> {
    automaton: MinTreeBuilder<U>,
    values: ValueStore<V>,
    config: MapperConfig,
    // Records consumed so far, duplicates included
    records: usize,
    failed: bool,
}

impl<V> MapperBuilder<V> {
    /// Create a character-level builder with the default configuration.
    ///
    /// Use `MapperBuilder::<V, u8>::default()` for a byte-level automaton.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a character-level builder with the given configuration.
    pub fn with_config(config: MapperConfig) -> Self {
        Self::default().config(config)
    }
}

impl<V, U: CharUnit> MapperBuilder<V, U> {
    /// Replace the whole configuration.
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Set how repeated keys are handled.
    pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_policy = policy;
        self
    }

    /// Reload the automaton through its binary encoding when building.
    pub fn reload_through_codec(mut self, enabled: bool) -> Self {
        self.config.reload_through_codec = enabled;
        self
    }

    /// Record the names of the key and value columns.
    pub fn fields(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.config.from_field = Some(from.into());
        self.config.to_field = Some(to.into());
        self
    }

    /// Number of distinct keys inserted so far.
    pub fn len(&self) -> usize {
        self.automaton.len()
    }

    /// True if no key has been inserted.
    pub fn is_empty(&self) -> bool {
        self.automaton.is_empty()
    }

    /// Insert one entry. Keys must arrive in non-decreasing order.
    ///
    /// # Errors
    ///
    /// - [`BuildError::OutOfOrder`] if `key` sorts before the previous key.
    /// - [`BuildError::DuplicateKey`] for a repeated key under
    ///   [`DuplicatePolicy::Reject`].
    /// - [`BuildError::Aborted`] if an earlier insertion failed.
    pub fn insert(&mut self, key: &str, value: V) -> Result<()> {
        if self.failed {
            return Err(BuildError::Aborted);
        }
        let result = self.insert_entry(key, value);
        self.records += 1;
        result.map_err(|err| self.abort(err))
    }

    /// Insert entries from a fallible record source.
    ///
    /// The first record the source reports as malformed aborts construction
    /// with [`BuildError::Input`].
    pub fn extend_records<I, K, E>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = std::result::Result<(K, V), E>>,
        K: AsRef<str>,
        E: std::fmt::Display,
    {
        for record in records {
            match record {
                Ok((key, value)) => self.insert(key.as_ref(), value)?,
                Err(err) => {
                    let failure = BuildError::Input {
                        record: self.records,
                        message: err.to_string(),
                    };
                    return Err(self.abort(failure));
                }
            }
        }
        Ok(())
    }

    /// Finish construction.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Aborted`] if any insertion failed, or the
    /// encode/decode error if reloading through the codec fails.
    pub fn build(self) -> Result<MafsaMapper<V, U>> {
        if self.failed {
            return Err(BuildError::Aborted);
        }

        let MapperBuilder {
            automaton,
            mut values,
            config,
            records,
            ..
        } = self;

        let mut tree = automaton.finish()?;
        if config.reload_through_codec {
            let buffer = tree.encode()?;
            drop(tree);
            tree = MinTree::decode(&buffer)?;
            info!("reloaded automaton through {} encoded bytes", buffer.len());
        }
        values.shrink_to_fit();

        info!(
            "built mapper: {} entries from {} records, {} states",
            tree.len(),
            records,
            tree.state_count()
        );

        let mut mapper = MafsaMapper::from_parts(tree, values)?;
        mapper.from_field = config.from_field;
        mapper.to_field = config.to_field;
        Ok(mapper)
    }

    fn insert_entry(&mut self, key: &str, value: V) -> Result<()> {
        if self.automaton.insert(key)? {
            self.values.push(value);
            return Ok(());
        }

        match self.config.duplicate_policy {
            DuplicatePolicy::KeepFirst => {
                debug!("duplicate key {key:?}: keeping first value");
            }
            DuplicatePolicy::KeepLast => {
                debug!("duplicate key {key:?}: keeping last value");
                if let Some(last) = self.values.last_mut() {
                    *last = value;
                }
            }
            DuplicatePolicy::Reject => {
                return Err(BuildError::DuplicateKey {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    fn abort(&mut self, err: BuildError) -> BuildError {
        self.failed = true;
        err
    }
}

impl<U: CharUnit> MapperBuilder<String, U> {
    /// Insert one entry from raw bytes, validating UTF-8 first.
    ///
    /// # Errors
    ///
    /// [`BuildError::InvalidUtf8`] if either field is not valid UTF-8, plus
    /// everything [`MapperBuilder::insert`] can return.
    pub fn insert_raw(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if self.failed {
            return Err(BuildError::Aborted);
        }
        let record = self.records;
        let decoded = std::str::from_utf8(key).and_then(|k| Ok((k, std::str::from_utf8(value)?)));
        match decoded {
            Ok((key, value)) => self.insert(key, value.to_string()),
            Err(source) => Err(self.abort(BuildError::InvalidUtf8 { record, source })),
        }
    }
}

impl<V, U: CharUnit> Default for MapperBuilder<V, U> {
    fn default() -> Self {
        MapperBuilder {
            automaton: MinTreeBuilder::default(),
            values: ValueStore::new(),
            config: MapperConfig::default(),
            records: 0,
            failed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fruit_mapper() -> MafsaMapper {
        MafsaMapper::from_sorted_pairs(vec![
            ("app", "short".to_string()),
            ("apple", "fruit".to_string()),
            ("apply", "verb".to_string()),
        ])
        .unwrap()
    }

    #[test]
    fn test_get_prefix_keys() {
        let mapper = fruit_mapper();
        assert_eq!(mapper.get("app").map(String::as_str), Some("short"));
        assert_eq!(mapper.get("apple").map(String::as_str), Some("fruit"));
        assert_eq!(mapper.get("apply").map(String::as_str), Some("verb"));
        assert_eq!(mapper.get("appl"), None);
        assert_eq!(mapper.get(""), None);
        assert_eq!(mapper.len(), 3);
    }

    #[test]
    fn test_iter_and_rank() {
        let mapper = fruit_mapper();
        let pairs: Vec<(String, String)> = mapper.iter().map(|(k, v)| (k, v.clone())).collect();
        assert_eq!(pairs[1], ("apple".to_string(), "fruit".to_string()));
        assert_eq!(mapper.rank("apply"), Some(2));
        let (key, value) = mapper.get_by_rank(0).unwrap();
        assert_eq!((key.as_str(), value.as_str()), ("app", "short"));
        assert!(mapper.get_by_rank(3).is_none());
    }

    #[test]
    fn test_empty_mapper() {
        let mapper: MafsaMapper = MapperBuilder::new().build().unwrap();
        assert!(mapper.is_empty());
        assert_eq!(mapper.get(""), None);
        assert_eq!(mapper.get("anything"), None);
    }

    #[test]
    fn test_duplicate_keep_first() {
        let mut builder = MapperBuilder::new();
        builder.insert("a", 1).unwrap();
        builder.insert("a", 2).unwrap();
        builder.insert("b", 3).unwrap();
        let mapper = builder.build().unwrap();
        assert_eq!(mapper.get("a"), Some(&1));
        assert_eq!(mapper.get("b"), Some(&3));
        assert_eq!(mapper.values().len(), 2);
    }

    #[test]
    fn test_duplicate_keep_last() {
        let mut builder = MapperBuilder::new().duplicate_policy(DuplicatePolicy::KeepLast);
        builder.insert("a", 1).unwrap();
        builder.insert("a", 2).unwrap();
        builder.insert("b", 3).unwrap();
        let mapper = builder.build().unwrap();
        assert_eq!(mapper.get("a"), Some(&2));
        assert_eq!(mapper.get("b"), Some(&3));
    }

    #[test]
    fn test_duplicate_reject_aborts() {
        let mut builder = MapperBuilder::new().duplicate_policy(DuplicatePolicy::Reject);
        builder.insert("a", 1).unwrap();
        assert!(matches!(
            builder.insert("a", 2),
            Err(BuildError::DuplicateKey { ref key }) if key == "a"
        ));
        assert!(matches!(builder.insert("b", 3), Err(BuildError::Aborted)));
        assert!(matches!(builder.build(), Err(BuildError::Aborted)));
    }

    #[test]
    fn test_out_of_order_aborts_build() {
        let mut builder = MapperBuilder::new();
        builder.insert("b", 1).unwrap();
        assert!(matches!(
            builder.insert("a", 2),
            Err(BuildError::OutOfOrder { .. })
        ));
        assert!(matches!(builder.build(), Err(BuildError::Aborted)));
    }

    #[test]
    fn test_insert_raw_rejects_invalid_utf8() {
        let mut builder: MapperBuilder = MapperBuilder::new();
        builder.insert_raw(b"alpha", b"first").unwrap();
        let err = builder.insert_raw(b"beta", &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, BuildError::InvalidUtf8 { record: 1, .. }));
        assert!(matches!(builder.build(), Err(BuildError::Aborted)));
    }

    #[test]
    fn test_extend_records_reports_input_error() {
        let records: Vec<std::result::Result<(&str, u32), String>> = vec![
            Ok(("a", 1)),
            Ok(("b", 2)),
            Err("expected 2 fields, found 3".to_string()),
            Ok(("c", 3)),
        ];
        let mut builder = MapperBuilder::new();
        let err = builder.extend_records(records).unwrap_err();
        match err {
            BuildError::Input { record, message } => {
                assert_eq!(record, 2);
                assert!(message.contains("fields"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(builder.build(), Err(BuildError::Aborted)));
    }

    #[test]
    fn test_reload_through_codec() {
        let mut builder = MapperBuilder::new()
            .reload_through_codec(true)
            .fields("zip", "city");
        let rows = [
            ("10001", "New York"),
            ("60601", "Chicago"),
            ("94105", "San Francisco"),
        ];
        for (zip, city) in rows {
            builder.insert(zip, city.to_string()).unwrap();
        }
        let mapper = builder.build().unwrap();
        assert_eq!(mapper.get("60601").map(String::as_str), Some("Chicago"));
        assert_eq!(mapper.get("99999"), None);
        assert_eq!(mapper.from_field(), Some("zip"));
        assert_eq!(mapper.to_field(), Some("city"));
    }

    #[test]
    fn test_from_parts_length_mismatch() {
        let tree = fruit_mapper().into_parts().0;
        let values: ValueStore<u8> = vec![1, 2].into();
        assert!(matches!(
            MafsaMapper::from_parts(tree, values),
            Err(BuildError::LengthMismatch { keys: 3, values: 2 })
        ));
    }

    #[test]
    fn test_byte_level_mapper() {
        let mut builder: MapperBuilder<u32, u8> = MapperBuilder::default();
        builder.insert("naïve", 1).unwrap();
        builder.insert("naïveté", 2).unwrap();
        let mapper = builder.build().unwrap();
        assert_eq!(mapper.get("naïve"), Some(&1));
        assert_eq!(mapper.get("naïveté"), Some(&2));
        assert_eq!(mapper.get("nai"), None);
    }
}
