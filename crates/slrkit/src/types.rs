//! Utility types.

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Insertion-ordered map; iteration order is the order of first insertion.
pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;

/// Insertion-ordered set. Equality is set equality, independent of order.
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;
