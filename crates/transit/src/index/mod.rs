//! Identifier indexing and search-as-you-type.

pub mod trie;

pub use trie::PrefixIndex;
