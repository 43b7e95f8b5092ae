//! RocksDB column family definitions.
//!
//! Each document collection is a column family keyed by document id (UTF-8
//! bytes). The default bytewise comparator gives `scan` its id order.
//!
//! | Name | Contents | Key | Value |
//! |------|----------|-----|-------|
//! | assets | Fingerprinted asset records | asset id | JSON object |

use rocksdb::{BlockBasedOptions, Cache, ColumnFamilyDescriptor, Options};

/// Column family name constants.
pub mod cf_names {
    /// Asset records.
    pub const ASSETS: &str = "assets";

    /// Every collection column family.
    pub const ALL: &[&str] = &[ASSETS];
}

/// Options for a document collection: bloom filter for point lookups,
/// shared block cache, LZ4 compression.
pub fn document_options(cache: &Cache) -> Options {
    let mut block_opts = BlockBasedOptions::default();
    block_opts.set_block_cache(cache);
    block_opts.set_bloom_filter(10.0, false);
    block_opts.set_cache_index_and_filter_blocks(true);

    let mut opts = Options::default();
    opts.set_block_based_table_factory(&block_opts);
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
    opts
}

/// Descriptors for every collection in [`cf_names::ALL`].
pub fn get_column_family_descriptors(cache: &Cache) -> Vec<ColumnFamilyDescriptor> {
    cf_names::ALL
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, document_options(cache)))
        .collect()
}
