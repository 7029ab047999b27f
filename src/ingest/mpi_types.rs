//! Reference `MpiTypeOracle`: a static table of the common scalar `MPI_*`
//! datatypes, following the teacher's convention of building static lookup
//! tables with `lazy_static` (`util/lazy_quantity.rs`, `polling/providers`).

use super::MpiTypeOracle;
use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref SCALAR_SIZES: HashMap<&'static str, u64> = {
        let mut sizes = HashMap::new();
        sizes.insert("CHAR", 1);
        sizes.insert("SIGNED_CHAR", 1);
        sizes.insert("UNSIGNED_CHAR", 1);
        sizes.insert("BYTE", 1);
        sizes.insert("WCHAR", 2);
        sizes.insert("SHORT", 2);
        sizes.insert("UNSIGNED_SHORT", 2);
        sizes.insert("INT", 4);
        sizes.insert("UNSIGNED", 4);
        sizes.insert("UNSIGNED_INT", 4);
        sizes.insert("FLOAT", 4);
        sizes.insert("LONG", 8);
        sizes.insert("UNSIGNED_LONG", 8);
        sizes.insert("LONG_LONG", 8);
        sizes.insert("LONG_LONG_INT", 8);
        sizes.insert("UNSIGNED_LONG_LONG", 8);
        sizes.insert("DOUBLE", 8);
        sizes.insert("LONG_DOUBLE", 16);
        sizes
    };
}

/// Table-based `MpiTypeOracle` covering the common scalar MPI datatypes.
/// Unknown names resolve to 0, matching the builder's "never treat 0
/// specially" contract (§6).
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticMpiTypeOracle;

impl MpiTypeOracle for StaticMpiTypeOracle {
    fn size_of(&self, name_without_prefix: &str) -> u64 {
        SCALAR_SIZES.get(name_without_prefix).copied().unwrap_or(0)
    }
}
