//! Calendar-versioned entity storage.

mod versioned;

pub use versioned::{AddOutcome, Lookup, StoreError, Version, VersionedStore};
