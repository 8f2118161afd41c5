//! Quad store storage layer.
//!
//! Persists quads in a single redb file and maintains one duplicate-sorted
//! index per quad position so any position can be scanned by id.
//!
//! # File Layout
//!
//! - `node_ids` / `node_names`: value interning, both directions
//! - `node_sizes`: live quad reference count per node
//! - `quads`: primary index, quad key -> horizon of the add
//! - `idx_*`: one table per index order, entries `prefix || quad key`
//! - `index_counts`: entry count per (order, prefix)
//! - `meta`: horizon, size, live node count, next id
//!
//! # Usage
//!
//! ```no_run
//! use quadstore::config::StoreConfig;
//! use quadstore::storage::{QuadStore, Writer};
//! use quadstore::types::{Direction, Quad};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = QuadStore::open_or_create("graph.redb".as_ref(), &StoreConfig::default())?;
//!
//! let mut writer = Writer::new(&store);
//! writer.add_quad(&Quad::new("alice", "follows", "bob", ""))?;
//!
//! let bob = store.value_of("bob")?;
//! let mut followers = store.quad_iterator(Direction::Object, bob);
//! while followers.next()? {
//!     if let Some(result) = followers.result() {
//!         println!("{}", store.quad(result)?);
//!     }
//! }
//! store.close();
//! # Ok(())
//! # }
//! ```

mod engine;
mod indexes;
mod multi;
pub(crate) mod nodes;
mod store;
pub(crate) mod tables;
mod values;
mod writer;

pub use engine::{Engine, EngineError, Snapshot};
pub use indexes::{IndexOrder, IndexSet, PrimaryIndex};
pub use multi::{Multi, MultiError, Stride};
pub use store::{Lookup, QuadStore, StoreError};
pub use values::ValueCodec;
pub use writer::{AddOutcome, RemoveOutcome, Writer, WriterError, WriterOptions};
