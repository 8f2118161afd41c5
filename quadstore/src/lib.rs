#![cfg_attr(test, allow(clippy::disallowed_methods))]
// unwrap() and expect() are denied workspace-wide; test code may use them.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

// Storage layer for a quad-based graph database.
//
// Life of a write:
// 1. Writer receives a quad
// 2. Values are interned to node ids
// 3. The quad key is recorded in the primary index and every index order
// 4. Node reference counts, size and horizon are updated in one commit
//
// Life of a query:
// 1. Build an iterator tree from the store's factories
// 2. Optimize it
// 3. Drive `next`, reading index pages through a held snapshot
// 4. Materialize results with `QuadStore::quad` / `QuadStore::name_of`

pub mod config;
pub mod iterator;
pub mod storage;
pub mod types;
