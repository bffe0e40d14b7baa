//! ports consumed by this crate: the transactional relational store and its
//! per-aggregate CRUD surface. No implementation ships here except the
//! `testing::FakeDatabasePort` behind the `test-support` feature.

mod database;

pub use database::*;
