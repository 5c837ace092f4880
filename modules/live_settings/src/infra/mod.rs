//! Infrastructure - storage backends and read caches

pub mod cache;
pub mod storage;
