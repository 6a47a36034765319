#![deny(warnings)]

pub mod connection_pool;
pub mod occurrence;
pub mod prediction;
pub mod schema;

type Result<T> = anyhow::Result<T>;
