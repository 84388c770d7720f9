pub mod loaders;
pub mod pool;
pub mod reader;
pub mod writer;

pub use pool::{DbPools, UES_MIGRATOR};
