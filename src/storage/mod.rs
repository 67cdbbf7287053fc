pub mod hash;
pub mod table;
pub mod worker;

pub use hash::{HashMapper, HashProvider};
pub use table::{DEFAULT_MAX_SIZE, StoreTable};
pub use worker::{StoreWorker, spawn_store_worker};
