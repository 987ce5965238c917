mod error;
pub mod models;
mod pool;
pub mod repositories;
mod store;

pub use error::*;
pub use pool::*;
pub use repositories::*;
pub use store::TaskStore;
