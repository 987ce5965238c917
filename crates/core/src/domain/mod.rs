mod agent;
mod component;
mod input;
mod metrics;
mod task;

pub use agent::*;
pub use component::*;
pub use input::*;
pub use metrics::*;
pub use task::*;
