mod bus;
mod types;

pub use bus::{EventBus, TaskEvents};
pub use types::{Event, EventEnvelope};
