mod components;
mod feedback;
mod generate;
mod health;
mod tasks;

pub use components::*;
pub use feedback::*;
pub use generate::*;
pub use health::*;
pub use tasks::*;
