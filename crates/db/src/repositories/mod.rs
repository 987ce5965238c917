mod agent_result_repository;
mod component_repository;
mod feedback_repository;
mod task_repository;

pub use agent_result_repository::AgentResultRepository;
pub use component_repository::ComponentRepository;
pub use feedback_repository::FeedbackRepository;
pub use task_repository::TaskRepository;
