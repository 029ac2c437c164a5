//! The conversational loop: state, inputs, the idle/pause supervisor and the
//! orchestrator task.

pub mod event;
pub mod runner;
pub mod state;
pub mod supervisor;

pub use event::AssistantCommand;
pub use runner::Assistant;
pub use state::{
    lock_status, new_shared_status, AssistantState, AssistantStatus, ConversationTurn,
    SharedStatus,
};
pub use supervisor::Supervisor;
