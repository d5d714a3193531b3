//! Conversation state machine.
//!
//! Each chat moves through `Menu -> AwaitingQuery -> ShowingResults ->
//! Delivering -> Menu`. The handler owns the per-chat sessions and ties the
//! catalog, the download orchestrator and the gateway together.

mod callback;
pub mod delivery;
mod handler;
pub mod menu;
mod session;
mod state;

pub use callback::CallbackAction;
pub use delivery::{build_caption, deliver_artifact, DeliveryOutcome};
pub use handler::ConversationHandler;
pub use session::SessionStore;
pub use state::{ConversationState, Input, Session};
