//! Agent framework primitives: the conversation window, the typed tool
//! catalog, and the session state machine that turns model replies into
//! dispatched input actions.
//!
//! The session owns all mutable per-run state (window, token counters,
//! situation memo, continuation flag); nothing here is global. Execution of
//! concrete actions happens behind the [`driver::InputDriver`] boundary.

pub mod catalog;
pub mod dispatch;
pub mod driver;
pub mod prompt;
pub mod session;
pub mod window;
pub mod wire;

pub use catalog::{ActionCall, CatalogError, ParamType, ToolCatalog, ToolDefinition, ToolParameter};
pub use dispatch::{ActionRequest, DispatchConfig, ExecutionResult, execute_batch};
pub use driver::{InputDriver, ResultPayload};
pub use session::{AgentSession, SessionConfig, SessionPhase, TurnOutcome};
pub use window::ConversationWindow;
pub use wire::{ContentBlock, ImageSource, Message, Role, TokenUsage, ToolUseRequest};
