use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::catalog::{ActionCall, CatalogError, ToolCatalog};
use super::dispatch::{ActionRequest, DispatchConfig, ExecutionResult, execute_batch};
use super::driver::{InputDriver, ResultPayload};
use super::prompt::{PromptConfig, situation_addendum};
use super::window::ConversationWindow;
use super::wire::{
    ContentBlock, Message, TokenUsage, ToolUseRequest, collect_thoughts, collect_tool_uses,
};
use crate::llm::{ModelClient, ModelReply, ModelRequest, ToolChoice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Running,
    AwaitingResponse,
    ExecutingTools,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub window_capacity: usize,
    pub tool_choice: ToolChoice,
    pub allow_parallel: bool,
    pub max_tokens: u32,
    pub dispatch: DispatchConfig,
    pub prompt: PromptConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_capacity: ConversationWindow::DEFAULT_CAPACITY,
            tool_choice: ToolChoice::Mandatory,
            allow_parallel: true,
            max_tokens: 1024,
            dispatch: DispatchConfig::default(),
            prompt: PromptConfig::default(),
        }
    }
}

/// What one turn produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Batch executed; results were collected and fed back into the window.
    /// Timed-out invocations are simply absent from `results`.
    Completed { results: Vec<ExecutionResult> },
    /// The terminate tool was observed; no further model calls will be made.
    Terminated { results: Vec<ExecutionResult> },
    /// The model requested a tool absent from the catalog. Nothing was
    /// dispatched; the single synthetic error result stands in for the batch.
    ProtocolMismatch { error: ExecutionResult },
    /// Two tool-free replies in a row; nothing executed this turn.
    Idle,
}

/// The agent session: owns the conversation window, the tool catalog and all
/// per-run state. One `run_turn` call is one full prompt → reply → execute →
/// feedback cycle. The session is turn-count-agnostic; the caller enforces
/// the step budget.
pub struct AgentSession {
    window: ConversationWindow,
    catalog: ToolCatalog,
    config: SessionConfig,
    phase: SessionPhase,
    keep_running: bool,
    usage: TokenUsage,
    situation: BTreeMap<String, String>,
    last_batch: Vec<ToolUseRequest>,
    last_results: Vec<ExecutionResult>,
}

impl AgentSession {
    pub fn new(catalog: ToolCatalog) -> Self {
        Self::with_config(catalog, SessionConfig::default())
    }

    pub fn with_config(catalog: ToolCatalog, config: SessionConfig) -> Self {
        Self {
            window: ConversationWindow::new(config.window_capacity),
            catalog,
            config,
            phase: SessionPhase::Running,
            keep_running: true,
            usage: TokenUsage::default(),
            situation: BTreeMap::new(),
            last_batch: Vec::new(),
            last_results: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.keep_running
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn window(&self) -> &ConversationWindow {
        &self.window
    }

    pub fn situation(&self) -> &BTreeMap<String, String> {
        &self.situation
    }

    pub fn last_batch(&self) -> &[ToolUseRequest] {
        &self.last_batch
    }

    pub fn last_results(&self) -> &[ExecutionResult] {
        &self.last_results
    }

    /// Runs one turn. `input` is the caller's prompt for this turn; pass an
    /// empty vec when the previous turn's results (already fed back into the
    /// window) are the whole prompt.
    pub async fn run_turn(
        &mut self,
        client: &dyn ModelClient,
        driver: &Arc<dyn InputDriver>,
        input: Vec<ContentBlock>,
    ) -> anyhow::Result<TurnOutcome> {
        if !self.keep_running {
            anyhow::bail!("session is stopped");
        }

        if !input.is_empty() {
            self.window.append(Message::user(input));
        }

        let reply = self.call_model(client).await?;
        let mut batch = collect_tool_uses(&reply.content);

        // A tool-free reply stalls the loop. Synthesize one corrective
        // message and resubmit; a second tool-free reply ends the turn.
        if batch.is_empty() {
            debug!("reply contained no tool call; resubmitting with corrective instruction");
            self.window.append(Message::user_text(
                self.config.prompt.mandatory_tool_instruction.clone(),
            ));
            let reply = self.call_model(client).await?;
            batch = collect_tool_uses(&reply.content);
            if batch.is_empty() {
                self.last_batch.clear();
                self.last_results.clear();
                self.phase = SessionPhase::Running;
                return Ok(TurnOutcome::Idle);
            }
        }

        self.last_batch = batch.clone();
        self.phase = SessionPhase::ExecutingTools;

        // Validate the whole batch before anything is dispatched. An unknown
        // tool name is a protocol mismatch: zero invocations execute and one
        // synthetic error result stands in for the batch.
        let mut driver_batch = Vec::new();
        let mut control = Vec::new();
        let mut planned_errors = Vec::new();
        for request in &batch {
            match self.catalog.resolve(request) {
                Ok(call) if call.is_control() => control.push((request.id.clone(), call)),
                Ok(call) => driver_batch.push(ActionRequest {
                    id: request.id.clone(),
                    call,
                }),
                Err(err @ CatalogError::UnknownTool(_)) => {
                    warn!(tool = %request.name, "batch aborted: {err}");
                    let error = ExecutionResult {
                        id: request.id.clone(),
                        payload: ResultPayload::Error(err.to_string()),
                    };
                    self.last_results = vec![error.clone()];
                    self.phase = SessionPhase::Running;
                    return Ok(TurnOutcome::ProtocolMismatch { error });
                }
                Err(err) => {
                    debug!(tool = %request.name, "invalid arguments: {err}");
                    planned_errors.push(ExecutionResult {
                        id: request.id.clone(),
                        payload: ResultPayload::Error(err.to_string()),
                    });
                }
            }
        }

        let mut results =
            execute_batch(Arc::clone(driver), driver_batch, &self.config.dispatch).await;
        results.extend(planned_errors);

        // Control actions mutate session state, so they are applied here on
        // the orchestrating task, after the driver batch has fully joined.
        for (id, call) in control {
            let payload = self.apply_control(call);
            results.push(ExecutionResult { id, payload });
        }

        self.last_results = results.clone();
        self.feed_back(&results);

        if !self.keep_running {
            self.phase = SessionPhase::Stopped;
            return Ok(TurnOutcome::Terminated { results });
        }
        self.phase = SessionPhase::Running;
        Ok(TurnOutcome::Completed { results })
    }

    async fn call_model(&mut self, client: &dyn ModelClient) -> anyhow::Result<ModelReply> {
        self.phase = SessionPhase::AwaitingResponse;

        // The situation memo rides along as an ephemeral addendum; it is
        // re-rendered every call and never stored in the window.
        let mut system = self.config.prompt.preamble.clone();
        if let Some(addendum) = situation_addendum(&self.situation) {
            system.push_str("\n\n");
            system.push_str(&addendum);
        }

        let reply = client
            .complete(ModelRequest {
                system,
                messages: self.window.snapshot(),
                tools: self.catalog.schema(),
                tool_choice: self.config.tool_choice,
                allow_parallel: self.config.allow_parallel,
                max_tokens: self.config.max_tokens,
            })
            .await?;

        self.usage.add(reply.usage);
        if let Some(thoughts) = collect_thoughts(&reply.content) {
            debug!(%thoughts, "model commentary");
        }
        // The full reply is preserved so tool invocations and commentary stay
        // in context across turns.
        self.window.append(Message::assistant(reply.content.clone()));
        Ok(reply)
    }

    fn apply_control(&mut self, call: ActionCall) -> ResultPayload {
        match call {
            ActionCall::Wait => ResultPayload::Text("Waiting; no input issued.".to_string()),
            ActionCall::EndSession => {
                info!("agent requested session end");
                self.keep_running = false;
                ResultPayload::Text("Session will end.".to_string())
            }
            ActionCall::NoteSituation(args) => {
                self.situation.insert(args.key, args.value);
                ResultPayload::Text("Noted.".to_string())
            }
            other => ResultPayload::Error(format!("not a control action: {other:?}")),
        }
    }

    /// Appends the collected results to the window as the next user message,
    /// so the following model call sees them without the caller re-sending.
    fn feed_back(&mut self, results: &[ExecutionResult]) {
        if results.is_empty() {
            return;
        }
        let blocks: Vec<ContentBlock> = results
            .iter()
            .cloned()
            .map(ExecutionResult::into_block)
            .collect();
        self.window.append(Message::user(blocks));
    }
}
