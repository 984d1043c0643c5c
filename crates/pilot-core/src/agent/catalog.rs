use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::wire::ToolUseRequest;

/// Declared type tag of a tool parameter, matching the remote model's schema
/// vocabulary.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Object,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Object => "object",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: ParamType,
    pub description: String,
}

impl ToolParameter {
    pub fn new(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
        }
    }
}

/// One entry of the catalog. The required-field list the model sees is
/// implicit: every declared parameter is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ToolParameter>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    EmptyToolName,
    DuplicateTool(String),
    BadParameter { tool: String, reason: String },
    UnknownTool(String),
    InvalidArguments { tool: String, reason: String },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::EmptyToolName => write!(f, "tool name must not be empty"),
            CatalogError::DuplicateTool(name) => write!(f, "duplicate tool name: {name}"),
            CatalogError::BadParameter { tool, reason } => {
                write!(f, "bad parameter on tool {tool}: {reason}")
            }
            CatalogError::UnknownTool(name) => write!(f, "unknown tool: {name}"),
            CatalogError::InvalidArguments { tool, reason } => {
                write!(f, "invalid arguments for {tool}: {reason}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TakeScreenshotArgs {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PressKeyArgs {
    pub key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HoldKeyArgs {
    pub key: String,
    /// Seconds. Effective duration is capped by the dispatch worker timeout.
    pub duration: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MoveMouseArgs {
    pub x: i32,
    pub y: i32,
    /// Seconds spent gliding to the target; 0 moves instantly.
    #[serde(default)]
    pub duration: f64,
}

fn default_mouse_button() -> String {
    "left".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ClickMouseArgs {
    #[serde(default = "default_mouse_button")]
    pub button: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NoteSituationArgs {
    pub key: String,
    pub value: String,
}

/// The closed set of actions the agent may request. Resolution from a raw
/// tool invocation happens exactly once, at batch-validation time; execution
/// code never dispatches on name strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionCall {
    TakeScreenshot(TakeScreenshotArgs),
    PressKey(PressKeyArgs),
    HoldKey(HoldKeyArgs),
    MoveMouse(MoveMouseArgs),
    ClickMouse(ClickMouseArgs),
    NoteSituation(NoteSituationArgs),
    Wait,
    EndSession,
}

impl ActionCall {
    /// Control actions are applied by the session itself between batches;
    /// everything else goes through the input driver.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            ActionCall::NoteSituation(_) | ActionCall::Wait | ActionCall::EndSession
        )
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(
    input: Value,
    tool: &'static str,
) -> Result<T, CatalogError> {
    // The model occasionally sends null instead of an empty object.
    let input = if input.is_null() { json!({}) } else { input };
    serde_json::from_value::<T>(input).map_err(|e| CatalogError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

fn validate_key(key: &str, tool: &'static str) -> Result<(), CatalogError> {
    if key.trim().is_empty() {
        return Err(CatalogError::InvalidArguments {
            tool: tool.to_string(),
            reason: "key must not be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_duration(duration: f64, tool: &'static str) -> Result<(), CatalogError> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(CatalogError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("duration must be a finite non-negative number, got {duration}"),
        });
    }
    Ok(())
}

/// Static catalog of the tools exposed to the remote model.
///
/// Validated once at construction; no mutation afterwards. Resolution turns a
/// raw invocation into a typed `ActionCall`, rejecting unknown names so a
/// protocol mismatch is caught before any dispatch begins.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolDefinition>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if tool.name.trim().is_empty() {
                return Err(CatalogError::EmptyToolName);
            }
            if !seen.insert(tool.name.clone()) {
                return Err(CatalogError::DuplicateTool(tool.name.clone()));
            }
            let mut param_names = HashSet::new();
            for param in &tool.parameters {
                if param.name.trim().is_empty() {
                    return Err(CatalogError::BadParameter {
                        tool: tool.name.clone(),
                        reason: "parameter name must not be empty".to_string(),
                    });
                }
                if !param_names.insert(param.name.clone()) {
                    return Err(CatalogError::BadParameter {
                        tool: tool.name.clone(),
                        reason: format!("duplicate parameter name: {}", param.name),
                    });
                }
            }
        }
        Ok(Self { tools })
    }

    /// The built-in screen-pilot catalog: the five input primitives plus the
    /// control tools (`wait`, `end_session`, `note_situation`).
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(vec![
            ToolDefinition::new(
                "take_screenshot",
                "Takes a screenshot of the current game view.",
                vec![ToolParameter::new(
                    "filename",
                    ParamType::String,
                    "The name to save the screenshot as (e.g. 'metrics.png').",
                )],
            ),
            ToolDefinition::new(
                "press_key",
                "Presses and releases a specified keyboard key.",
                vec![ToolParameter::new(
                    "key",
                    ParamType::String,
                    "The key to press (e.g. 'w', 's', 'a', 'd', 'space').",
                )],
            ),
            ToolDefinition::new(
                "hold_key",
                "Holds down a specified keyboard key for a certain duration.",
                vec![
                    ToolParameter::new(
                        "key",
                        ParamType::String,
                        "The key to hold down (e.g. 'w', 's').",
                    ),
                    ToolParameter::new(
                        "duration",
                        ParamType::Number,
                        "The duration in seconds to hold the key down.",
                    ),
                ],
            ),
            ToolDefinition::new(
                "move_mouse",
                "Moves the mouse cursor to specific coordinates on the screen.",
                vec![
                    ToolParameter::new(
                        "x",
                        ParamType::Integer,
                        "The x-coordinate to move the mouse to.",
                    ),
                    ToolParameter::new(
                        "y",
                        ParamType::Integer,
                        "The y-coordinate to move the mouse to.",
                    ),
                    ToolParameter::new(
                        "duration",
                        ParamType::Number,
                        "Seconds to spend gliding to the target; 0 moves instantly.",
                    ),
                ],
            ),
            ToolDefinition::new(
                "click_mouse",
                "Clicks a mouse button.",
                vec![ToolParameter::new(
                    "button",
                    ParamType::String,
                    "The mouse button to click ('left', 'right', or 'middle').",
                )],
            ),
            ToolDefinition::new(
                "wait",
                "Acknowledges there is nothing actionable right now (e.g. waiting for the \
                 screen to change). Issues no input and keeps the session alive.",
                vec![],
            ),
            ToolDefinition::new(
                "end_session",
                "Ends the play session once the objective is reached or no further progress \
                 is possible.",
                vec![],
            ),
            ToolDefinition::new(
                "note_situation",
                "Records a short key/value note about the current game situation, carried \
                 into future turns so it does not have to be re-derived.",
                vec![
                    ToolParameter::new("key", ParamType::String, "Short label for the note."),
                    ToolParameter::new("value", ParamType::String, "The note itself."),
                ],
            ),
        ])
    }

    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Serializes the catalog into the schema list the remote model expects:
    /// every declared parameter appears in `required`.
    pub fn schema(&self) -> Vec<Value> {
        self.tools
            .iter()
            .map(|tool| {
                let mut properties = serde_json::Map::new();
                for param in &tool.parameters {
                    properties.insert(
                        param.name.clone(),
                        json!({
                            "type": param.param_type.as_str(),
                            "description": param.description,
                        }),
                    );
                }
                let required: Vec<&str> =
                    tool.parameters.iter().map(|p| p.name.as_str()).collect();
                json!({
                    "name": tool.name,
                    "description": tool.description,
                    "input_schema": {
                        "type": "object",
                        "properties": Value::Object(properties),
                        "required": required,
                    },
                })
            })
            .collect()
    }

    /// Resolves a raw invocation into a typed action.
    ///
    /// `UnknownTool` means the model asked for something outside the catalog
    /// (a protocol mismatch); `InvalidArguments` is a per-invocation fault the
    /// model can self-correct from.
    pub fn resolve(&self, request: &ToolUseRequest) -> Result<ActionCall, CatalogError> {
        let name = request.name.trim().to_ascii_lowercase();
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(CatalogError::UnknownTool(request.name.clone()));
        }
        let input = request.input.clone();
        match name.as_str() {
            "take_screenshot" => {
                let args = parse_args::<TakeScreenshotArgs>(input, "take_screenshot")?;
                Ok(ActionCall::TakeScreenshot(args))
            }
            "press_key" => {
                let args = parse_args::<PressKeyArgs>(input, "press_key")?;
                validate_key(&args.key, "press_key")?;
                Ok(ActionCall::PressKey(args))
            }
            "hold_key" => {
                let args = parse_args::<HoldKeyArgs>(input, "hold_key")?;
                validate_key(&args.key, "hold_key")?;
                validate_duration(args.duration, "hold_key")?;
                Ok(ActionCall::HoldKey(args))
            }
            "move_mouse" => {
                let args = parse_args::<MoveMouseArgs>(input, "move_mouse")?;
                validate_duration(args.duration, "move_mouse")?;
                Ok(ActionCall::MoveMouse(args))
            }
            "click_mouse" => {
                let args = parse_args::<ClickMouseArgs>(input, "click_mouse")?;
                Ok(ActionCall::ClickMouse(args))
            }
            "note_situation" => {
                let args = parse_args::<NoteSituationArgs>(input, "note_situation")?;
                Ok(ActionCall::NoteSituation(args))
            }
            "wait" => Ok(ActionCall::Wait),
            "end_session" => Ok(ActionCall::EndSession),
            other => Err(CatalogError::UnknownTool(other.to_string())),
        }
    }
}
