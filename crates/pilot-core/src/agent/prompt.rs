use std::collections::BTreeMap;

/// Fixed instruction strings sent with every model call.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Persona/objective preamble, sent as the system text of every request.
    pub preamble: String,
    /// Corrective message appended when a reply contains no tool call.
    pub mandatory_tool_instruction: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            preamble: "You are playing a video game through simulated keyboard and mouse input. \
                       Each turn you see the recent conversation, including screenshots you \
                       requested earlier, and you respond with tool calls for the inputs to \
                       issue next. Request take_screenshot whenever you need to see the current \
                       view. Issue a tool call every turn: use wait when you are only waiting \
                       for the screen to change, and end_session once the objective is reached."
                .to_string(),
            mandatory_tool_instruction: "Your reply contained no tool call. A tool call is \
                                         mandatory every turn: call end_session if you are \
                                         done, or wait if you are waiting for the screen to \
                                         change. Reply again with the tool calls to issue."
                .to_string(),
        }
    }
}

/// Renders the situation memo as an ephemeral addendum, or `None` when the
/// memo is empty. Transmitted with the request but never stored in the
/// conversation window.
pub fn situation_addendum(situation: &BTreeMap<String, String>) -> Option<String> {
    if situation.is_empty() {
        return None;
    }
    let mut out = String::from("Current situation notes (from your note_situation calls):");
    for (key, value) in situation {
        out.push_str(&format!("\n- {key}: {value}"));
    }
    Some(out)
}
