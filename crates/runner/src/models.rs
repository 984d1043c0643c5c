/// Known models and their CLI aliases.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub id: &'static str,
}

pub const MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "claude-3-5-haiku",
        aliases: &["dev", "0"],
        id: "claude-3-5-haiku-20241022",
    },
    ModelSpec {
        name: "claude-3-5-sonnet",
        aliases: &["stable", "1"],
        id: "claude-3-5-sonnet-20241022",
    },
    ModelSpec {
        name: "claude-3-opus",
        aliases: &["prod", "2"],
        id: "claude-3-opus-20240229",
    },
];

pub const DEFAULT_MODEL_ALIAS: &str = "stable";

/// Resolves a model name, alias, or full id to the id sent to the API.
pub fn resolve_model(input: &str) -> Option<&'static str> {
    let input = input.trim();
    MODELS
        .iter()
        .find(|spec| {
            spec.name == input || spec.id == input || spec.aliases.contains(&input)
        })
        .map(|spec| spec.id)
}
