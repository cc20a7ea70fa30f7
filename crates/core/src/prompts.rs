use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const QUESTION: &str = "question";
pub const RELEVANCE: &str = "relevance";
pub const ANALYSIS: &str = "analysis";

const BUILTIN: &[(&str, &str)] = &[
    (QUESTION, include_str!("../prompts/question.md")),
    (RELEVANCE, include_str!("../prompts/relevance.md")),
    (ANALYSIS, include_str!("../prompts/analysis.md")),
];

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Failed to read prompts directory {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read prompt file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Prompt template not found: {0}")]
    Missing(String),
}

/// Reads every `*.md` file in `dir_path`, keyed by file stem.
pub fn load_prompts(dir_path: &Path) -> Result<HashMap<String, String>, PromptError> {
    let mut prompts = HashMap::new();

    let entries = fs::read_dir(dir_path).map_err(|source| PromptError::ReadDir {
        path: dir_path.display().to_string(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| PromptError::ReadDir {
            path: dir_path.display().to_string(),
            source,
        })?;
        let path = entry.path();

        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let Some(prompt_key) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path).map_err(|source| PromptError::ReadFile {
                path: path.display().to_string(),
                source,
            })?;

            prompts.insert(prompt_key.to_string(), content);
        }
    }

    Ok(prompts)
}

/// Prompt templates used to talk to the LLM.
#[derive(Debug, Clone)]
pub struct Prompts {
    templates: HashMap<String, String>,
}

impl Prompts {
    /// The templates compiled into the crate.
    pub fn builtin() -> Self {
        Self {
            templates: BUILTIN
                .iter()
                .map(|(key, body)| (key.to_string(), body.to_string()))
                .collect(),
        }
    }

    /// Built-in templates, overridden by any same-named files in `dir_path`.
    pub fn with_overrides(dir_path: &Path) -> Result<Self, PromptError> {
        let mut prompts = Self::builtin();
        let overrides = load_prompts(dir_path)?;
        tracing::info!(
            "Loaded {} prompt override(s) from {}",
            overrides.len(),
            dir_path.display()
        );
        prompts.templates.extend(overrides);
        Ok(prompts)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Fills `{key}` placeholders in a single pass over the template.
    ///
    /// Braces that don't name a supplied key are left alone, and substituted
    /// values are never scanned again.
    pub fn render(&self, key: &str, vars: &[(&str, &str)]) -> Result<String, PromptError> {
        let template = self
            .templates
            .get(key)
            .ok_or_else(|| PromptError::Missing(key.to_string()))?;

        let mut rendered = String::with_capacity(template.len());
        let mut rest = template.as_str();
        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let name = &after[..close];
                vars.iter()
                    .find(|(var, _)| *var == name)
                    .map(|(_, value)| (*value, close))
            });
            match value {
                Some((value, close)) => {
                    rendered.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    rendered.push('{');
                    rest = after;
                }
            }
        }
        rendered.push_str(rest);
        Ok(rendered)
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self::builtin()
    }
}
