//! The task registry: the immutable set of recurring research queries.
//!
//! Loaded once at process start, either from the compiled-in default set or
//! from a TOML file. Duplicate or malformed slugs are a startup configuration
//! error, never a runtime error; the registry has no mutation API.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, Result};

/// One recurring research query, identified by a stable slug.
///
/// Definitions are immutable after load. The slug doubles as the URL path
/// segment for the detail page and as the result-store key, so it is
/// restricted to lowercase alphanumerics and hyphens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Stable unique identifier (`[a-z0-9-]+`).
    pub slug: String,
    /// Human-readable display name.
    pub name: String,
    /// One-paragraph description shown on the listing page.
    pub description: String,
    /// The research query submitted to the execution API.
    pub query: String,
    /// Output schema descriptor forwarded verbatim to the execution API.
    ///
    /// Either a plain-text description (string) or a JSON-schema object.
    pub output_schema: Value,
    /// Processor tier selector (execution profile/cost tier).
    #[serde(default = "default_processor")]
    pub processor: String,
}

fn default_processor() -> String {
    "core".to_string()
}

/// TOML file shape for registry loading.
#[derive(Debug, Deserialize)]
struct RegistryFile {
    tasks: Vec<TaskDefinition>,
}

/// Immutable, ordered collection of task definitions with O(1) slug lookup.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: Vec<TaskDefinition>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    /// Builds a registry from a list of definitions, validating slugs.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the list is empty, a slug is empty or
    /// contains characters outside `[a-z0-9-]`, or two definitions share a
    /// slug.
    pub fn new(tasks: Vec<TaskDefinition>) -> Result<Self> {
        if tasks.is_empty() {
            return Err(Error::config("task registry must contain at least one task"));
        }

        let mut index = HashMap::with_capacity(tasks.len());
        for (position, task) in tasks.iter().enumerate() {
            if !is_valid_slug(&task.slug) {
                return Err(Error::config(format!(
                    "invalid task slug {:?}: slugs must be non-empty and use only [a-z0-9-]",
                    task.slug
                )));
            }
            if index.insert(task.slug.clone(), position).is_some() {
                return Err(Error::config(format!(
                    "duplicate task slug {:?} in registry",
                    task.slug
                )));
            }
        }

        Ok(Self { tasks, index })
    }

    /// Parses a registry from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the TOML is malformed or the task list
    /// fails validation.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(input)
            .map_err(|e| Error::config(format!("failed to parse task registry: {e}")))?;
        Self::new(file.tasks)
    }

    /// Loads a registry from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "failed to read task registry {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&input)
    }

    /// Returns the compiled-in default query set.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the built-in set fails validation, which
    /// indicates a bug in this crate rather than a runtime condition.
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_tasks())
    }

    /// Looks up a task definition by slug.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&TaskDefinition> {
        self.index.get(slug).map(|&position| &self.tasks[position])
    }

    /// Returns the full ordered list of task definitions.
    #[must_use]
    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    /// Iterates task definitions in registry order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskDefinition> {
        self.tasks.iter()
    }

    /// Returns the number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true when the registry holds no tasks.
    ///
    /// Always false for a successfully constructed registry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Returns true when `slug` is usable as a URL segment and store key.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

fn builtin_tasks() -> Vec<TaskDefinition> {
    vec![
        TaskDefinition {
            slug: "daily-news".to_string(),
            name: "Daily news briefing".to_string(),
            description: "Top world news stories of the last 24 hours, summarized.".to_string(),
            query: "Summarize the most significant world news stories from the last 24 hours. \
                    Include the headline, a two-sentence summary, and the primary source for each."
                .to_string(),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "headline": { "type": "string" },
                    "stories": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": { "type": "string" },
                                "summary": { "type": "string" },
                                "source": { "type": "string" }
                            },
                            "required": ["title", "summary"]
                        }
                    }
                },
                "required": ["headline", "stories"]
            }),
            processor: "core".to_string(),
        },
        TaskDefinition {
            slug: "ai-research".to_string(),
            name: "AI research digest".to_string(),
            description: "Notable machine-learning papers and releases from the past day."
                .to_string(),
            query: "List the most notable machine learning papers, model releases, and research \
                    announcements from the past day, with a one-paragraph significance note each."
                .to_string(),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": { "type": "string" },
                                "link": { "type": "string" },
                                "significance": { "type": "string" }
                            },
                            "required": ["title", "significance"]
                        }
                    }
                },
                "required": ["items"]
            }),
            processor: "pro".to_string(),
        },
        TaskDefinition {
            slug: "market-brief".to_string(),
            name: "Market brief".to_string(),
            description: "Major index moves and the stories behind them.".to_string(),
            query: "Report the closing moves of the major US and European equity indices and \
                    summarize the main drivers cited by financial press."
                .to_string(),
            output_schema: "A short markdown brief: index moves table, then 3-5 bullet drivers."
                .into(),
            processor: "core".to_string(),
        },
        TaskDefinition {
            slug: "security-advisories".to_string(),
            name: "Security advisories".to_string(),
            description: "New CVEs and vendor advisories worth patching for.".to_string(),
            query: "List newly published security advisories and CVEs from the last 24 hours \
                    that affect widely deployed server software, with severity and a remediation \
                    one-liner."
                .to_string(),
            output_schema: json!({
                "type": "object",
                "properties": {
                    "advisories": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "severity": { "type": "string" },
                                "summary": { "type": "string" },
                                "remediation": { "type": "string" }
                            },
                            "required": ["id", "severity", "summary"]
                        }
                    }
                },
                "required": ["advisories"]
            }),
            processor: "core".to_string(),
        },
    ]
}
