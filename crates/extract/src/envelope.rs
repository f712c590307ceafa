//! The JSON document the runner prints, parsed back into typed entries.
//!
//! Entries pair a declaration name with its evaluated value. Workflow data
//! stays as raw [`serde_json::Value`] here; re-typing it is the builder's
//! job. CODEOWNERS entries come pre-shaped as rule lists because the
//! runner copies those field by field.

use serde::Deserialize;

/// One evaluated declaration, still untyped.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValueEntry {
    pub name: String,
    pub data: serde_json::Value,
}

/// One evaluated pull request template: plain markdown.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub content: String,
}

/// One evaluated CODEOWNERS declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnersEntry {
    pub name: String,
    #[serde(default)]
    pub rules: Vec<OwnerRule>,
}

/// One ownership rule from an [`OwnersEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OwnerRule {
    pub pattern: String,
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub comment: String,
}

/// Workflow batch result: workflows and jobs extracted together, since
/// workflows embed their jobs by reference.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkflowEnvelope {
    #[serde(default)]
    pub workflows: Vec<ValueEntry>,
    #[serde(default)]
    pub jobs: Vec<ValueEntry>,
}

/// Dependabot batch result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigEnvelope {
    #[serde(default)]
    pub configs: Vec<ValueEntry>,
}

/// Issue or discussion template batch result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TemplateEnvelope {
    #[serde(default)]
    pub templates: Vec<ValueEntry>,
}

/// Pull request template batch result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PrTemplateEnvelope {
    #[serde(default)]
    pub templates: Vec<ContentEntry>,
}

/// CODEOWNERS batch result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CodeownersEnvelope {
    #[serde(default)]
    pub configs: Vec<OwnersEntry>,
}
