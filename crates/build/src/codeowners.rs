//! CODEOWNERS assembly.
//!
//! The evaluation envelope already carries codeowners rules field by
//! field, so this is a straight re-typing into [`Codeowners`] followed by
//! rendering. Rule order is preserved: the last matching pattern wins on
//! GitHub's side.

use std::collections::HashMap;

use gantry_config::codeowners::{Codeowners, Rule};
use gantry_config::emit;
use gantry_discover::{Declaration, Kind};
use gantry_extract::{CodeownersEnvelope, OwnersEntry};

use crate::error::BuildIssue;
use crate::{Artifact, BuildOutput};

/// Build every discovered CODEOWNERS configuration against the evaluation
/// envelope.
#[tracing::instrument(skip_all, fields(declarations = declarations.len()))]
pub fn codeowners(declarations: &[Declaration], envelope: &CodeownersEnvelope) -> BuildOutput {
    let extracted: HashMap<&str, &OwnersEntry> = envelope
        .configs
        .iter()
        .map(|entry| (entry.name.as_str(), entry))
        .collect();

    let mut output = BuildOutput::default();
    for declaration in declarations {
        let Some(entry) = extracted.get(declaration.name.as_str()) else {
            output.errors.push(BuildIssue::missing(&declaration.name));
            continue;
        };
        let config = Codeowners {
            rules: entry
                .rules
                .iter()
                .map(|rule| Rule {
                    pattern: rule.pattern.clone(),
                    owners: rule.owners.clone(),
                    comment: rule.comment.clone(),
                })
                .collect(),
        };
        output.artifacts.push(Artifact {
            name: declaration.name.clone(),
            kind: Kind::Codeowners,
            content: emit::codeowners(&config),
        });
    }
    output
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use gantry_discover::AccessForm;
    use gantry_extract::OwnerRule;

    use super::*;

    fn declaration(name: &str) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind: Kind::Codeowners,
            file: PathBuf::from("src/lib.rs"),
            line: 1,
            access: AccessForm::Call,
            references: Vec::new(),
        }
    }

    fn rule(pattern: &str, owners: &[&str], comment: &str) -> OwnerRule {
        OwnerRule {
            pattern: pattern.to_string(),
            owners: owners.iter().map(|owner| (*owner).to_string()).collect(),
            comment: comment.to_string(),
        }
    }

    #[test]
    fn test_rules_render_in_declared_order() {
        let envelope = CodeownersEnvelope {
            configs: vec![OwnersEntry {
                name: "owners".to_string(),
                rules: vec![
                    rule("*", &["@org/core"], ""),
                    rule("/ci/", &["@org/infra", "@lead"], "Infra owns CI"),
                ],
            }],
        };

        let output = codeowners(&[declaration("owners")], &envelope);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        let content = &output.artifacts[0].content;
        assert!(content.starts_with("# Generated by gantry"));
        assert!(content.contains("* @org/core\n"));
        assert!(content.contains("# Infra owns CI\n/ci/ @org/infra @lead\n"));
        assert!(content.find("* @org/core").unwrap() < content.find("/ci/").unwrap());
    }

    #[test]
    fn test_missing_extraction_is_reported() {
        let output = codeowners(&[declaration("owners")], &CodeownersEnvelope::default());
        assert!(output.artifacts.is_empty());
        assert_eq!(
            output.errors[0].to_string(),
            "owners: extraction data not found"
        );
    }
}
