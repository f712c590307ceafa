//! Dependabot configuration assembly.

use gantry_config::dependabot::{Dependabot, Schedule, Update};
use gantry_config::emit;
use gantry_discover::{Declaration, Kind};
use gantry_extract::ConfigEnvelope;
use serde_json::Value;

use crate::error::IssueKind;
use crate::value::{self, Fields};
use crate::{build_kind, BuildOutput};

/// Build every discovered Dependabot configuration against the evaluation
/// envelope.
#[tracing::instrument(skip_all, fields(declarations = declarations.len()))]
pub fn dependabot(declarations: &[Declaration], envelope: &ConfigEnvelope) -> BuildOutput {
    build_kind(declarations, &envelope.configs, Kind::Dependabot, |fields| {
        let config = dependabot_from(fields);
        emit::dependabot(&config).map_err(|error| IssueKind::Emit(error.to_string()))
    })
}

fn dependabot_from(fields: &Fields) -> Dependabot {
    Dependabot {
        version: value::unsigned(fields, "version").unwrap_or(2),
        updates: fields
            .get("updates")
            .and_then(Value::as_array)
            .map(|updates| {
                updates
                    .iter()
                    .filter_map(Value::as_object)
                    .map(update_from)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

fn update_from(fields: &Fields) -> Update {
    Update {
        package_ecosystem: value::string(fields, "package-ecosystem"),
        directory: value::string(fields, "directory"),
        schedule: schedule_from(fields.get("schedule")),
        open_pull_requests_limit: value::unsigned(fields, "open-pull-requests-limit"),
        labels: value::string_list(fields, "labels"),
        assignees: value::string_list(fields, "assignees"),
        reviewers: value::string_list(fields, "reviewers"),
    }
}

fn schedule_from(value: Option<&Value>) -> Schedule {
    let Some(fields) = value.and_then(Value::as_object) else {
        return Schedule::default();
    };
    Schedule {
        interval: value::string(fields, "interval"),
        day: value::opt_string(fields, "day"),
        time: value::opt_string(fields, "time"),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use gantry_discover::AccessForm;
    use gantry_extract::ValueEntry;

    use super::*;

    fn declaration(name: &str) -> Declaration {
        Declaration {
            name: name.to_string(),
            kind: Kind::Dependabot,
            file: PathBuf::from("src/lib.rs"),
            line: 1,
            access: AccessForm::Call,
            references: Vec::new(),
        }
    }

    #[test]
    fn test_dependabot_fields_round_trip() {
        let original = Dependabot::new().with_update(
            Update {
                schedule: Schedule {
                    interval: "weekly".to_string(),
                    day: Some("monday".to_string()),
                    time: Some("06:00".to_string()),
                },
                reviewers: vec!["@org/deps".to_string()],
                ..Update::new("cargo", "/", "weekly")
            }
            .with_limit(5)
            .with_label("dependencies"),
        );
        let data = serde_json::to_value(&original).unwrap();

        let rebuilt = dependabot_from(data.as_object().unwrap());
        assert_eq!(serde_json::to_value(&rebuilt).unwrap(), data);
    }

    #[test]
    fn test_version_survives_a_double() {
        let data = serde_json::json!({"version": 2.0, "updates": []});
        let rebuilt = dependabot_from(data.as_object().unwrap());
        assert_eq!(rebuilt.version, 2);
    }

    #[test]
    fn test_batch_renders_yaml_with_header() {
        let config =
            Dependabot::new().with_update(Update::new("github-actions", "/", "monthly"));
        let envelope = ConfigEnvelope {
            configs: vec![ValueEntry {
                name: "deps".to_string(),
                data: serde_json::to_value(&config).unwrap(),
            }],
        };

        let output = dependabot(&[declaration("deps")], &envelope);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        let content = &output.artifacts[0].content;
        assert!(content.starts_with("# Generated by gantry"));
        assert!(content.contains("package-ecosystem: github-actions"));
        assert!(content.contains("interval: monthly"));
    }

    #[test]
    fn test_missing_extraction_is_reported() {
        let output = dependabot(&[declaration("deps")], &ConfigEnvelope::default());
        assert!(output.artifacts.is_empty());
        assert_eq!(output.errors[0].to_string(), "deps: extraction data not found");
    }
}
