//! Issue, discussion and pull request template assembly.
//!
//! Form elements serialize untagged, so the variant must be recovered
//! from the field set alone: `render` marks a textarea, `options` a
//! dropdown or checkbox group (told apart by option element type), and a
//! `value` means markdown or input depending on whether a `label` is
//! present. An element matching none of these is a per-declaration error.

use std::collections::HashMap;

use gantry_config::emit;
use gantry_config::templates::{
    CheckOption, Checkboxes, DiscussionTemplate, Dropdown, FormElement, Input, IssueTemplate,
    Markdown, PrTemplate, Textarea,
};
use gantry_discover::{Declaration, Kind};
use gantry_extract::{PrTemplateEnvelope, TemplateEnvelope};
use serde_json::Value;

use crate::error::{BuildIssue, IssueKind, ShapeError};
use crate::value::{self, Fields};
use crate::{build_kind, Artifact, BuildOutput};

/// Build every discovered issue template against the evaluation envelope.
#[tracing::instrument(skip_all, fields(declarations = declarations.len()))]
pub fn issue_templates(declarations: &[Declaration], envelope: &TemplateEnvelope) -> BuildOutput {
    build_kind(declarations, &envelope.templates, Kind::IssueTemplate, |fields| {
        let template = issue_template_from(fields)?;
        emit::issue_template(&template).map_err(|error| IssueKind::Emit(error.to_string()))
    })
}

/// Build every discovered discussion template against the evaluation
/// envelope.
#[tracing::instrument(skip_all, fields(declarations = declarations.len()))]
pub fn discussion_templates(
    declarations: &[Declaration],
    envelope: &TemplateEnvelope,
) -> BuildOutput {
    build_kind(
        declarations,
        &envelope.templates,
        Kind::DiscussionTemplate,
        |fields| {
            let template = discussion_template_from(fields)?;
            emit::discussion_template(&template).map_err(|error| IssueKind::Emit(error.to_string()))
        },
    )
}

/// Build every discovered pull request template. The extracted value is
/// already the markdown body, so there is nothing to re-type.
#[tracing::instrument(skip_all, fields(declarations = declarations.len()))]
pub fn pr_templates(declarations: &[Declaration], envelope: &PrTemplateEnvelope) -> BuildOutput {
    let extracted: HashMap<&str, &str> = envelope
        .templates
        .iter()
        .map(|entry| (entry.name.as_str(), entry.content.as_str()))
        .collect();

    let mut output = BuildOutput::default();
    for declaration in declarations {
        let Some(content) = extracted.get(declaration.name.as_str()) else {
            output.errors.push(BuildIssue::missing(&declaration.name));
            continue;
        };
        output.artifacts.push(Artifact {
            name: declaration.name.clone(),
            kind: Kind::PrTemplate,
            content: emit::pr_template(&PrTemplate::new(*content)),
        });
    }
    output
}

fn issue_template_from(fields: &Fields) -> Result<IssueTemplate, ShapeError> {
    Ok(IssueTemplate {
        name: value::string(fields, "name"),
        description: value::string(fields, "description"),
        title: value::string(fields, "title"),
        labels: value::string_list(fields, "labels"),
        assignees: value::string_list(fields, "assignees"),
        body: body_from(fields)?,
    })
}

fn discussion_template_from(fields: &Fields) -> Result<DiscussionTemplate, ShapeError> {
    Ok(DiscussionTemplate {
        title: value::string(fields, "title"),
        labels: value::string_list(fields, "labels"),
        body: body_from(fields)?,
    })
}

fn body_from(fields: &Fields) -> Result<Vec<FormElement>, ShapeError> {
    let mut body = Vec::new();
    if let Some(elements) = fields.get("body").and_then(Value::as_array) {
        for (index, element) in elements.iter().enumerate() {
            let Some(element) = element.as_object() else {
                return Err(ShapeError::FormElementNotAnObject { index });
            };
            body.push(element_from(element, index)?);
        }
    }
    Ok(body)
}

/// Recover the element variant from the field set. Order matters:
/// `render` beats everything, object options mean checkboxes, and a
/// `value` without a `label` is markdown rather than an input.
fn element_from(fields: &Fields, index: usize) -> Result<FormElement, ShapeError> {
    if fields.contains_key("render") {
        return Ok(FormElement::Textarea(Textarea {
            id: value::string(fields, "id"),
            label: value::string(fields, "label"),
            description: value::string(fields, "description"),
            placeholder: value::string(fields, "placeholder"),
            value: value::string(fields, "value"),
            render: value::string(fields, "render"),
            required: value::boolean(fields, "required").unwrap_or(false),
        }));
    }
    if let Some(options) = fields.get("options").and_then(Value::as_array) {
        if options.first().is_some_and(Value::is_object) {
            return Ok(FormElement::Checkboxes(Checkboxes {
                id: value::string(fields, "id"),
                label: value::string(fields, "label"),
                description: value::string(fields, "description"),
                options: check_options_from(options),
            }));
        }
        return Ok(FormElement::Dropdown(Dropdown {
            id: value::string(fields, "id"),
            label: value::string(fields, "label"),
            description: value::string(fields, "description"),
            multiple: value::boolean(fields, "multiple").unwrap_or(false),
            options: options
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            required: value::boolean(fields, "required").unwrap_or(false),
        }));
    }
    if fields.contains_key("value") {
        if fields.contains_key("label") {
            return Ok(FormElement::Input(Input {
                id: value::string(fields, "id"),
                label: value::string(fields, "label"),
                description: value::string(fields, "description"),
                placeholder: value::string(fields, "placeholder"),
                value: value::string(fields, "value"),
                required: value::boolean(fields, "required").unwrap_or(false),
            }));
        }
        return Ok(FormElement::Markdown(Markdown {
            value: value::string(fields, "value"),
        }));
    }
    Err(ShapeError::UnknownFormElement { index })
}

fn check_options_from(options: &[Value]) -> Vec<CheckOption> {
    options
        .iter()
        .filter_map(Value::as_object)
        .map(|option| CheckOption {
            label: value::string(option, "label"),
            required: value::boolean(option, "required").unwrap_or(false),
        })
        .collect()
}
