//! Rendering of configuration values into the file bodies GitHub reads.
//!
//! YAML kinds get a generated-file header; the pull request template is
//! markdown and is emitted verbatim (a `#` header line would render as a
//! heading there). Issue and discussion forms are restructured on the way
//! out: the flat [`FormElement`](crate::templates::FormElement) fields
//! become the `type`/`attributes`/`validations` layout GitHub's form schema
//! expects.

use serde::Serialize;
use thiserror::Error;

use crate::codeowners::Codeowners;
use crate::dependabot::Dependabot;
use crate::templates::{DiscussionTemplate, FormElement, IssueTemplate, PrTemplate};
use crate::workflow::Workflow;

/// Header prepended to every generated YAML and CODEOWNERS file.
pub const GENERATED_HEADER: &str =
    "# Generated by gantry - do not edit manually\n# Regenerate with: gantry generate\n\n";

/// Rendering failure.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to serialize to YAML")]
    Yaml(#[from] serde_yaml::Error),
}

/// Render a workflow to YAML with the generated-file header.
pub fn workflow(workflow: &Workflow) -> Result<String, EmitError> {
    Ok(format!(
        "{GENERATED_HEADER}{}",
        serde_yaml::to_string(workflow)?
    ))
}

/// Render a Dependabot configuration to YAML with the generated-file header.
pub fn dependabot(config: &Dependabot) -> Result<String, EmitError> {
    Ok(format!(
        "{GENERATED_HEADER}{}",
        serde_yaml::to_string(config)?
    ))
}

/// Render an issue form to GitHub's form schema YAML.
pub fn issue_template(template: &IssueTemplate) -> Result<String, EmitError> {
    let doc = IssueDoc {
        name: &template.name,
        description: &template.description,
        title: &template.title,
        labels: &template.labels,
        assignees: &template.assignees,
        body: template.body.iter().map(element_doc).collect(),
    };
    Ok(format!("{GENERATED_HEADER}{}", serde_yaml::to_string(&doc)?))
}

/// Render a discussion category form to GitHub's form schema YAML.
pub fn discussion_template(template: &DiscussionTemplate) -> Result<String, EmitError> {
    let doc = DiscussionDoc {
        title: &template.title,
        labels: &template.labels,
        body: template.body.iter().map(element_doc).collect(),
    };
    Ok(format!("{GENERATED_HEADER}{}", serde_yaml::to_string(&doc)?))
}

/// Render a pull request template, normalized to end in a newline.
#[must_use]
pub fn pr_template(template: &PrTemplate) -> String {
    let content = template.content();
    if content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    }
}

/// Render a CODEOWNERS file. Each rule becomes `pattern owner...`, preceded
/// by a `# comment` line when the rule carries one.
#[must_use]
pub fn codeowners(config: &Codeowners) -> String {
    let mut out = String::from(GENERATED_HEADER);
    for rule in &config.rules {
        if !rule.comment.is_empty() {
            out.push_str("# ");
            out.push_str(&rule.comment);
            out.push('\n');
        }
        out.push_str(&rule.pattern);
        for owner in &rule.owners {
            out.push(' ');
            out.push_str(owner);
        }
        out.push('\n');
    }
    out
}

/// Turn a declaration name into a safe file stem, e.g. `"Bug Report
/// v1.2"` into `"bug-report-v1-2"`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.to_lowercase()
        .replace([' ', '.'], "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

#[derive(Serialize)]
struct IssueDoc<'a> {
    name: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    title: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    labels: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    assignees: &'a [String],
    body: Vec<ElementDoc<'a>>,
}

#[derive(Serialize)]
struct DiscussionDoc<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    title: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    labels: &'a [String],
    body: Vec<ElementDoc<'a>>,
}

#[derive(Serialize)]
struct ElementDoc<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    attributes: AttributesDoc<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validations: Option<ValidationsDoc>,
}

#[derive(Default, Serialize)]
struct AttributesDoc<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    placeholder: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    render: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multiple: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OptionsDoc<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum OptionsDoc<'a> {
    Strings(&'a [String]),
    Checks(Vec<CheckDoc<'a>>),
}

#[derive(Serialize)]
struct CheckDoc<'a> {
    label: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    required: bool,
}

#[derive(Serialize)]
struct ValidationsDoc {
    required: bool,
}

fn opt(text: &str) -> Option<&str> {
    (!text.is_empty()).then_some(text)
}

fn required_doc(required: bool) -> Option<ValidationsDoc> {
    required.then_some(ValidationsDoc { required: true })
}

fn element_doc(element: &FormElement) -> ElementDoc<'_> {
    match element {
        FormElement::Markdown(markdown) => ElementDoc {
            kind: "markdown",
            id: None,
            attributes: AttributesDoc {
                value: Some(&markdown.value),
                ..AttributesDoc::default()
            },
            validations: None,
        },
        FormElement::Input(input) => ElementDoc {
            kind: "input",
            id: opt(&input.id),
            attributes: AttributesDoc {
                label: Some(&input.label),
                description: opt(&input.description),
                placeholder: opt(&input.placeholder),
                value: opt(&input.value),
                ..AttributesDoc::default()
            },
            validations: required_doc(input.required),
        },
        FormElement::Textarea(textarea) => ElementDoc {
            kind: "textarea",
            id: opt(&textarea.id),
            attributes: AttributesDoc {
                label: Some(&textarea.label),
                description: opt(&textarea.description),
                placeholder: opt(&textarea.placeholder),
                value: opt(&textarea.value),
                render: opt(&textarea.render),
                ..AttributesDoc::default()
            },
            validations: required_doc(textarea.required),
        },
        FormElement::Dropdown(dropdown) => ElementDoc {
            kind: "dropdown",
            id: opt(&dropdown.id),
            attributes: AttributesDoc {
                label: Some(&dropdown.label),
                description: opt(&dropdown.description),
                multiple: dropdown.multiple.then_some(true),
                options: Some(OptionsDoc::Strings(&dropdown.options)),
                ..AttributesDoc::default()
            },
            validations: required_doc(dropdown.required),
        },
        FormElement::Checkboxes(checkboxes) => ElementDoc {
            kind: "checkboxes",
            id: opt(&checkboxes.id),
            attributes: AttributesDoc {
                label: Some(&checkboxes.label),
                description: opt(&checkboxes.description),
                options: Some(OptionsDoc::Checks(
                    checkboxes
                        .options
                        .iter()
                        .map(|option| CheckDoc {
                            label: &option.label,
                            required: option.required,
                        })
                        .collect(),
                )),
                ..AttributesDoc::default()
            },
            validations: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codeowners::Rule;
    use crate::templates::{Checkboxes, Dropdown, Input, Textarea};
    use crate::workflow::{Job, JobMap, On, Push};

    #[test]
    fn test_workflow_emits_header_first() {
        let mut jobs = JobMap::new();
        jobs.insert("build".to_string(), Job::default());
        let workflow = Workflow {
            name: "CI".to_string(),
            on: On {
                push: Some(Push::default()),
                ..On::default()
            },
            jobs,
            ..Workflow::default()
        };
        let yaml = workflow_yaml(&workflow);
        assert!(yaml.starts_with("# Generated by gantry"));
        assert!(yaml.contains("Regenerate with: gantry generate"));
        assert!(yaml.contains("name: CI"));
    }

    fn workflow_yaml(value: &Workflow) -> String {
        workflow(value).unwrap()
    }

    #[test]
    fn test_issue_form_elements_get_type_tags() {
        let template = IssueTemplate {
            name: "Bug".to_string(),
            description: "Report a bug".to_string(),
            body: vec![
                FormElement::markdown("Thanks for filing!"),
                Input::new("Version").with_id("version").required().into(),
                Textarea::new("Logs").with_render("shell").into(),
            ],
            ..IssueTemplate::default()
        };
        let yaml = issue_template(&template).unwrap();
        assert!(yaml.contains("type: markdown"));
        assert!(yaml.contains("type: input"));
        assert!(yaml.contains("type: textarea"));
        assert!(yaml.contains("id: version"));
        assert!(yaml.contains("render: shell"));
        assert!(yaml.contains("required: true"));
    }

    #[test]
    fn test_markdown_element_has_no_validations() {
        let template = DiscussionTemplate {
            body: vec![FormElement::markdown("Welcome")],
            ..DiscussionTemplate::default()
        };
        let yaml = discussion_template(&template).unwrap();
        assert!(!yaml.contains("validations"));
        assert!(yaml.contains("value: Welcome"));
    }

    #[test]
    fn test_dropdown_and_checkbox_options() {
        let template = IssueTemplate {
            name: "Triage".to_string(),
            description: "Triage form".to_string(),
            body: vec![
                Dropdown::new("Severity", vec!["low".to_string(), "high".to_string()])
                    .required()
                    .into(),
                Checkboxes::new("Checklist")
                    .with_option("Searched existing issues", true)
                    .into(),
            ],
            ..IssueTemplate::default()
        };
        let yaml = issue_template(&template).unwrap();
        assert!(yaml.contains("type: dropdown"));
        assert!(yaml.contains("- low"));
        assert!(yaml.contains("type: checkboxes"));
        assert!(yaml.contains("label: Searched existing issues"));
    }

    #[test]
    fn test_pr_template_gets_trailing_newline_and_no_header() {
        let body = pr_template(&PrTemplate::new("## Summary"));
        assert_eq!(body, "## Summary\n");
        let unchanged = pr_template(&PrTemplate::new("## Summary\n"));
        assert_eq!(unchanged, "## Summary\n");
    }

    #[test]
    fn test_codeowners_render() {
        let config = Codeowners::new()
            .with_rule(Rule::new("/ci/", &["@org/infra"]).with_comment("Infra owns CI"))
            .rule("*", &["@org/core", "@lead"]);
        let text = codeowners(&config);
        let expected = "# Generated by gantry - do not edit manually\n\
                        # Regenerate with: gantry generate\n\
                        \n\
                        # Infra owns CI\n\
                        /ci/ @org/infra\n\
                        * @org/core @lead\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("My Workflow"), "my-workflow");
        assert_eq!(sanitize_filename("release v1.2"), "release-v1-2");
        assert_eq!(sanitize_filename("weird!st?uff"), "weirdstuff");
    }
}
