//! Issue, discussion and pull request template declarations.
//!
//! Issue and discussion bodies are lists of [`FormElement`]s. The enum is
//! untagged: a serialized element carries no `type` marker, only its own
//! fields. Each variant therefore always serializes the fields that identify
//! it (`value` for markdown, `label` plus `value` for inputs, `render` for
//! textareas, `options` for dropdowns and checkboxes), even when they are
//! empty, so the variant stays recoverable from the field set alone.

use serde::Serialize;

fn is_false(value: &bool) -> bool {
    !*value
}

/// One element of an issue or discussion form body.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FormElement {
    Markdown(Markdown),
    Input(Input),
    Textarea(Textarea),
    Dropdown(Dropdown),
    Checkboxes(Checkboxes),
}

impl FormElement {
    /// Shorthand for a markdown block.
    #[must_use]
    pub fn markdown(value: impl Into<String>) -> Self {
        Self::Markdown(Markdown {
            value: value.into(),
        })
    }
}

impl From<Markdown> for FormElement {
    fn from(element: Markdown) -> Self {
        Self::Markdown(element)
    }
}

impl From<Input> for FormElement {
    fn from(element: Input) -> Self {
        Self::Input(element)
    }
}

impl From<Textarea> for FormElement {
    fn from(element: Textarea) -> Self {
        Self::Textarea(element)
    }
}

impl From<Dropdown> for FormElement {
    fn from(element: Dropdown) -> Self {
        Self::Dropdown(element)
    }
}

impl From<Checkboxes> for FormElement {
    fn from(element: Checkboxes) -> Self {
        Self::Checkboxes(element)
    }
}

/// Static markdown rendered inside the form. The only element without a
/// label.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Markdown {
    pub value: String,
}

/// Single-line text input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Input {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub placeholder: String,
    pub value: String,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
}

impl Input {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Multi-line text input. `render` selects syntax highlighting for the
/// submitted text and doubles as the field that tells a textarea apart from
/// a plain input.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Textarea {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub placeholder: String,
    pub value: String,
    pub render: String,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
}

impl Textarea {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn with_render(mut self, render: impl Into<String>) -> Self {
        self.render = render.into();
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Selection from a fixed list of string options.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dropdown {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "is_false")]
    pub multiple: bool,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
}

impl Dropdown {
    #[must_use]
    pub fn new(label: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            label: label.into(),
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A set of checkboxes. Options are labelled objects, which is what
/// distinguishes checkboxes from a dropdown once serialized.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Checkboxes {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub options: Vec<CheckOption>,
}

impl Checkboxes {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_option(mut self, label: impl Into<String>, required: bool) -> Self {
        self.options.push(CheckOption {
            label: label.into(),
            required,
        });
        self
    }
}

/// One checkbox within a [`Checkboxes`] element.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckOption {
    pub label: String,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
}

/// A GitHub issue form, emitted under `.github/ISSUE_TEMPLATE/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IssueTemplate {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assignees: Vec<String>,
    pub body: Vec<FormElement>,
}

/// A discussion category form, emitted under `.github/DISCUSSION_TEMPLATE/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscussionTemplate {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub body: Vec<FormElement>,
}

/// A pull request template: free-form markdown, emitted verbatim.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PrTemplate(pub String);

impl PrTemplate {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self(content.into())
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrTemplate {
    fn from(content: &str) -> Self {
        Self(content.to_string())
    }
}

impl From<String> for PrTemplate {
    fn from(content: String) -> Self {
        Self(content)
    }
}
