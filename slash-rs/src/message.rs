//! Outgoing messages, response templates and formatting.

use serde::{Deserialize, Serialize};

/// Zero-width space appended to padded field values
const FIELD_PADDING: &str = "\n\u{200b}";

/// A single embed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Rich embed attached to a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "color", skip_serializing_if = "Option::is_none")]
    pub colour: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        inline: bool,
    ) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

/// Message delivered back to the requester
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl Message {
    /// Plain-text message
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    /// Message carrying a single embed
    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }

    /// Visible text: the first embed description, else the content
    pub fn text(&self) -> Option<&str> {
        self.embeds
            .first()
            .and_then(|embed| embed.description.as_deref())
            .or(self.content.as_deref())
    }

    /// Apply client formatting to every embed
    pub fn apply_formatting(&mut self, formatting: &Formatting) {
        for embed in &mut self.embeds {
            embed.colour = Some(formatting.colour);

            if formatting.pad_fields {
                for field in &mut embed.fields {
                    field.value.push_str(FIELD_PADDING);
                }
            }
        }
    }
}

/// Templates for the framework's own responses.
///
/// `{source}` and `{permissions}` are substituted when rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Title of a validation-failure embed, `{source}` is the argument name
    pub parameter_failure: String,
    /// Body of a permission rejection, `{permissions}` is the missing listing
    pub insufficient_permissions: String,
    /// Title of a user-error embed
    pub error_title: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            parameter_failure: "Error with parameter `{source}`".to_string(),
            insufficient_permissions: "You need {permissions} in order to run this command."
                .to_string(),
            error_title: "Error".to_string(),
        }
    }
}

impl Messages {
    pub fn parameter_failure(&self, source: &str) -> String {
        self.parameter_failure.replace("{source}", source)
    }

    pub fn insufficient_permissions<S: AsRef<str>>(&self, missing: &[S]) -> String {
        let listing = format_listing(missing, |name| format!("`{}`", name));
        self.insufficient_permissions
            .replace("{permissions}", &listing)
    }
}

/// Formatting applied to outgoing embeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Formatting {
    pub colour: u32,
    pub pad_fields: bool,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            colour: 0xffffff,
            pad_fields: true,
        }
    }
}

/// Join items as `a, b and c`
pub fn format_listing<S: AsRef<str>>(items: &[S], render: impl Fn(&str) -> String) -> String {
    let rendered: Vec<String> = items.iter().map(|item| render(item.as_ref())).collect();

    match rendered.split_last() {
        None => String::new(),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    }
}
