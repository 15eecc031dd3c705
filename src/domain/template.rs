use thiserror::Error;

const SUBJECT_MARKER: &str = "Subject:";
const BODY_MARKER: &str = "Body:";
const PLACEHOLDERS: [&str; 2] = ["{name}", "{first_name}"];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid template format. Ensure it has 'Subject:' and 'Body:' sections")]
pub struct TemplateFormatError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentKind {
    #[default]
    Plain,
    Html,
}

impl ContentKind {
    #[must_use]
    pub const fn from_flag(is_html: bool) -> Self {
        if is_html { Self::Html } else { Self::Plain }
    }

    /// Guesses the content kind of an uploaded template from its file name and text.
    #[must_use]
    pub fn detect(file_name: Option<&str>, text: &str) -> Self {
        let by_name = file_name.is_some_and(|name| {
            let name = name.to_ascii_lowercase();
            name.ends_with(".html") || name.ends_with(".htm")
        });
        let lower = text.to_ascii_lowercase();
        Self::from_flag(by_name || lower.contains("<html") || lower.contains("<!doctype html"))
    }
}

/// A subject/body pair with every recognised placeholder substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub body: String,
    pub kind: ContentKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    /// A single document holding `Subject:` and `Body:` sections.
    Combined { source: String, kind: ContentKind },
    /// Subject and body supplied as separate form fields.
    Fields { subject: String, body: String, kind: ContentKind },
}

impl EmailTemplate {
    /// Renders the template for one recipient.
    ///
    /// # Errors
    /// Returns `TemplateFormatError` if a combined template lacks its `Subject:`
    /// or `Body:` section.
    pub fn render(&self, first_name: &str) -> Result<RenderedMessage, TemplateFormatError> {
        match self {
            Self::Combined { source, kind } => {
                let (subject, body) = split_sections(source)?;
                Ok(RenderedMessage {
                    subject: substitute(subject, first_name),
                    body: substitute(body, first_name),
                    kind: *kind,
                })
            }
            Self::Fields { subject, body, kind } => Ok(RenderedMessage {
                subject: substitute(subject, first_name),
                body: substitute(body, first_name),
                kind: *kind,
            }),
        }
    }
}

fn split_sections(source: &str) -> Result<(&str, &str), TemplateFormatError> {
    let (head, body) = source.split_once(BODY_MARKER).ok_or(TemplateFormatError)?;
    let (_, subject) = head.split_once(SUBJECT_MARKER).ok_or(TemplateFormatError)?;
    Ok((subject.trim(), body.trim()))
}

// Single left-to-right pass: text inserted for a placeholder is never rescanned.
fn substitute(text: &str, first_name: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match PLACEHOLDERS.iter().find(|placeholder| tail.starts_with(**placeholder)) {
            Some(placeholder) => {
                out.push_str(first_name);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
