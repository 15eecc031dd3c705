use crate::domain::recipient::{CsvRow, ValidationError, read_rows};
use crate::domain::template::{ContentKind, EmailTemplate};
use crate::error::AppError;
use axum::extract::multipart::{Field, Multipart};

#[derive(Debug)]
pub struct TemplateUpload {
    pub file_name: Option<String>,
    pub content: String,
}

/// The multipart body of `POST /send-emails`.
#[derive(Debug, Default)]
pub struct SendEmailsForm {
    pub csv: Option<String>,
    pub template_file: Option<TemplateUpload>,
    pub email_subject: Option<String>,
    pub email_body: Option<String>,
    pub is_html: bool,
}

impl SendEmailsForm {
    /// Reads every recognised field; unknown fields are skipped.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the multipart stream is malformed or
    /// an uploaded part is not UTF-8.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(|e| AppError::BadRequest(e.body_text()))? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match name.as_str() {
                "csv_file" => form.csv = Some(read_text(field, &name).await?),
                "template_file" => {
                    let file_name = field.file_name().map(str::to_string);
                    let content = read_text(field, &name).await?;
                    form.template_file = Some(TemplateUpload { file_name, content });
                }
                "email_subject" => form.email_subject = Some(read_text(field, &name).await?),
                "email_body" => form.email_body = Some(read_text(field, &name).await?),
                "isHtml" => form.is_html = read_text(field, &name).await?.trim().eq_ignore_ascii_case("true"),
                _ => tracing::debug!(field = %name, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Splits the CSV into rows and picks the template source. Explicit
    /// subject/body fields take precedence over an uploaded template file.
    ///
    /// # Errors
    /// Returns `AppError::BadRequest` if the CSV or every template source is missing.
    pub fn into_job_parts(self) -> Result<(Vec<Result<CsvRow, ValidationError>>, EmailTemplate), AppError> {
        let csv = self.csv.ok_or_else(|| AppError::BadRequest("Missing csv_file upload".into()))?;

        let template = match (self.email_subject, self.email_body, self.template_file) {
            (Some(subject), Some(body), _) => {
                EmailTemplate::Fields { subject, body, kind: ContentKind::from_flag(self.is_html) }
            }
            (_, _, Some(upload)) => EmailTemplate::Combined {
                kind: ContentKind::detect(upload.file_name.as_deref(), &upload.content),
                source: upload.content,
            },
            _ => {
                return Err(AppError::BadRequest(
                    "Provide either template_file or both email_subject and email_body".into(),
                ));
            }
        };

        Ok((read_rows(&csv), template))
    }
}

async fn read_text(field: Field<'_>, name: &str) -> Result<String, AppError> {
    let bytes = field.bytes().await.map_err(|e| AppError::BadRequest(e.body_text()))?;
    String::from_utf8(bytes.to_vec()).map_err(|_| AppError::BadRequest(format!("{name} must be UTF-8 text")))
}
