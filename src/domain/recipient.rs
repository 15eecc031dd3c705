use std::collections::HashMap;
use thiserror::Error;

const NAME_COLUMN: &str = "name";
const EMAIL_COLUMN: &str = "email";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Malformed CSV row: {0}")]
    Malformed(String),
}

/// One CSV data record keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    fields: HashMap<String, String>,
}

impl CsvRow {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CsvRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

/// Splits a CSV document into rows keyed by its header row.
///
/// Each record is parsed independently: a record the reader rejects becomes an
/// `Err` entry in its position instead of aborting the document. Records with
/// fewer cells than the header simply lack the trailing columns.
#[must_use]
pub fn read_rows(document: &str) -> Vec<Result<CsvRow, ValidationError>> {
    let document = document.strip_prefix('\u{feff}').unwrap_or(document);
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(document.as_bytes());

    let headers = match reader.headers() {
        Ok(headers) => headers.clone(),
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable CSV header row");
            return Vec::new();
        }
    };

    reader
        .records()
        .map(|record| {
            record
                .map(|record| headers.iter().zip(record.iter()).collect::<CsvRow>())
                .map_err(|e| ValidationError::Malformed(e.to_string()))
        })
        .collect()
}

/// A validated row: the first-name token and the delivery address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    first_name: String,
    email: String,
}

impl Recipient {
    /// Extracts the `name` and `email` columns from a row.
    ///
    /// # Errors
    /// Returns `ValidationError::MissingFields` naming every required column
    /// that is absent or blank after trimming.
    pub fn from_row(row: &CsvRow) -> Result<Self, ValidationError> {
        let name = row.get(NAME_COLUMN).unwrap_or_default().trim();
        let email = row.get(EMAIL_COLUMN).unwrap_or_default().trim();

        let missing: Vec<&'static str> = [(NAME_COLUMN, name), (EMAIL_COLUMN, email)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let first_name = name.split_whitespace().next().unwrap_or(name);
        Ok(Self { first_name: first_name.to_string(), email: email.to_string() })
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, email: &str) -> CsvRow {
        [("name", name), ("email", email)].into_iter().collect()
    }

    #[test]
    fn test_first_name_is_first_token() {
        let recipient = Recipient::from_row(&row("  Grace   Brewster Hopper ", " grace@x.com ")).unwrap();
        assert_eq!(recipient.first_name(), "Grace");
        assert_eq!(recipient.email(), "grace@x.com");
    }

    #[test]
    fn test_single_token_name_is_kept_whole() {
        let recipient = Recipient::from_row(&row("Ada", "ada@x.com")).unwrap();
        assert_eq!(recipient.first_name(), "Ada");
    }

    #[test]
    fn test_missing_name() {
        let err = Recipient::from_row(&row("   ", "bob@x.com")).unwrap_err();
        assert_eq!(err.to_string(), "Missing field(s): name");
    }

    #[test]
    fn test_missing_both_fields_names_each() {
        let err = Recipient::from_row(&CsvRow::default()).unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(vec!["name", "email"]));
        assert_eq!(err.to_string(), "Missing field(s): name, email");
    }

    #[test]
    fn test_column_names_are_case_sensitive() {
        let row: CsvRow = [("Name", "Grace"), ("Email", "grace@x.com")].into_iter().collect();
        let err = Recipient::from_row(&row).unwrap_err();
        assert_eq!(err.to_string(), "Missing field(s): name, email");
    }

    #[test]
    fn test_read_rows_keys_by_header_and_ignores_extra_columns() {
        let rows = read_rows("name,email,company\nGrace Hopper,grace@x.com,Navy\n,bob@x.com,\n");
        assert_eq!(rows.len(), 2);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.get("name"), Some("Grace Hopper"));
        assert_eq!(first.get("email"), Some("grace@x.com"));
        assert_eq!(first.get("company"), Some("Navy"));

        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.get("name"), Some(""));
    }

    #[test]
    fn test_read_rows_short_record_lacks_trailing_columns() {
        let rows = read_rows("email,name\ncarol@x.com\n");
        let only = rows[0].as_ref().unwrap();
        assert_eq!(only.get("name"), None);
        assert_eq!(Recipient::from_row(only).unwrap_err().to_string(), "Missing field(s): name");
    }

    #[test]
    fn test_read_rows_header_only_and_empty_documents() {
        assert!(read_rows("name,email\n").is_empty());
        assert!(read_rows("").is_empty());
    }

    #[test]
    fn test_read_rows_strips_byte_order_mark() {
        let rows = read_rows("\u{feff}name,email\r\nAda Lovelace,ada@x.com\r\n");
        let only = rows[0].as_ref().unwrap();
        assert_eq!(only.get("name"), Some("Ada Lovelace"));
    }
}
