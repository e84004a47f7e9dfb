//! Parsing of the raw multipart submission.

use bytes::{Buf, Bytes};
use futures::stream::{StreamExt, TryStreamExt};
use warp::multipart::{FormData, Part};

use crate::errors::BackendError;

/// One text field as submitted. Repeated fields arrive as separate
/// parts sharing a name; the tagged shape keeps scalar and sequence
/// submissions distinct until the caller normalizes them.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Scalar(String),
    Sequence(Vec<String>),
}

impl FieldValue {
    /// Normalizes to a sequence: a scalar becomes a one-element
    /// sequence, a sequence passes through unchanged.
    pub fn into_sequence(self) -> Vec<String> {
        match self {
            FieldValue::Scalar(value) => vec![value],
            FieldValue::Sequence(values) => values,
        }
    }
}

/// The uploaded license file, held in memory until it passes the
/// content-type check.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A parsed multipart submission: text fields in submission order,
/// plus at most one file.
#[derive(Debug, Default)]
pub struct ParsedForm {
    fields: Vec<(String, String)>,
    file: Option<UploadedFile>,
}

impl ParsedForm {
    /// Builds a form from already-extracted text fields.
    pub fn from_fields(fields: Vec<(String, String)>) -> Self {
        ParsedForm { fields, file: None }
    }

    /// Returns the submitted value for `name`, tagged by shape, or
    /// `None` if the field never appeared.
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        let mut values = self
            .fields
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .collect::<Vec<_>>();

        match values.len() {
            0 => None,
            1 => Some(FieldValue::Scalar(values.remove(0))),
            _ => Some(FieldValue::Sequence(values)),
        }
    }

    /// Returns a required scalar field or the error naming it. A
    /// repeated field contributes its first value.
    pub fn required(&self, name: &'static str) -> Result<String, BackendError> {
        match self.field(name) {
            Some(FieldValue::Scalar(value)) if !value.trim().is_empty() => Ok(value),
            Some(FieldValue::Sequence(mut values)) if !values.is_empty() => Ok(values.remove(0)),
            _ => Err(BackendError::MissingField { field: name }),
        }
    }

    /// Removes and returns the file part, if one was submitted.
    pub fn take_file(&mut self) -> Option<UploadedFile> {
        self.file.take()
    }
}

/// Collects the parts of a multipart submission. The file part is
/// recognized by its field name; everything else is treated as text.
pub async fn parse_form(content: FormData, file_field: &str) -> Result<ParsedForm, BackendError> {
    let parts: Vec<Part> = content
        .try_collect()
        .await
        .map_err(|_| BackendError::MalformedFormSubmission)?;

    let mut form = ParsedForm::default();

    for part in parts {
        let name = part.name().to_owned();

        if name == file_field {
            let filename = part
                .filename()
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| "license.pdf".to_owned());
            let content_type = part
                .content_type()
                .map(ToOwned::to_owned)
                .unwrap_or_default();
            let data = part_as_vec(part).await?;

            form.file = Some(UploadedFile {
                filename,
                content_type,
                data,
            });
        } else {
            let data = part_as_vec(part).await?;
            let value =
                String::from_utf8(data).map_err(|_| BackendError::MalformedFormSubmission)?;

            form.fields.push((name, value));
        }
    }

    Ok(form)
}

/// Collects the chunks of one part.
async fn part_as_vec(part: Part) -> Result<Vec<u8>, BackendError> {
    let chunks: Vec<Bytes> = part
        .stream()
        .map(|r| r.map(|mut b| b.copy_to_bytes(b.remaining())))
        .try_collect()
        .await
        .map_err(|_| BackendError::MalformedFormSubmission)?;

    Ok(chunks.concat())
}
