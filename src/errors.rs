use thiserror::Error;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Represents an upload whose declared content type is not PDF.
    /// Raised before the file is written anywhere.
    #[error("only PDF files are allowed (got {content_type})")]
    UnsupportedMediaType { content_type: String },

    /// Represents a submission reusing an email or license number
    /// already present in the database.
    #[error("duplicate email or license number")]
    DuplicateEntry,

    /// Represents a submission with no license file part.
    #[error("no license file was uploaded")]
    PartsMissing,

    /// Represents a required field that was not submitted.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// Represents a field whose value could not be interpreted.
    #[error("invalid value for {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    /// Represents timing day/from/to fields describing different
    /// numbers of slots.
    #[error("timing days, from and to must have the same number of entries")]
    MismatchedTimingSlots,

    /// Represents a multipart body that could not be parsed.
    #[error("could not parse form submission")]
    MalformedFormSubmission,

    /// Represents a failure to write the uploaded file to disk.
    #[error("could not store the uploaded license file")]
    FileWriteFailed { source: std::io::Error },

    /// Represents an SQL error.
    #[error("database unavailable")]
    Sqlx { source: sqlx::Error },
}
