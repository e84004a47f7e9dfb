use slog::debug;
use warp::{
    filters::multipart::FormData,
    http::StatusCode,
    reject,
    reply::{with_status, Reply},
};

use crate::doctor::NewDoctor;
use crate::environment::Environment;
use crate::errors::BackendError;
use crate::form::{self, UploadedFile};
use crate::routes::rejection::{Context, Rejection};

/// The field name the license PDF arrives under.
const LICENSE_FILE_FIELD: &str = "licenseFile";

const SUCCESS_MESSAGE: &str = "Doctor registered successfully!";

type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

/// Runs one registration end to end: parse the multipart body, check
/// and write the license file, normalize the fields, insert the
/// record. The file write strictly precedes record construction,
/// which strictly precedes the insert.
pub async fn register(environment: Environment, content: FormData) -> RouteResult {
    let Environment { logger, db, store } = environment;

    let error_handler = |e: BackendError| Rejection::new(Context::register(None), e);

    debug!(logger, "Parsing submission...");
    let mut form = form::parse_form(content, LICENSE_FILE_FIELD)
        .await
        .map_err(error_handler)?;

    debug!(logger, "Checking license file...");
    let UploadedFile { filename, data, .. } =
        check_license_file(form.take_file()).map_err(error_handler)?;

    debug!(logger, "Writing license file..."; "filename" => &filename);
    let path = store.save(&filename, data).await.map_err(error_handler)?;

    debug!(logger, "Normalizing form...");
    let doctor = NewDoctor::from_form(&form, path.to_string_lossy().into_owned())
        .map_err(error_handler)?;

    let email = doctor.email.clone();
    let error_handler =
        |e: BackendError| Rejection::new(Context::register(Some(email.clone())), e);

    debug!(logger, "Writing record to database..."; "email" => email.clone());
    let record = db.insert(doctor).await.map_err(error_handler)?;

    debug!(logger, "Registered doctor"; "id" => %record.id);

    Ok(Box::new(with_status(SUCCESS_MESSAGE.to_owned(), StatusCode::OK)) as Box<dyn Reply>)
}

/// Rejects a missing upload or one whose declared content type is not
/// `application/pdf`. Runs before the file is written anywhere.
fn check_license_file(file: Option<UploadedFile>) -> Result<UploadedFile, BackendError> {
    let file = file.ok_or(BackendError::PartsMissing)?;

    let is_pdf = file
        .content_type
        .parse::<mime::Mime>()
        .map(|m| m.essence_str() == mime::APPLICATION_PDF.essence_str())
        .unwrap_or(false);

    if !is_pdf {
        return Err(BackendError::UnsupportedMediaType {
            content_type: file.content_type,
        });
    }

    Ok(file)
}
