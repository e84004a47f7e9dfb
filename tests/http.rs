use std::fs;
use std::sync::Arc;

use bytes::Bytes;
use slog::{o, Discard, Logger};
use warp::http::{Response, StatusCode};
use warp::{Filter, Reply};

use doctor_registry::db::mock::MemoryDb;
use doctor_registry::doctor::TimingSlot;
use doctor_registry::environment::Environment;
use doctor_registry::routes;
use doctor_registry::store::DiskStore;

const BOUNDARY: &str = "thisisaboundary1234";

const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< >>\nendobj\ntrailer\n<< >>\n%%EOF\n";

const SUCCESS_MESSAGE: &str = "Doctor registered successfully!";

const DUPLICATE_MESSAGE: &str =
    "Duplicate entry detected. Please check your email or license number.";

struct TestBackend {
    db: Arc<MemoryDb>,
    uploads: tempfile::TempDir,
}

fn make_backend() -> TestBackend {
    TestBackend {
        db: Arc::new(MemoryDb::new()),
        uploads: tempfile::tempdir().expect("create temporary upload directory"),
    }
}

fn make_register_filter(
    backend: &TestBackend,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
    let logger = Arc::new(Logger::root(Discard, o!()));
    let store = Arc::new(DiskStore::new(backend.uploads.path()));
    let environment = Environment::new(logger.clone(), backend.db.clone(), store);

    routes::make_register_route(environment)
        .recover(move |r| routes::format_rejection(logger.clone(), r))
}

#[tokio::test]
async fn registering_works() {
    let backend = make_backend();
    let filter = make_register_filter(&backend);

    let response = submit(
        &filter,
        &base_fields("asha@example.com", "MCI-12345"),
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(&response), SUCCESS_MESSAGE);

    let records = backend.db.records();
    assert_eq!(records.len(), 1);

    let doctor = &records[0].doctor;
    assert_eq!(doctor.full_name, "Asha Rao");
    assert_eq!(doctor.email, "asha@example.com");
    assert_eq!(doctor.specializations, vec!["Cardiology".to_owned()]);
    assert_eq!(
        doctor.timing_slots,
        vec![
            TimingSlot {
                day: "Mon".to_owned(),
                from: "09:00".to_owned(),
                to: "12:00".to_owned(),
            },
            TimingSlot {
                day: "Tue".to_owned(),
                from: "10:00".to_owned(),
                to: "13:00".to_owned(),
            },
        ]
    );

    // the file must have landed under the upload directory before the
    // record was written
    assert!(doctor.license_file.ends_with("-license.pdf"));
    let stored = fs::read(&doctor.license_file).expect("read stored license file");
    assert_eq!(stored, PDF_BYTES);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let backend = make_backend();
    let filter = make_register_filter(&backend);

    let response = submit(
        &filter,
        &base_fields("asha@example.com", "MCI-12345"),
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = submit(
        &filter,
        &base_fields("asha@example.com", "MCI-99999"),
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(&response), DUPLICATE_MESSAGE);
    assert_eq!(backend.db.records().len(), 1);
}

#[tokio::test]
async fn duplicate_license_number_is_rejected() {
    let backend = make_backend();
    let filter = make_register_filter(&backend);

    let response = submit(
        &filter,
        &base_fields("asha@example.com", "MCI-12345"),
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = submit(
        &filter,
        &base_fields("vikram@example.com", "MCI-12345"),
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(&response), DUPLICATE_MESSAGE);
    assert_eq!(backend.db.records().len(), 1);
}

#[tokio::test]
async fn non_pdf_upload_is_rejected_before_any_write() {
    let backend = make_backend();
    let filter = make_register_filter(&backend);

    let response = submit(
        &filter,
        &base_fields("asha@example.com", "MCI-12345"),
        Some(("license.txt", "text/plain", b"not a pdf")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(backend.db.records().is_empty());

    // nothing may reach the upload directory
    let uploaded = fs::read_dir(backend.uploads.path())
        .expect("read upload directory")
        .count();
    assert_eq!(uploaded, 0);
}

#[tokio::test]
async fn missing_file_is_rejected() {
    let backend = make_backend();
    let filter = make_register_filter(&backend);

    let response = submit(&filter, &base_fields("asha@example.com", "MCI-12345"), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(backend.db.records().is_empty());
}

#[tokio::test]
async fn mismatched_timing_fields_are_rejected() {
    let backend = make_backend();
    let filter = make_register_filter(&backend);

    let mut fields = base_fields("asha@example.com", "MCI-12345");
    fields.retain(|(name, _)| name != "timingFrom");
    fields.push(("timingFrom".to_owned(), "09:00".to_owned()));

    let response = submit(
        &filter,
        &fields,
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(backend.db.records().is_empty());
}

#[tokio::test]
async fn missing_required_field_is_named_in_the_response() {
    let backend = make_backend();
    let filter = make_register_filter(&backend);

    let mut fields = base_fields("asha@example.com", "MCI-12345");
    fields.retain(|(name, _)| name != "bio");

    let response = submit(
        &filter,
        &fields,
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(&response).contains("bio"));
    assert!(backend.db.records().is_empty());
}

#[tokio::test]
async fn scalar_timing_fields_make_one_slot() {
    let backend = make_backend();
    let filter = make_register_filter(&backend);

    let mut fields = base_fields("asha@example.com", "MCI-12345");
    fields.retain(|(name, _)| !name.starts_with("timing"));
    fields.push(("timingDays".to_owned(), "Wed".to_owned()));
    fields.push(("timingFrom".to_owned(), "14:00".to_owned()));
    fields.push(("timingTo".to_owned(), "17:30".to_owned()));

    let response = submit(
        &filter,
        &fields,
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let records = backend.db.records();
    assert_eq!(
        records[0].doctor.timing_slots,
        vec![TimingSlot {
            day: "Wed".to_owned(),
            from: "14:00".to_owned(),
            to: "17:30".to_owned(),
        }]
    );
}

#[tokio::test]
async fn concurrent_submissions_with_the_same_email_have_one_winner() {
    let backend = make_backend();
    let filter = make_register_filter(&backend);

    let first_fields = base_fields("asha@example.com", "MCI-11111");
    let second_fields = base_fields("asha@example.com", "MCI-22222");
    let first = submit(
        &filter,
        &first_fields,
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    );
    let second = submit(
        &filter,
        &second_fields,
        Some(("license.pdf", "application/pdf", PDF_BYTES)),
    );

    let (first, second) = futures::join!(first, second);

    let mut statuses = vec![first.status(), second.status()];
    statuses.sort();

    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::BAD_REQUEST]);
    assert_eq!(backend.db.records().len(), 1);
}

#[tokio::test]
async fn landing_page_is_served() {
    let filter = routes::make_index_route();

    let response = warp::test::request().path("/").method("GET").reply(&filter).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(&response).contains("<form"));
}

#[tokio::test]
async fn healthz_works() {
    let backend = make_backend();
    let logger = Arc::new(Logger::root(Discard, o!()));
    let store = Arc::new(DiskStore::new(backend.uploads.path()));
    let environment = Environment::new(logger, backend.db.clone(), store);

    let filter = routes::admin::make_healthz_route(environment);

    let response = warp::test::request()
        .path("/healthz")
        .method("GET")
        .reply(&filter)
        .await;

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_slice(response.body()).expect("parse healthz response as JSON");
    assert!(body["version"].is_string());
}

async fn submit<F>(
    filter: &F,
    fields: &[(String, String)],
    file: Option<(&str, &str, &[u8])>,
) -> Response<Bytes>
where
    F: Filter<Error = warp::Rejection> + 'static,
    F::Extract: Reply + Send,
{
    let body = make_multipart_body(BOUNDARY.as_bytes(), fields, file);

    warp::test::request()
        .path("/register")
        .method("POST")
        .header("content-type", multipart_content_type(BOUNDARY))
        .header("content-length", body.len())
        .body(body)
        .reply(filter)
        .await
}

fn body_text(response: &Response<Bytes>) -> String {
    String::from_utf8_lossy(response.body()).into_owned()
}

fn base_fields(email: &str, license_number: &str) -> Vec<(String, String)> {
    [
        ("fullName", "Asha Rao"),
        ("dob", "1980-04-12"),
        ("gender", "Female"),
        ("contactNumber", "+91-9999999999"),
        ("email", email),
        ("degree", "MBBS"),
        ("specializations", "Cardiology"),
        ("licenseNumber", license_number),
        ("issuingAuthority", "Medical Council of India"),
        ("fees", "500"),
        ("bio", "Cardiologist with 15 years of practice."),
        ("timingDays", "Mon"),
        ("timingDays", "Tue"),
        ("timingFrom", "09:00"),
        ("timingFrom", "10:00"),
        ("timingTo", "12:00"),
        ("timingTo", "13:00"),
    ]
    .iter()
    .map(|(n, v)| (n.to_string(), v.to_string()))
    .collect()
}

fn make_multipart_body(
    boundary: &[u8],
    fields: &[(String, String)],
    file: Option<(&str, &str, &[u8])>,
) -> Vec<u8> {
    const NEWLINE: &[u8] = "\r\n".as_bytes();

    let boundary = boundary_with_leader(boundary);
    let boundary = boundary.as_slice();

    let mut body: Vec<u8> = vec![];

    for (name, value) in fields {
        body.extend_from_slice(boundary);
        body.extend_from_slice(NEWLINE);
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(NEWLINE);
    }

    if let Some((filename, content_type, data)) = file {
        body.extend_from_slice(boundary);
        body.extend_from_slice(NEWLINE);
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"licenseFile\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                filename, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(NEWLINE);
    }

    body.extend_from_slice(boundary);
    body.extend_from_slice("--".as_bytes());
    body.extend_from_slice(NEWLINE);

    body
}

fn boundary_with_leader(boundary: &[u8]) -> Vec<u8> {
    const BOUNDARY_LEADER: &[u8] = &[b'-', b'-'];

    let parts = &[BOUNDARY_LEADER, boundary];
    parts.concat()
}

fn multipart_content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={}", boundary)
}
