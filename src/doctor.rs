use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, Time};
use uuid::Uuid;

use crate::errors::BackendError;
use crate::form::{FieldValue, ParsedForm};
use crate::normalization::normalize_text;

/// One (day, start, end) availability triple. Times are kept as
/// `HH:MM` strings, as submitted.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TimingSlot {
    pub day: String,
    pub from: String,
    pub to: String,
}

/// A validated registration, ready for persistence.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub full_name: String,
    pub dob: Date,
    pub gender: String,
    pub contact_number: String,
    pub email: String,
    pub degree: String,
    pub specializations: Vec<String>,
    pub license_number: String,
    pub issuing_authority: String,
    pub fees: f64,

    /// The storage path of the uploaded license PDF.
    pub license_file: String,

    pub timing_slots: Vec<TimingSlot>,
    pub bio: String,
}

/// A persisted registration. Records are immutable after creation.
#[derive(Clone, Debug, Serialize)]
pub struct DoctorRecord {
    pub id: Uuid,

    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,

    #[serde(flatten)]
    pub doctor: NewDoctor,
}

impl NewDoctor {
    /// Builds a registration from the parsed form and the storage
    /// path the license file was written to. Fails with an error
    /// naming the first missing or malformed field.
    pub fn from_form(form: &ParsedForm, license_file: String) -> Result<Self, BackendError> {
        let dob = parse_date("dob", &form.required("dob")?)?;
        let fees = parse_number("fees", &form.required("fees")?)?;

        let specializations = form
            .field("specializations")
            .map(FieldValue::into_sequence)
            .unwrap_or_default()
            .into_iter()
            .map(normalize_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        if specializations.is_empty() {
            return Err(BackendError::MissingField {
                field: "specializations",
            });
        }

        let timing_slots = zip_timing_slots(
            form.field("timingDays"),
            form.field("timingFrom"),
            form.field("timingTo"),
        )?;

        Ok(NewDoctor {
            full_name: normalize_text(form.required("fullName")?),
            dob,
            gender: normalize_text(form.required("gender")?),
            contact_number: normalize_text(form.required("contactNumber")?),
            email: normalize_text(form.required("email")?),
            degree: normalize_text(form.required("degree")?),
            specializations,
            license_number: normalize_text(form.required("licenseNumber")?),
            issuing_authority: normalize_text(form.required("issuingAuthority")?),
            fees,
            license_file,
            timing_slots,
            bio: normalize_text(form.required("bio")?),
        })
    }
}

/// Zips the parallel day/from/to fields into slots by index. The
/// three fields must describe the same number of slots; a mismatch is
/// rejected rather than silently truncated or misaligned. All three
/// absent means zero slots.
pub fn zip_timing_slots(
    days: Option<FieldValue>,
    from: Option<FieldValue>,
    to: Option<FieldValue>,
) -> Result<Vec<TimingSlot>, BackendError> {
    let days = days.map(FieldValue::into_sequence).unwrap_or_default();
    let from = from.map(FieldValue::into_sequence).unwrap_or_default();
    let to = to.map(FieldValue::into_sequence).unwrap_or_default();

    if days.len() != from.len() || days.len() != to.len() {
        return Err(BackendError::MismatchedTimingSlots);
    }

    days.into_iter()
        .zip(from)
        .zip(to)
        .map(|((day, from), to)| {
            Ok(TimingSlot {
                day: normalize_text(day),
                from: parse_time("timingFrom", &from)?,
                to: parse_time("timingTo", &to)?,
            })
        })
        .collect()
}

fn parse_date(field: &'static str, value: &str) -> Result<Date, BackendError> {
    Date::parse(value.trim(), "%F").map_err(|e| BackendError::InvalidField {
        field,
        message: e.to_string(),
    })
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, BackendError> {
    let parsed: f64 = value.trim().parse().map_err(|_| BackendError::InvalidField {
        field,
        message: format!("{:?} is not a number", value),
    })?;

    if !parsed.is_finite() {
        return Err(BackendError::InvalidField {
            field,
            message: format!("{:?} is not a finite number", value),
        });
    }

    Ok(parsed)
}

/// Accepts only 24-hour `HH:MM` times.
fn parse_time(field: &'static str, value: &str) -> Result<String, BackendError> {
    let value = value.trim();

    Time::parse(value, "%H:%M").map_err(|e| BackendError::InvalidField {
        field,
        message: e.to_string(),
    })?;

    Ok(value.to_owned())
}
