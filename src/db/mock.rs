use std::sync::Mutex;

use futures::future::{BoxFuture, FutureExt};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::doctor::{DoctorRecord, NewDoctor};
use crate::errors::BackendError;

use super::Db;

/// An in-memory database enforcing the same uniqueness rules as the
/// real one. Used by the HTTP tests.
#[derive(Default)]
pub struct MemoryDb {
    records: Mutex<Vec<DoctorRecord>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DoctorRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Db for MemoryDb {
    fn insert(&self, doctor: NewDoctor) -> BoxFuture<Result<DoctorRecord, BackendError>> {
        async move {
            let mut records = self.records.lock().unwrap();

            let duplicate = records.iter().any(|r| {
                r.doctor.email == doctor.email
                    || r.doctor.license_number == doctor.license_number
            });

            if duplicate {
                return Err(BackendError::DuplicateEntry);
            }

            let record = DoctorRecord {
                id: Uuid::new_v4(),
                created_at: OffsetDateTime::now_utc(),
                doctor,
            };

            records.push(record.clone());

            Ok(record)
        }
        .boxed()
    }
}
