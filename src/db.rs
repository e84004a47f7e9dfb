use futures::future::BoxFuture;

use crate::doctor::{DoctorRecord, NewDoctor};
use crate::errors::BackendError;

pub trait Db {
    /// Inserts a registration and returns the persisted record.
    /// Uniqueness of email and license number is enforced by the
    /// storage layer, atomically with the insert; a collision
    /// surfaces as [`BackendError::DuplicateEntry`].
    fn insert(&self, doctor: NewDoctor) -> BoxFuture<Result<DoctorRecord, BackendError>>;
}

pub mod mock;

pub use self::postgres::*;

mod postgres {
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use sqlx::{self, postgres::PgPool, types::Json};
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::doctor::{DoctorRecord, NewDoctor};
    use crate::errors::BackendError;

    const DOCTORS_EMAIL_CONSTRAINT: &str = "doctors_email_key";
    const DOCTORS_LICENSE_CONSTRAINT: &str = "doctors_license_number_key";

    pub struct PgDb {
        pool: PgPool,
    }

    impl PgDb {
        pub fn new(pool: PgPool) -> Self {
            PgDb { pool }
        }
    }

    // these can be simplified once async functions in traits are stabilized
    impl super::Db for PgDb {
        fn insert(&self, doctor: NewDoctor) -> BoxFuture<Result<DoctorRecord, BackendError>> {
            async move {
                let query = sqlx::query_as(include_str!("queries/create_doctor.sql"));

                let (id, created_at): (Uuid, OffsetDateTime) = query
                    .bind(Uuid::new_v4())
                    .bind(&doctor.full_name)
                    .bind(doctor.dob)
                    .bind(&doctor.gender)
                    .bind(&doctor.contact_number)
                    .bind(&doctor.email)
                    .bind(&doctor.degree)
                    .bind(&doctor.specializations)
                    .bind(&doctor.license_number)
                    .bind(&doctor.issuing_authority)
                    .bind(doctor.fees)
                    .bind(&doctor.license_file)
                    .bind(Json(&doctor.timing_slots))
                    .bind(&doctor.bio)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(map_sqlx_error)?;

                Ok(DoctorRecord {
                    id,
                    created_at,
                    doctor,
                })
            }
            .boxed()
        }
    }

    fn map_sqlx_error(error: sqlx::Error) -> BackendError {
        use sqlx::Error;

        match error {
            Error::Database(ref e)
                if e.constraint() == Some(DOCTORS_EMAIL_CONSTRAINT)
                    || e.constraint() == Some(DOCTORS_LICENSE_CONSTRAINT) =>
            {
                BackendError::DuplicateEntry
            }
            _ => BackendError::Sqlx { source: error },
        }
    }
}
