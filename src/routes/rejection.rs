use warp::reject;

use crate::errors::BackendError;

/// A handler error together with where in the request it happened,
/// for the logs.
#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: BackendError,
}

impl Rejection {
    pub fn new(context: Context, error: BackendError) -> Self {
        Rejection { context, error }
    }
}

impl reject::Reject for Rejection {}

#[derive(Clone, Debug)]
pub enum Context {
    Register { email: Option<String> },
}

impl Context {
    pub fn register(email: Option<String>) -> Context {
        Context::Register { email }
    }
}
