//! Status translation between backend-specific codes and canonical outcomes.
//!
//! Both translators are total over their input domain and built as plain
//! `match` tables: immutable, assembled at compile time, nothing to
//! initialize lazily and therefore nothing to race on. Codes with no
//! business meaning fall through to [`Outcome::Internal`]; no failure code
//! ever maps to [`Outcome::Ok`].

use tonic::Code;

use verdant_types::Outcome;
use verdant_store::reply;

/// Map a transport status code to its canonical outcome.
///
/// The match is exhaustive over [`tonic::Code`], so adding a transport code
/// without classifying it is a compile error rather than a runtime surprise.
pub fn outcome_from_transport(code: Code) -> Outcome {
    match code {
        Code::Ok => Outcome::Ok,
        Code::NotFound => Outcome::NotFound,
        Code::Cancelled
        | Code::Unknown
        | Code::InvalidArgument
        | Code::DeadlineExceeded
        | Code::AlreadyExists
        | Code::PermissionDenied
        | Code::ResourceExhausted
        | Code::FailedPrecondition
        | Code::Aborted
        | Code::OutOfRange
        | Code::Unimplemented
        | Code::Internal
        | Code::Unavailable
        | Code::DataLoss
        | Code::Unauthenticated => Outcome::Internal,
    }
}

/// Map a document-store reply code to its canonical outcome.
pub fn outcome_from_store(code: u16) -> Outcome {
    match code {
        reply::REPLACED | reply::CREATED | reply::DELETED => Outcome::Ok,
        reply::NOT_FOUND => Outcome::NotFound,
        _ => Outcome::Internal,
    }
}
