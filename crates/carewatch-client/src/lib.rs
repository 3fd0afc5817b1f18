//! carewatch-client
//!
//! The remote clinical API, seen from the client side. [`RemoteStore`] is
//! the contract the rest of the workspace codes against; [`HttpStore`] is
//! the implementation that talks to the real service.

pub mod error;
pub mod http;
pub mod store;
pub mod submission;

pub use error::RemoteError;
pub use http::HttpStore;
pub use store::{BoxFuture, RemoteStore};
pub use submission::AssessmentSubmission;
