//! IO-layer errors map straight onto the run-level taxonomy in core; the
//! helpers here attach the file context each variant needs.

use std::fmt::Display;
use std::path::Path;

pub use tripclean_core::error::{Error, Result};

pub(crate) fn ingestion(path: &Path, what: impl Display) -> Error {
    Error::Ingestion(format!("{}: {what}", path.display()))
}

pub(crate) fn write(path: &Path, what: impl Display) -> Error {
    Error::Write(format!("{}: {what}", path.display()))
}

pub(crate) fn readback(path: &Path, what: impl Display) -> Error {
    Error::VerificationMismatch(format!("{}: {what}", path.display()))
}
