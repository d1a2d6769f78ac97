use std::fmt::Display;

/// Error type shared by the library and the binary.
/// Errors carry a human readable message, the cause is flattened into it.
#[derive(Debug, Clone, PartialEq)]
pub struct RadprocError {
    msg: String,
}

impl RadprocError {
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl From<String> for RadprocError {
    fn from(msg: String) -> Self {
        RadprocError { msg }
    }
}

impl From<RadprocError> for String {
    fn from(value: RadprocError) -> String {
        value.msg
    }
}

impl From<&str> for RadprocError {
    fn from(msg: &str) -> Self {
        RadprocError { msg: msg.into() }
    }
}

impl From<std::io::Error> for RadprocError {
    fn from(err: std::io::Error) -> Self {
        RadprocError {
            msg: format!("io error: {err}"),
        }
    }
}

#[cfg(feature = "hdf5")]
impl From<hdf5::Error> for RadprocError {
    fn from(err: hdf5::Error) -> Self {
        RadprocError {
            msg: format!("hdf5 error: {err}"),
        }
    }
}

impl Display for RadprocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.msg)
    }
}

impl std::error::Error for RadprocError {}
