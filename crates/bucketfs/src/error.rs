// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur in filesystem operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Directory not empty: {0}")]
    NotEmpty(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Object store error on {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: object_store::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn not_found<P: AsRef<str>>(path: P) -> Self {
        Error::NotFound(path.as_ref().to_string())
    }

    pub fn not_a_directory<P: AsRef<str>>(path: P) -> Self {
        Error::NotADirectory(path.as_ref().to_string())
    }

    pub fn is_a_directory<P: AsRef<str>>(path: P) -> Self {
        Error::IsADirectory(path.as_ref().to_string())
    }

    pub fn not_empty<P: AsRef<str>>(path: P) -> Self {
        Error::NotEmpty(path.as_ref().to_string())
    }

    pub fn invalid_path<P: AsRef<str>>(path: P) -> Self {
        Error::InvalidPath(path.as_ref().to_string())
    }

    pub fn io<P: AsRef<str>>(path: P, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_string(),
            source,
        }
    }

    pub fn config<S: AsRef<str>>(msg: S) -> Self {
        Error::Config(msg.as_ref().to_string())
    }

    /// Classifies an object store failure for `path`. The store's own
    /// not-found condition becomes `NotFound`; everything else is wrapped.
    pub fn from_store<P: AsRef<str>>(path: P, source: object_store::Error) -> Self {
        match source {
            object_store::Error::NotFound { .. } => Error::not_found(path),
            source => Error::Store {
                path: path.as_ref().to_string(),
                source,
            },
        }
    }

    /// The logical path this error refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::NotFound(path)
            | Error::NotADirectory(path)
            | Error::IsADirectory(path)
            | Error::NotEmpty(path)
            | Error::InvalidPath(path)
            | Error::Store { path, .. }
            | Error::Io { path, .. } => Some(path),
            Error::Config(_) => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// True when the store reported the object as absent.
pub(crate) fn store_not_found(err: &object_store::Error) -> bool {
    matches!(err, object_store::Error::NotFound { .. })
}
