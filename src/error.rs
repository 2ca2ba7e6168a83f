use std::path::PathBuf;

/// Every failure the launcher can surface to the user.
#[derive(thiserror::Error, Debug)]
pub enum LauncherError {
    #[error("invalid version or manifest: {0}")]
    Parse(String),

    #[error("installed version marker at {} is corrupt: {contents:?}", path.display())]
    CorruptVersion { path: PathBuf, contents: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("server returned HTTP status {status}")]
    Http { status: u16 },

    #[error("release asset not found for tag {tag}")]
    AssetNotFound { tag: String },

    #[error("failed to extract archive: {0}")]
    Extraction(String),

    #[error("failed to set executable permissions: {0}")]
    Permission(String),

    #[error("failed to move game files into place: {0}")]
    Install(String),

    #[error("failed to start game: {0}")]
    Launch(String),

    #[error("download cancelled")]
    Cancelled,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LauncherError>;

impl LauncherError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Map a reqwest failure onto the launcher taxonomy.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Status line shown in the launcher window.
    pub fn user_message(&self) -> String {
        match self {
            Self::CorruptVersion { .. } => format!(
                "The installed version file is corrupt. Delete it to reinstall.\n({self})"
            ),
            Self::Network(_) => {
                format!("Could not reach the Coinfight servers. Check your connection.\n({self})")
            }
            Self::Http { status } => format!("The server answered with an error ({status})."),
            Self::AssetNotFound { .. } => format!("Download failed: {self}."),
            Self::Cancelled => "Download cancelled.".into(),
            _ => format!("Something went wrong: {self}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_not_found_mentions_tag() {
        let err = LauncherError::AssetNotFound {
            tag: "v0.3.5.0".into(),
        };
        assert!(err.user_message().contains("v0.3.5.0"));
    }

    #[test]
    fn http_error_reports_numeric_status() {
        let err = LauncherError::Http { status: 503 };
        assert!(err.to_string().contains("503"));
        assert!(err.user_message().contains("503"));
    }

    #[test]
    fn corrupt_marker_is_distinct_from_parse() {
        let err = LauncherError::CorruptVersion {
            path: PathBuf::from("/tmp/version"),
            contents: "abc".into(),
        };
        assert!(err.user_message().contains("corrupt"));
        assert!(!matches!(err, LauncherError::Parse(_)));
    }
}
