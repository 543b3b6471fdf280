use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdmError {
    /// No configuration file, or the configuration names no usable ROI source.
    #[error("cannot load the configuration file")]
    ConfigurationMissing,

    #[error("no authentication information found")]
    NoAuthentication,

    #[error("request failed with status {status} [{reason}]")]
    RequestFailed { status: u16, reason: String },

    #[error("malformed feed entry: {0}")]
    MalformedEntry(String),

    #[error("geometry error: {0}")]
    Geometry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Feed(#[from] roxmltree::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}
