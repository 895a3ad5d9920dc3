use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnpostError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),

    #[error(transparent)]
    Quota(#[from] crate::usage::QuotaExceeded),

    #[error(transparent)]
    Api(#[from] x_client::XError),

    #[error(transparent)]
    WebDriver(#[from] webdriver_client::WebDriverError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, UnpostError>;
