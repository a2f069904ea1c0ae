use std::fmt;

#[derive(Debug)]
pub enum PageError {
    MalformedPageSize(String),
    InvalidPlaceholder(String),
    UnknownPlaceholder(String),
    UnknownAttribute(String),
    InvalidAttribute { name: String, value: String },
    MissingPageContext,
    UnboundSurface,
    IllegalPagination,
    BoundaryNotClosed,
    BoundaryClosed,
    EmptyBoundary,
    PointOutOfRange { index: usize, len: usize },
    Format(String),
    UnknownFormatter(String),
    TemplateSource(String),
    TemplateIntegrity { path: String, expected: String, actual: String },
    InvalidConfiguration(String),
    State(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::MalformedPageSize(raw) => write!(
                f,
                "page-size attribute should be in \"width:height\" format, \"{}\" given",
                raw
            ),
            PageError::InvalidPlaceholder(name) => {
                write!(f, "height of {} placeholder must be set to a number", name)
            }
            PageError::UnknownPlaceholder(name) => write!(f, "unknown placeholder \"{}\"", name),
            PageError::UnknownAttribute(name) => write!(f, "unknown attribute \"{}\"", name),
            PageError::InvalidAttribute { name, value } => {
                write!(f, "invalid value \"{}\" for attribute \"{}\"", value, name)
            }
            PageError::MissingPageContext => write!(f, "page context has not been set"),
            PageError::UnboundSurface => write!(f, "page has no bound surface"),
            PageError::IllegalPagination => write!(f, "page can't be broken"),
            PageError::BoundaryNotClosed => write!(f, "boundary is not closed"),
            PageError::BoundaryClosed => write!(f, "boundary is closed; reset it first"),
            PageError::EmptyBoundary => write!(f, "boundary has no points to close"),
            PageError::PointOutOfRange { index, len } => {
                write!(f, "boundary point {} out of range (len {})", index, len)
            }
            PageError::Format(message) => write!(f, "format error: {}", message),
            PageError::UnknownFormatter(name) => write!(f, "no formatter named \"{}\"", name),
            PageError::TemplateSource(message) => {
                write!(f, "template source error: {}", message)
            }
            PageError::TemplateIntegrity {
                path,
                expected,
                actual,
            } => write!(
                f,
                "template source {} sha256 mismatch: expected {}, got {}",
                path, expected, actual
            ),
            PageError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            PageError::State(err) => write!(f, "page state error: {}", err),
            PageError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for PageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PageError::State(err) => Some(err),
            PageError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PageError {
    fn from(value: std::io::Error) -> Self {
        PageError::Io(value)
    }
}

impl From<serde_json::Error> for PageError {
    fn from(value: serde_json::Error) -> Self {
        PageError::State(value)
    }
}

impl From<lopdf::Error> for PageError {
    fn from(value: lopdf::Error) -> Self {
        PageError::TemplateSource(value.to_string())
    }
}
