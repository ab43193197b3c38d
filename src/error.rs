/// Broad category of a failure, used by callers that need to react to a
/// specific condition (e.g. an unknown country typed into the dashboard).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote source (or a local CSV) could not be retrieved or parsed.
    DataUnavailable,
    /// The requested country has no rows in the dataset.
    UnknownCountry,
    /// Bad CLI arguments or a presentation constraint was violated.
    InvalidInput,
    /// Terminal setup or drawing failed.
    Terminal,
}

impl ErrorKind {
    fn exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidInput => 2,
            ErrorKind::UnknownCountry => 3,
            ErrorKind::DataUnavailable => 4,
            ErrorKind::Terminal => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            exit_code: kind.exit_code(),
            message: message.into(),
        }
    }

    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataUnavailable, message)
    }

    pub fn unknown_country(country: &str) -> Self {
        Self::new(
            ErrorKind::UnknownCountry,
            format!("Unknown country '{country}': no rows in the dataset."),
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Terminal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::invalid_input("x").exit_code(), 2);
        assert_eq!(AppError::unknown_country("Atlantis").exit_code(), 3);
        assert_eq!(AppError::data_unavailable("x").exit_code(), 4);
        assert_eq!(AppError::terminal("x").exit_code(), 5);
    }

    #[test]
    fn unknown_country_names_the_country() {
        let err = AppError::unknown_country("Atlantis");
        assert_eq!(err.kind(), ErrorKind::UnknownCountry);
        assert!(err.to_string().contains("Atlantis"));
    }
}
