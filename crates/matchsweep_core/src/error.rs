use std::fmt;

/// Errors raised when a sweep plan cannot be enumerated safely
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// A loop that must produce at least one value is empty
    EmptyAxis(&'static str),
    /// A count that must be positive is zero
    ZeroCount { field: &'static str },
    /// A probability lies outside [0, 1]
    ProbabilityOutOfRange { field: &'static str, value: f64 },
    /// A string would need quoting to survive the shell inside the session
    UnsafeToken { field: &'static str, value: String },
    /// Two sessions would map to the same execution context
    DuplicateSession(u32),
    /// `session + start_seed` does not fit in a seed
    SeedOverflow { session: u32, start_seed: u64 },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::EmptyAxis(axis) => write!(f, "sweep axis '{axis}' has no values"),
            PlanError::ZeroCount { field } => write!(f, "'{field}' must be greater than zero"),
            PlanError::ProbabilityOutOfRange { field, value } => {
                write!(f, "'{field}' must lie in [0, 1], got {value}")
            }
            PlanError::UnsafeToken { field, value } => {
                write!(f, "'{field}' contains characters unsafe for the shell: {value:?}")
            }
            PlanError::DuplicateSession(session) => {
                write!(f, "session {session} is listed more than once")
            }
            PlanError::SeedOverflow {
                session,
                start_seed,
            } => write!(f, "seed overflows for session {session} at offset {start_seed}"),
        }
    }
}

impl std::error::Error for PlanError {}

/// Errors related to reading result records
#[derive(Debug)]
pub enum ResultError {
    Parse(serde_json::Error),
    /// The document parsed but is not an object with a `parameters` object
    MissingParameters,
}

impl fmt::Display for ResultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultError::Parse(e) => write!(f, "invalid result JSON: {e}"),
            ResultError::MissingParameters => {
                write!(f, "result is missing a 'parameters' object")
            }
        }
    }
}

impl std::error::Error for ResultError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResultError::Parse(e) => Some(e),
            ResultError::MissingParameters => None,
        }
    }
}

impl From<serde_json::Error> for ResultError {
    fn from(err: serde_json::Error) -> Self {
        ResultError::Parse(err)
    }
}
