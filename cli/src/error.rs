use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum CLIError {
	ExternalError(String, String),
	UnknownArgument(String),
	MissingValue(&'static str),
	InvalidValue(&'static str, String),
	InsufficientArguments,
	NotFound(String),
}

impl fmt::Display for CLIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
       fmt::Debug::fmt(&self, f)
    }
}

/// Wrap a library error, keeping the name of its type.
macro_rules! external {
	($kind:expr) => {
		|e| CLIError::ExternalError($kind.into(), e.to_string())
	};
}

pub(crate) use external;

pub type CLIResult<O=()> = Result<O, CLIError>;
