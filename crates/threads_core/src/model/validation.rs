use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Thread text is empty after trim.
    EmptyText,
    /// Thread text exceeds the character limit.
    TextTooLong { max_chars: usize, actual_chars: usize },
    /// A required profile field is empty after trim.
    EmptyField(&'static str),
    /// Username/handle contains unsupported characters or length.
    InvalidHandle(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "thread text must not be blank"),
            Self::TextTooLong {
                max_chars,
                actual_chars,
            } => write!(
                f,
                "thread text has {actual_chars} characters, limit is {max_chars}"
            ),
            Self::EmptyField(field) => write!(f, "`{field}` must not be blank"),
            Self::InvalidHandle(value) => write!(
                f,
                "invalid handle `{value}`; expected 1-32 of [A-Za-z0-9_.-]"
            ),
        }
    }
}

impl Error for ValidationError {}
