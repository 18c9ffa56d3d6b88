use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiquidError {
    #[error("Tokenize Error at offset {offset}: {message}")]
    Tokenize { message: String, offset: usize },
    #[error("Parse Error at offset {offset}: {message}")]
    Parse { message: String, offset: usize },
    #[error("Unknown Filter: {0}")]
    UnknownFilter(String),
    #[error("Filter Error in '{name}': {message}")]
    Filter { name: String, message: String },
    #[error("Render Error: {0}")]
    Render(String),
    #[error("Serialization Error: {0}")]
    Serialization(String),
}

impl LiquidError {
    pub(crate) fn tokenize(message: impl Into<String>, offset: usize) -> Self {
        LiquidError::Tokenize {
            message: message.into(),
            offset,
        }
    }

    pub(crate) fn parse(message: impl Into<String>, offset: usize) -> Self {
        LiquidError::Parse {
            message: message.into(),
            offset,
        }
    }

    /// Byte offset into the template source, for tokenizer and parser errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            LiquidError::Tokenize { offset, .. } | LiquidError::Parse { offset, .. } => {
                Some(*offset)
            }
            _ => None,
        }
    }
}
