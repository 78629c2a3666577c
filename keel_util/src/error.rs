use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Result of an operation expecting a fixed-length slice.
pub type LengthResult<T> = Result<T, LengthError>;

/// Error type raised when a byte slice has the wrong length.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct LengthError {
    expected: usize,
    actual: usize,
}

impl LengthError {
    pub fn new(expected: usize, actual: usize) -> LengthError {
        LengthError { expected, actual }
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn actual(&self) -> usize {
        self.actual
    }
}

impl Display for LengthError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "Expected A Length Of {} But Found A Length Of {}", self.expected, self.actual)
    }
}

impl Error for LengthError {}
