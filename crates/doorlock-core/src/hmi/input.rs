//! Keypad symbols.

/// One key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// An ASCII digit `'0'..='9'`, stored as its byte.
    Digit(u8),
    /// `+`: open the door.
    Open,
    /// `-`: change the password.
    Change,
    /// `=`: submit the captured password.
    Enter,
    /// Anything else on the pad.
    Other(char),
}

impl Key {
    /// Map a keypad character.
    pub const fn from_char(c: char) -> Self {
        match c {
            '0'..='9' => Self::Digit(c as u8),
            '+' => Self::Open,
            '-' => Self::Change,
            '=' => Self::Enter,
            other => Self::Other(other),
        }
    }

    /// The character printed on the key.
    pub const fn as_char(self) -> char {
        match self {
            Self::Digit(d) => d as char,
            Self::Open => '+',
            Self::Change => '-',
            Self::Enter => '=',
            Self::Other(c) => c,
        }
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Self::from_char(c)
    }
}
