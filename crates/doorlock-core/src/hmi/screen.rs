//! Two-line display screens.

use std::fmt;

/// Everything the HMI node can put on its display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Prompt for a password.
    EnterPassword,
    /// Prompt for the confirmation of a new password.
    ReEnterPassword,
    /// Enrollment pair differed.
    NotMatched,
    /// Open-door / change-password menu.
    MainMenu,
    /// Verification failed below the threshold.
    WrongPassword {
        /// Consecutive failures so far.
        failures: u8,
    },
    /// Door driving open.
    DoorUnlocking,
    /// Door held open.
    DoorOpened,
    /// Door driving closed.
    DoorLocking,
    /// Old password accepted for a change.
    PasswordChanged,
    /// Lockout engaged.
    Error,
}

impl Screen {
    /// Text of the first and second display line.
    pub fn lines(&self) -> [String; 2] {
        let (top, bottom) = match self {
            Self::EnterPassword => ("Plz Enter Pass:", ""),
            Self::ReEnterPassword => ("Plz Re-Enter the:", "same pass:"),
            Self::NotMatched => ("NOT MATCHED", ""),
            Self::MainMenu => ("+ : Open Door", "- : Change Pass"),
            Self::WrongPassword { failures } => {
                return [format!("Wrong Pass: {failures}"), String::new()];
            },
            Self::DoorUnlocking => ("Door Unlocking", ""),
            Self::DoorOpened => ("Door Opened", ""),
            Self::DoorLocking => ("Door Locking", ""),
            Self::PasswordChanged => ("Change Password", "Confirmed"),
            Self::Error => ("ERROR !!!", ""),
        };
        [top.to_owned(), bottom.to_owned()]
    }

    /// Screens the runtime keeps visible for the message hold before the
    /// next one replaces them.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::NotMatched | Self::WrongPassword { .. } | Self::PasswordChanged)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [top, bottom] = self.lines();
        if bottom.is_empty() { f.write_str(&top) } else { write!(f, "{top} / {bottom}") }
    }
}
