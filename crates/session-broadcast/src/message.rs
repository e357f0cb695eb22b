//! Session notification kinds and their wire tags.

use crate::BroadcastError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMessage {
    SignedIn,
    SignedOut,
}

impl SessionMessage {
    pub fn as_tag(&self) -> &'static str {
        match self {
            SessionMessage::SignedIn => "signIn",
            SessionMessage::SignedOut => "signOut",
        }
    }
}

impl fmt::Display for SessionMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for SessionMessage {
    type Err = BroadcastError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "signIn" => Ok(SessionMessage::SignedIn),
            "signOut" => Ok(SessionMessage::SignedOut),
            other => Err(BroadcastError::UnknownMessage(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(SessionMessage::SignedIn.as_tag(), "signIn");
        assert_eq!(SessionMessage::SignedOut.to_string(), "signOut");
        assert_eq!("signOut".parse::<SessionMessage>(), Ok(SessionMessage::SignedOut));
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        assert_eq!(
            "SignOut".parse::<SessionMessage>(),
            Err(BroadcastError::UnknownMessage("SignOut".to_string()))
        );
    }
}
