//! Platform adapters and the factory that picks one by name.

mod chatgpt;
mod gemini;

pub use chatgpt::{ChatGpt, CHATGPT_URL};
pub use gemini::{Gemini, GEMINI_URL};

use std::fmt;
use std::str::FromStr;

use crate::error::{LibrarianError, Result};
use crate::traits::platform::Platform;

/// Supported chat applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    ChatGpt,
    Gemini,
}

impl PlatformKind {
    pub const ALL: [PlatformKind; 2] = [PlatformKind::ChatGpt, PlatformKind::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::ChatGpt => "chatgpt",
            PlatformKind::Gemini => "gemini",
        }
    }

    /// Build the adapter for this platform.
    pub fn adapter(&self) -> Box<dyn Platform> {
        match self {
            PlatformKind::ChatGpt => Box::new(ChatGpt::new()),
            PlatformKind::Gemini => Box::new(Gemini::new()),
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = LibrarianError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "chatgpt" => Ok(PlatformKind::ChatGpt),
            "gemini" => Ok(PlatformKind::Gemini),
            _ => Err(LibrarianError::Unsupported(s.to_string())),
        }
    }
}

/// Look up an adapter by name, ignoring case.
pub fn platform_for(name: &str) -> Result<Box<dyn Platform>> {
    Ok(name.parse::<PlatformKind>()?.adapter())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_is_case_insensitive() {
        assert_eq!(platform_for("ChatGPT").unwrap().platform_name(), "ChatGPT");
        assert_eq!(platform_for("gemini").unwrap().platform_name(), "Gemini");
    }

    #[test]
    fn test_unknown_platform_is_unsupported() {
        let err = platform_for("claude").err().unwrap();
        assert!(matches!(err, LibrarianError::Unsupported(name) if name == "claude"));
    }

    #[test]
    fn test_adapter_identity() {
        let gpt = ChatGpt::new();
        assert_eq!(gpt.platform_url(), "https://chat.openai.com");
        assert_eq!(gpt.output_dir_name(), "ChatGPT_Downloads");
        assert_eq!(gpt.selectors().history.item_candidates, vec!["a[href^='/c/']"]);

        let gemini = Gemini::new();
        assert_eq!(gemini.platform_url(), "https://gemini.google.com/app");
        assert_eq!(gemini.output_dir_name(), "Gemini_Downloads");
        assert_eq!(gemini.selectors().history.min_title_len, 5);
        assert!(gemini.selectors().conversation.role_segregated.is_some());
    }

    #[test]
    fn test_every_kind_round_trips_through_name() {
        for kind in PlatformKind::ALL {
            assert_eq!(kind.as_str().parse::<PlatformKind>().unwrap(), kind);
        }
    }
}
