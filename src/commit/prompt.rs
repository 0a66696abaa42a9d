//! Prompt construction for generated commit messages.

use std::fmt;
use std::str::FromStr;

/// Requested size of a generated message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageLength {
    #[default]
    Brief,
    Detailed,
}

impl MessageLength {
    /// Qualifier placed in front of the commit type in the prompt.
    pub fn qualifier(&self) -> &'static str {
        match self {
            MessageLength::Brief => "a brief",
            MessageLength::Detailed => "a detailed",
        }
    }

    /// Output budget passed to the model, in tokens.
    pub fn max_tokens(&self) -> u32 {
        match self {
            MessageLength::Brief => 50,
            MessageLength::Detailed => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageLength::Brief => "brief",
            MessageLength::Detailed => "detailed",
        }
    }
}

impl fmt::Display for MessageLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brief" => Ok(MessageLength::Brief),
            "detailed" => Ok(MessageLength::Detailed),
            other => Err(format!(
                "unknown message length '{other}' (expected brief or detailed)"
            )),
        }
    }
}

/// Build the generation prompt for a commit message.
pub fn compose(
    commit_type: &str,
    language: &str,
    framework: &str,
    diff_summary: &str,
    length: MessageLength,
) -> String {
    format!(
        "Generate {qualifier} {commit_type} commit message for a {language} {framework} project: {diff_summary}",
        qualifier = length.qualifier(),
    )
}
