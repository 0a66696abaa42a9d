//! Commit message assembly: custom fast path or one oracle completion.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commit::prompt::{MessageLength, compose};
use crate::error::{GenerationError, InvalidCommitType};
use crate::llm::TextGenerator;

/// Conventional commit type, also the player's "class" in the quest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CommitType {
    #[default]
    Feat,
    Fix,
    Chore,
    /// Any other caller-supplied type, e.g. `docs` or `refactor`.
    Other(String),
}

impl CommitType {
    pub fn as_str(&self) -> &str {
        match self {
            CommitType::Feat => "feat",
            CommitType::Fix => "fix",
            CommitType::Chore => "chore",
            CommitType::Other(other) => other,
        }
    }

    /// Quest class name for the three built-in types.
    pub fn class_name(&self) -> Option<&'static str> {
        match self {
            CommitType::Feat => Some("Magician"),
            CommitType::Fix => Some("Warrior"),
            CommitType::Chore => Some("Archer"),
            CommitType::Other(_) => None,
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn commit_type_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]*$").expect("valid commit type regex"))
}

impl FromStr for CommitType {
    type Err = InvalidCommitType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "feat" => Ok(CommitType::Feat),
            "fix" => Ok(CommitType::Fix),
            "chore" => Ok(CommitType::Chore),
            other if commit_type_pattern().is_match(other) => {
                Ok(CommitType::Other(other.to_string()))
            }
            _ => Err(InvalidCommitType(s.to_string())),
        }
    }
}

impl TryFrom<String> for CommitType {
    type Error = InvalidCommitType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CommitType> for String {
    fn from(value: CommitType) -> Self {
        value.as_str().to_string()
    }
}

/// Where a message body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    Custom,
    Generated,
    Cached,
}

/// A proposed commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub commit_type: CommitType,
    pub body: String,
    pub source: MessageSource,
}

impl CommitMessage {
    pub fn custom(commit_type: CommitType, body: impl Into<String>) -> Self {
        Self {
            commit_type,
            body: body.into(),
            source: MessageSource::Custom,
        }
    }

    pub fn generated(commit_type: CommitType, body: impl Into<String>) -> Self {
        Self {
            commit_type,
            body: body.into(),
            source: MessageSource::Generated,
        }
    }

    pub fn cached(commit_type: CommitType, body: impl Into<String>) -> Self {
        Self {
            commit_type,
            body: body.into(),
            source: MessageSource::Cached,
        }
    }

    /// Text to use as the git commit message.
    ///
    /// Custom messages get the `type: ` prefix; model output is used verbatim.
    pub fn text(&self) -> String {
        match self.source {
            MessageSource::Custom => format!("{}: {}", self.commit_type, self.body),
            MessageSource::Generated | MessageSource::Cached => self.body.clone(),
        }
    }
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Inputs for a single message.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub commit_type: &'a CommitType,
    pub custom_message: &'a str,
    pub language: &'a str,
    pub framework: &'a str,
    /// Canonical diff summary text.
    pub diff_summary: &'a str,
    pub length: MessageLength,
}

/// Produce one commit message.
///
/// A non-empty custom message is returned as-is without touching the
/// generator. Otherwise the generator is called exactly once; failures are
/// returned to the caller unchanged.
pub async fn generate(
    generator: &dyn TextGenerator,
    request: &GenerationRequest<'_>,
) -> Result<CommitMessage, GenerationError> {
    let custom = request.custom_message.trim();
    if !custom.is_empty() {
        return Ok(CommitMessage::custom(request.commit_type.clone(), custom));
    }

    let prompt = compose(
        request.commit_type.as_str(),
        request.language,
        request.framework,
        request.diff_summary,
        request.length,
    );
    debug!("Commit prompt length: {} chars", prompt.len());

    let body = generator
        .complete(&prompt, request.length.max_tokens())
        .await?;

    Ok(CommitMessage::generated(request.commit_type.clone(), body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockTextGenerator;
    use mockall::predicate::eq;
    use std::time::Duration;

    fn request<'a>(commit_type: &'a CommitType, custom: &'a str) -> GenerationRequest<'a> {
        GenerationRequest {
            commit_type,
            custom_message: custom,
            language: "JavaScript",
            framework: "React",
            diff_summary: "frontend changes const",
            length: MessageLength::Brief,
        }
    }

    #[tokio::test]
    async fn test_custom_message_skips_generator() {
        let mut generator = MockTextGenerator::new();
        generator.expect_complete().never();

        let commit_type = CommitType::Fix;
        let message = generate(&generator, &request(&commit_type, "handle empty input"))
            .await
            .unwrap();

        assert_eq!(message.source, MessageSource::Custom);
        assert_eq!(message.text(), "fix: handle empty input");
    }

    #[tokio::test]
    async fn test_generated_message_uses_prompt_and_budget() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_complete()
            .with(
                eq("Generate a brief feat commit message for a JavaScript React project: frontend changes const"),
                eq(50u32),
            )
            .times(1)
            .returning(|_, _| Ok("feat: add constant".to_string()));

        let commit_type = CommitType::Feat;
        let message = generate(&generator, &request(&commit_type, "")).await.unwrap();

        assert_eq!(message.source, MessageSource::Generated);
        assert_eq!(message.body, "feat: add constant");
        assert_eq!(message.text(), "feat: add constant");
    }

    #[tokio::test]
    async fn test_whitespace_custom_message_is_generated() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_complete()
            .times(1)
            .returning(|_, _| Ok("chore: tidy".to_string()));

        let commit_type = CommitType::Chore;
        let message = generate(&generator, &request(&commit_type, "   ")).await.unwrap();
        assert_eq!(message.source, MessageSource::Generated);
    }

    #[tokio::test]
    async fn test_detailed_length_requests_100_tokens() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_complete()
            .withf(|prompt, max_tokens| prompt.starts_with("Generate a detailed") && *max_tokens == 100)
            .times(1)
            .returning(|_, _| Ok("long message".to_string()));

        let commit_type = CommitType::Feat;
        let mut req = request(&commit_type, "");
        req.length = MessageLength::Detailed;
        generate(&generator, &req).await.unwrap();
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_complete()
            .times(1)
            .returning(|_, _| Err(GenerationError::Timeout(Duration::from_secs(30))));

        let commit_type = CommitType::Feat;
        let result = generate(&generator, &request(&commit_type, "")).await;
        assert!(matches!(result, Err(GenerationError::Timeout(_))));
    }

    #[test]
    fn test_commit_type_parse() {
        assert_eq!("feat".parse::<CommitType>(), Ok(CommitType::Feat));
        assert_eq!(" FIX ".parse::<CommitType>(), Ok(CommitType::Fix));
        assert_eq!("chore".parse::<CommitType>(), Ok(CommitType::Chore));
        assert_eq!(
            "docs".parse::<CommitType>(),
            Ok(CommitType::Other("docs".to_string()))
        );
    }

    #[test]
    fn test_commit_type_rejects_garbage() {
        assert!("".parse::<CommitType>().is_err());
        assert!("feat: extra".parse::<CommitType>().is_err());
        assert!("1fix".parse::<CommitType>().is_err());
    }

    #[test]
    fn test_commit_type_serde_as_string() {
        let json = serde_json::to_string(&CommitType::Other("perf".to_string())).unwrap();
        assert_eq!(json, r#""perf""#);
        let parsed: CommitType = serde_json::from_str(r#""fix""#).unwrap();
        assert_eq!(parsed, CommitType::Fix);
        assert!(serde_json::from_str::<CommitType>(r#""not valid""#).is_err());
    }

    #[test]
    fn test_class_names() {
        assert_eq!(CommitType::Feat.class_name(), Some("Magician"));
        assert_eq!(CommitType::Fix.class_name(), Some("Warrior"));
        assert_eq!(CommitType::Chore.class_name(), Some("Archer"));
        assert_eq!(CommitType::Other("docs".into()).class_name(), None);
    }

    #[test]
    fn test_cached_message_text_is_body() {
        let message = CommitMessage::cached(CommitType::Fix, "fix: reuse");
        assert_eq!(message.to_string(), "fix: reuse");
    }
}
