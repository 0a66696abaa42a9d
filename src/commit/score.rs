//! Experience points for a batch of changes.

use tracing::info;

use crate::commit::diff::Change;
use crate::commit::message::CommitType;
use crate::config::UNSET_FIELD;

/// Bonus lookup keyed by lowercased language, lowercased specialization and commit type.
const BOOSTS: [(&str, &str, &str, u32, &str); 7] = [
    (
        "python",
        "machine learning",
        "feat",
        20,
        "Your AI spells are more powerful as a Magician!",
    ),
    (
        "javascript",
        "front-end",
        "chore",
        15,
        "Your front-end Archer skills give extra precision!",
    ),
    (
        "go",
        "backend",
        "fix",
        25,
        "Your backend Warrior skills provide extra resilience!",
    ),
    (
        "rust",
        "backend",
        "fix",
        25,
        "Your backend Warrior skills provide extra resilience!",
    ),
    (
        "",
        "full-stack",
        "feat",
        10,
        "Your Full-stack skills shine as you craft a new feature!",
    ),
    (
        "",
        "full-stack",
        "fix",
        10,
        "Your Full-stack prowess helps squash a bug!",
    ),
    (
        "",
        "full-stack",
        "chore",
        10,
        "Your Full-stack versatility enhances the codebase!",
    ),
];

/// Outcome of one quest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreResult {
    /// Changed lines (insertions plus deletions) across all changes.
    pub experience: usize,
    pub enemies_slain: usize,
    pub boost: u32,
    /// Flavor text for the boost; empty when there is none.
    pub boost_message: String,
}

impl ScoreResult {
    /// Experience including the specialization boost.
    pub fn total_experience(&self) -> usize {
        self.experience + self.boost as usize
    }
}

/// Look up the specialization boost. Unknown combinations give `(0, "")`.
///
/// A blank language and the stored placeholder `"None"` are the same unset
/// language, which is what the full-stack rows key on.
pub fn boost_for(language: &str, specialization: &str, commit_type: &CommitType) -> (u32, &'static str) {
    let language = normalized(language);
    let specialization = normalized(specialization);

    BOOSTS
        .iter()
        .find(|(lang, spec, kind, _, _)| {
            *lang == language && *spec == specialization && *kind == commit_type.as_str()
        })
        .map(|(_, _, _, points, message)| (*points, *message))
        .unwrap_or((0, ""))
}

fn normalized(field: &str) -> String {
    let field = field.trim().to_lowercase();
    if field == UNSET_FIELD.to_lowercase() {
        String::new()
    } else {
        field
    }
}

/// Score a batch of changes.
///
/// Logs the boost message, if any, as flavor text.
pub fn score(
    changes: &[Change],
    language: &str,
    specialization: &str,
    commit_type: &CommitType,
) -> ScoreResult {
    let experience = changes
        .iter()
        .map(|change| change.summarize().changed_lines())
        .sum();

    let (boost, boost_message) = boost_for(language, specialization, commit_type);
    if !boost_message.is_empty() {
        info!("{boost_message}");
    }

    ScoreResult {
        experience,
        enemies_slain: changes.len(),
        boost,
        boost_message: boost_message.to_string(),
    }
}
