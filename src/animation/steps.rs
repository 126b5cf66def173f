use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    config::Config,
    error::{AnimationError, Result},
};

/// One typing operation
///
/// Steps are applied strictly in order; each one starts from exactly the text
/// its predecessor left on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum AnimationStep {
    /// Append `text` one character at a time
    Type { text: String },

    /// Remove `count` trailing characters one at a time
    Delete { count: usize },

    /// Same as `Type`, marks a suffix addition
    Append { text: String },

    /// Insert `text` at the front, revealed right-to-left
    Prepend { text: String },

    /// Hold the current text for `duration` milliseconds
    Pause { duration: u64 },
}

impl AnimationStep {
    pub fn type_text<S: Into<String>>(text: S) -> Self {
        AnimationStep::Type { text: text.into() }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnimationStep::Type { .. } => "type",
            AnimationStep::Delete { .. } => "delete",
            AnimationStep::Append { .. } => "append",
            AnimationStep::Prepend { .. } => "prepend",
            AnimationStep::Pause { .. } => "pause",
        }
    }

    /// Apply the whole step to `text`
    pub fn apply(&self, text: &mut String) {
        match self {
            AnimationStep::Type { text: typed } | AnimationStep::Append { text: typed } => {
                text.push_str(typed);
            }
            AnimationStep::Delete { count } => {
                let keep = text.chars().count().saturating_sub(*count);
                truncate_chars(text, keep);
            }
            AnimationStep::Prepend { text: prefix } => {
                text.insert_str(0, prefix);
            }
            AnimationStep::Pause { .. } => {}
        }
    }
}

impl fmt::Display for AnimationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationStep::Type { text } => write!(f, "type {:?}", text),
            AnimationStep::Delete { count } => write!(f, "delete {}", count),
            AnimationStep::Append { text } => write!(f, "append {:?}", text),
            AnimationStep::Prepend { text } => write!(f, "prepend {:?}", text),
            AnimationStep::Pause { duration } => write!(f, "pause {}ms", duration),
        }
    }
}

/// Keep the first `keep` characters of `text`
pub(crate) fn truncate_chars(text: &mut String, keep: usize) {
    if let Some((byte_index, _)) = text.char_indices().nth(keep) {
        text.truncate(byte_index);
    }
}

/// Generate the step sequence for a configuration
///
/// Pure and deterministic: identical configurations give identical steps.
/// An explicit `config.script` is returned as-is.
pub fn generate_steps(config: &Config) -> Vec<AnimationStep> {
    if let Some(script) = &config.script {
        debug!("Using explicit script with {} steps", script.len());
        return script.clone();
    }

    let base = config.pause_ms;
    let mut steps = vec![AnimationStep::type_text(config.intro_text.clone())];

    // Characters typed after the intro that the next segment replaces
    let mut tracked_suffix: Option<usize> = None;

    if !config.name.is_empty() {
        let segment = format!(" {}", config.name);
        tracked_suffix = Some(segment.chars().count());
        steps.push(AnimationStep::Type { text: segment });
        steps.push(AnimationStep::Pause { duration: base });
    }

    if !config.role.is_empty() {
        let segment = format!(" {}", config.role);
        replace_suffix(&mut steps, &mut tracked_suffix, segment, base);
    }

    for social in config.visible_socials() {
        let segment = format!(" {}", social.kind.display(&social.handle));
        replace_suffix(&mut steps, &mut tracked_suffix, segment, base);
    }

    steps.push(AnimationStep::Pause { duration: base * 2 });

    debug!("Generated {} animation steps", steps.len());
    steps
}

fn replace_suffix(
    steps: &mut Vec<AnimationStep>,
    tracked_suffix: &mut Option<usize>,
    segment: String,
    base: u64,
) {
    if let Some(count) = tracked_suffix.take() {
        steps.push(AnimationStep::Delete { count });
    }
    *tracked_suffix = Some(segment.chars().count());
    steps.push(AnimationStep::Type { text: segment });
    steps.push(AnimationStep::Pause { duration: base });
}

/// Check that a hand-written script never deletes text it was not given
pub fn validate_script(steps: &[AnimationStep]) -> Result<()> {
    let mut length = 0usize;

    for (index, step) in steps.iter().enumerate() {
        match step {
            AnimationStep::Type { text }
            | AnimationStep::Append { text }
            | AnimationStep::Prepend { text } => {
                length += text.chars().count();
            }
            AnimationStep::Delete { count } => {
                if *count > length {
                    return Err(AnimationError::DeleteUnderflow {
                        index,
                        count: *count,
                        available: length,
                    }
                    .into());
                }
                length -= count;
            }
            AnimationStep::Pause { .. } => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Social, SocialKind};

    fn bare_config(intro: &str) -> Config {
        Config {
            intro_text: intro.to_string(),
            name: String::new(),
            role: String::new(),
            socials: vec![],
            ..Config::default()
        }
    }

    #[test]
    fn test_default_sequence() {
        let config = Config::default();
        let steps = generate_steps(&config);
        let base = config.pause_ms;

        assert_eq!(steps[0], AnimationStep::type_text("Hey there! I am"));
        assert_eq!(steps[1], AnimationStep::type_text(" Niraj"));
        assert_eq!(steps[2], AnimationStep::Pause { duration: base });
        assert_eq!(steps[3], AnimationStep::Delete { count: 6 });
        assert_eq!(steps[4], AnimationStep::type_text(" Software Engineer"));
        assert_eq!(steps[6], AnimationStep::Delete { count: 18 });
        assert_eq!(steps[7], AnimationStep::type_text(" x.com/0xkniraj"));
        assert_eq!(steps.last(), Some(&AnimationStep::Pause { duration: base * 2 }));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = Config::default();
        assert_eq!(generate_steps(&config), generate_steps(&config.clone()));
    }

    #[test]
    fn test_intro_only() {
        let config = bare_config("Hi");
        let base = config.pause_ms;
        assert_eq!(
            generate_steps(&config),
            vec![
                AnimationStep::type_text("Hi"),
                AnimationStep::Pause { duration: base * 2 },
            ]
        );
    }

    #[test]
    fn test_single_social_without_name() {
        let mut config = bare_config("Hello");
        config.socials = vec![Social::new(SocialKind::X, "abc")];
        let base = config.pause_ms;

        assert_eq!(
            generate_steps(&config),
            vec![
                AnimationStep::type_text("Hello"),
                AnimationStep::type_text(" x.com/abc"),
                AnimationStep::Pause { duration: base },
                AnimationStep::Pause { duration: base * 2 },
            ]
        );
    }

    #[test]
    fn test_skipped_socials_leave_no_trace() {
        let mut config = bare_config("Hello");
        config.socials = vec![
            Social::new(SocialKind::X, ""),
            Social::new(SocialKind::Github, "octo").disabled(),
        ];
        let steps = generate_steps(&config);

        assert_eq!(steps.len(), 2);
        assert!(!steps.iter().any(|s| s.to_string().contains("x.com/")));
    }

    #[test]
    fn test_disabled_social_keeps_tracked_suffix() {
        let mut config = bare_config("I am");
        config.name = "Ada".to_string();
        config.socials = vec![
            Social::new(SocialKind::X, "ada").disabled(),
            Social::new(SocialKind::Sns, "ada"),
        ];
        let steps = generate_steps(&config);

        // " Ada" is still the suffix when the .sol handle replaces it
        assert_eq!(steps[3], AnimationStep::Delete { count: 4 });
        assert_eq!(steps[4], AnimationStep::type_text(" ada.sol"));
    }

    #[test]
    fn test_all_social_kinds_emit_their_display_form() {
        let mut config = bare_config("Find me");
        config.socials = SocialKind::ALL
            .iter()
            .map(|kind| Social::new(*kind, "test"))
            .collect();
        let steps = generate_steps(&config);

        for needle in ["x.com/", ".sol", ".eth", "youtube.com/@", "github.com/"] {
            assert!(
                steps.iter().any(|s| matches!(s, AnimationStep::Type { text } if text.contains(needle))),
                "missing {}",
                needle
            );
        }
    }

    #[test]
    fn test_empty_intro_still_produces_a_step() {
        let config = bare_config("");
        let steps = generate_steps(&config);
        assert_eq!(steps[0], AnimationStep::type_text(""));
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_composition_is_lossless() {
        let config = Config::default();
        let mut text = String::new();
        for step in generate_steps(&config) {
            step.apply(&mut text);
        }
        let last = config.visible_socials().last().unwrap();
        assert_eq!(text, format!("Hey there! I am {}", last.kind.display(&last.handle)));
    }

    #[test]
    fn test_script_override_and_validation() {
        let mut config = bare_config("ignored");
        config.script = Some(vec![
            AnimationStep::type_text("name"),
            AnimationStep::Prepend { text: "@".to_string() },
            AnimationStep::Delete { count: 5 },
        ]);

        assert_eq!(generate_steps(&config).len(), 3);
        assert!(validate_script(config.script.as_ref().unwrap()).is_ok());

        let bad = vec![AnimationStep::type_text("ab"), AnimationStep::Delete { count: 3 }];
        assert!(validate_script(&bad).is_err());
    }

    #[test]
    fn test_delete_counts_characters_not_bytes() {
        let mut text = "héllo wörld".to_string();
        AnimationStep::Delete { count: 5 }.apply(&mut text);
        assert_eq!(text, "héllo ");
    }
}
