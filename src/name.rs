//! Stat name validation. The default handler only checks names, it never
//! rewrites them, so valid names come back borrowed.

use std::{borrow::Cow, sync::Arc};

use crate::error::InvalidName;

pub const DEFAULT_MAX_LENGTH: usize = 250;

/// A pluggable naming policy. Handlers may rewrite the name they are given
/// (returning [`Cow::Owned`]) or reject it.
pub type NameHandler =
    Arc<dyn for<'a> Fn(&'a str) -> Result<Cow<'a, str>, InvalidName> + Send + Sync>;

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')
}

/// Validate `name` against the default rules with a maximum length of
/// [`DEFAULT_MAX_LENGTH`].
pub fn validate_stat_name(name: &str) -> Result<Cow<'_, str>, InvalidName> {
    validate_stat_name_with_max(name, DEFAULT_MAX_LENGTH)
}

/// Names longer than `max_length` characters, or that contain anything other
/// than ascii letters, digits, `_`, `.` and `-`, are rejected. Nothing is ever
/// truncated.
pub fn validate_stat_name_with_max(
    name: &str,
    max_length: usize,
) -> Result<Cow<'_, str>, InvalidName> {
    if name.chars().count() > max_length {
        return Err(InvalidName::TooLong {
            name: name.to_string(),
            max_length,
        });
    }
    if let Some(character) = name.chars().find(|c| !is_allowed(*c)) {
        return Err(InvalidName::DisallowedCharacter {
            name: name.to_string(),
            character,
        });
    }
    Ok(Cow::Borrowed(name))
}

/// The handler used when no `stat_name_handler` is configured.
pub fn default_name_handler() -> NameHandler {
    Arc::new(validate_stat_name)
}

/// Wrap a closure as a [`NameHandler`]. Going through this function lets the
/// compiler infer the higher-ranked signature for closures.
pub fn name_handler<F>(f: F) -> NameHandler
where
    F: for<'a> Fn(&'a str) -> Result<Cow<'a, str>, InvalidName> + Send + Sync + 'static,
{
    Arc::new(f)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn valid_names_pass_through_unchanged() {
        for name in [
            "scheduler.heartbeat",
            "dag_processing.total_parse_time",
            "pool.open-slots.default_pool",
            "A-Z_0.9",
            "",
        ] {
            let validated = validate_stat_name(name).unwrap();
            assert_eq!(validated, name);
            assert!(matches!(validated, Cow::Borrowed(_)));
        }
    }

    #[test]
    fn max_length_is_inclusive() {
        let name = "a".repeat(DEFAULT_MAX_LENGTH);
        assert!(validate_stat_name(&name).is_ok());

        let name = "a".repeat(DEFAULT_MAX_LENGTH + 1);
        assert_eq!(
            validate_stat_name(&name),
            Err(InvalidName::TooLong {
                name: name.clone(),
                max_length: DEFAULT_MAX_LENGTH,
            })
        );
    }

    #[test]
    fn custom_max_length() {
        assert!(validate_stat_name_with_max("abcde", 5).is_ok());
        assert!(matches!(
            validate_stat_name_with_max("abcdef", 5),
            Err(InvalidName::TooLong { max_length: 5, .. })
        ));
    }

    #[test]
    fn disallowed_characters() {
        for (name, bad) in [
            ("task/duration", '/'),
            ("with space", ' '),
            ("colon:tag", ':'),
            ("pipe|c", '|'),
            ("caf\u{e9}", '\u{e9}'),
            ("tab\there", '\t'),
        ] {
            match validate_stat_name(name) {
                Err(InvalidName::DisallowedCharacter { character, .. }) => {
                    assert_eq!(character, bad, "{name}")
                }
                other => panic!("expected {name:?} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn every_allowed_character_is_accepted() {
        let all: String = ('a'..='z')
            .chain('A'..='Z')
            .chain('0'..='9')
            .chain(['_', '.', '-'])
            .collect();
        assert_eq!(validate_stat_name(&all).unwrap(), all.as_str());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let name = "\u{e9}".repeat(200);
        assert!(matches!(
            validate_stat_name(&name),
            Err(InvalidName::DisallowedCharacter { .. })
        ));
        // Length is checked first.
        let name = "\u{e9}".repeat(251);
        assert!(matches!(
            validate_stat_name(&name),
            Err(InvalidName::TooLong { .. })
        ));
    }

    #[test]
    fn wrapped_closures_can_rewrite() {
        let handler = name_handler(|name| Ok(Cow::Owned(name.replace('/', "."))));
        assert_eq!(handler("a/b/c").unwrap(), "a.b.c");
    }

    proptest! {
        #[test]
        fn allowed_names_validate_to_themselves(name in "[A-Za-z0-9_.-]{0,250}") {
            let validated = validate_stat_name(&name).unwrap();
            prop_assert_eq!(validated, name.as_str());
        }

        #[test]
        fn one_disallowed_character_is_enough(
            head in "[A-Za-z0-9_.-]{0,100}",
            bad in "[^A-Za-z0-9_.-]",
            tail in "[A-Za-z0-9_.-]{0,100}",
        ) {
            let name = format!("{head}{bad}{tail}");
            let rejected = matches!(
                validate_stat_name(&name),
                Err(InvalidName::DisallowedCharacter { .. })
            );
            prop_assert!(rejected, "{:?} was accepted", name);
        }

        #[test]
        fn over_long_names_are_rejected(name in "[A-Za-z0-9_.-]{251,400}") {
            let rejected = matches!(
                validate_stat_name(&name),
                Err(InvalidName::TooLong { max_length: DEFAULT_MAX_LENGTH, .. })
            );
            prop_assert!(rejected, "{} characters were accepted", name.len());
        }
    }
}
