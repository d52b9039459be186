use smallvec::SmallVec;

/// Filter stats by name prefix.
///
/// NOTE: matching is a plain `starts_with`, not a segment match, so a
/// configured prefix of `foo` lets through both `foo.bar` and `foobar`.
/// Emitted metrics in running deployments depend on this, keep it.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    prefixes: Option<SmallVec<[String; 4]>>,
}

impl AllowList {
    /// Parse a comma separated list of prefixes. `None` and the empty string
    /// both produce a pass-through filter.
    pub fn new(raw: Option<&str>) -> Self {
        let prefixes = raw.filter(|raw| !raw.is_empty()).map(|raw| {
            raw.split(',')
                .map(|item| item.trim().to_lowercase())
                .collect()
        });
        Self { prefixes }
    }

    /// A filter that lets everything through.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.prefixes.is_some()
    }

    pub fn prefixes(&self) -> &[String] {
        self.prefixes.as_deref().unwrap_or_default()
    }

    /// Test if stat is in the allow list.
    pub fn test(&self, stat: &str) -> bool {
        match &self.prefixes {
            Some(prefixes) => {
                let stat = stat.trim().to_lowercase();
                prefixes.iter().any(|prefix| stat.starts_with(prefix.as_str()))
            }
            None => true,
        }
    }
}
