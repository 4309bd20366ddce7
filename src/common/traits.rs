//! Repository editing interface
//!
//! The rewriter never decides what a repository should be renamed to; it asks a
//! [`RepositoryEdit`] implementation. Plain closures work through the blanket impl.

/// Maps a repository name (no tag, no digest) to its replacement
pub trait RepositoryEdit {
    fn edit(&self, repository: &str) -> String;
}

impl<F> RepositoryEdit for F
where
    F: Fn(&str) -> String,
{
    fn edit(&self, repository: &str) -> String {
        self(repository)
    }
}

/// Returns every repository unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl RepositoryEdit for Identity {
    fn edit(&self, repository: &str) -> String {
        repository.to_string()
    }
}

/// Replaces a leading repository prefix, e.g. `kindest` -> `registry.local/kindest`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRewrite {
    pub from: String,
    pub to: String,
}

impl PrefixRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl RepositoryEdit for PrefixRewrite {
    fn edit(&self, repository: &str) -> String {
        match repository.strip_prefix(&self.from) {
            Some(rest) => format!("{}{}", self.to, rest),
            None => repository.to_string(),
        }
    }
}

/// Drops a trailing suffix such as `-amd64` from single-arch CI image names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixStrip {
    pub suffix: String,
}

impl SuffixStrip {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl RepositoryEdit for SuffixStrip {
    fn edit(&self, repository: &str) -> String {
        repository
            .strip_suffix(&self.suffix)
            .unwrap_or(repository)
            .to_string()
    }
}

/// Applies editors in order, feeding each the previous result
#[derive(Default)]
pub struct EditChain {
    editors: Vec<Box<dyn RepositoryEdit>>,
}

impl EditChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, editor: impl RepositoryEdit + 'static) -> Self {
        self.editors.push(Box::new(editor));
        self
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }
}

impl RepositoryEdit for EditChain {
    fn edit(&self, repository: &str) -> String {
        self.editors
            .iter()
            .fold(repository.to_string(), |current, editor| editor.edit(&current))
    }
}
