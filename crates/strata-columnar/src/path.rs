use smallvec::SmallVec;
use std::fmt;

/// Ordered sequence of column names addressing a column through nested column groups.
///
/// Names are stored verbatim, so a name may itself contain a `.`; the dotted form is only used
/// for display.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnPath(SmallVec<[String; 2]>);

impl ColumnPath {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// The empty path, addressing the frame itself.
    pub fn root() -> Self {
        Self(SmallVec::new())
    }

    pub fn single(name: impl Into<String>) -> Self {
        let mut names = SmallVec::new();
        names.push(name.into());
        Self(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Last segment of the path.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn get(&self, depth: usize) -> Option<&str> {
        self.0.get(depth).map(String::as_str)
    }

    /// Path without its last segment. The parent of a top-level column is the root path.
    pub fn parent(&self) -> Option<ColumnPath> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].iter().cloned().collect()))
    }

    pub fn child(&self, name: impl Into<String>) -> ColumnPath {
        let mut names = self.0.clone();
        names.push(name.into());
        Self(names)
    }

    pub fn concat(&self, other: &ColumnPath) -> ColumnPath {
        let mut names = self.0.clone();
        names.extend(other.0.iter().cloned());
        Self(names)
    }

    /// Replaces the last segment.
    pub fn with_name(&self, name: impl Into<String>) -> ColumnPath {
        match self.parent() {
            Some(parent) => parent.child(name),
            None => ColumnPath::single(name),
        }
    }

    /// Suffix of the path starting at `depth`.
    pub fn drop_first(&self, depth: usize) -> ColumnPath {
        Self(self.0.iter().skip(depth).cloned().collect())
    }

    pub fn take_first(&self, depth: usize) -> ColumnPath {
        Self(self.0.iter().take(depth).cloned().collect())
    }

    pub fn starts_with(&self, prefix: &ColumnPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0.iter().zip(prefix.0.iter()).all(|(a, b)| a == b)
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

impl From<&str> for ColumnPath {
    fn from(name: &str) -> Self {
        ColumnPath::single(name)
    }
}

impl From<String> for ColumnPath {
    fn from(name: String) -> Self {
        ColumnPath::single(name)
    }
}

impl<const N: usize> From<[&str; N]> for ColumnPath {
    fn from(names: [&str; N]) -> Self {
        ColumnPath::new(names)
    }
}

impl From<Vec<String>> for ColumnPath {
    fn from(names: Vec<String>) -> Self {
        ColumnPath::new(names)
    }
}

impl From<&ColumnPath> for ColumnPath {
    fn from(path: &ColumnPath) -> Self {
        path.clone()
    }
}
