use std::collections::HashSet;

/// Hands out column names that are unique within one group of columns.
///
/// A taken name gets the smallest numeric suffix that makes it unique: `value`, `value1`,
/// `value2`, ...
#[derive(Clone, Debug, Default)]
pub struct NameGenerator {
    used: HashSet<String>,
}

impl NameGenerator {
    pub fn new<I, S>(used: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            used: used.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    pub fn add_unique(&mut self, preferred: &str) -> String {
        let mut name = preferred.to_string();
        let mut k = 1;
        while self.used.contains(&name) {
            name = format!("{preferred}{k}");
            k += 1;
        }
        self.used.insert(name.clone());
        name
    }
}
