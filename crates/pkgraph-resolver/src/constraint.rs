//! Version requirements collected for one dependency location.

use std::fmt;

use pkgraph_core::version::VersionRange;

/// A range declared by one consumer for a dependency location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Location of the package that declared the dependency.
    pub consumer: String,
    pub range: VersionRange,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' requires {}", self.consumer, self.range)
    }
}

/// Every requirement placed on one location, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    entries: Vec<Requirement>,
}

impl Requirements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, consumer: impl Into<String>, range: VersionRange) {
        self.entries.push(Requirement {
            consumer: consumer.into(),
            range,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Intersection of every requirement. `None` when there are none.
    pub fn combined(&self) -> Option<VersionRange> {
        let mut ranges = self.entries.iter().map(|r| &r.range);
        let first = ranges.next()?.clone();
        Some(ranges.fold(first, |acc, range| acc.intersect(range)))
    }
}

impl fmt::Display for Requirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, requirement) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{requirement}")?;
        }
        Ok(())
    }
}
