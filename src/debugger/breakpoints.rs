use std::collections::BTreeSet;

/// Source lines at which the debugger pauses before executing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Breakpoints {
    points: BTreeSet<usize>,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self {
            points: BTreeSet::new(),
        }
    }

    pub fn add(&mut self, line: usize) {
        self.points.insert(line);
        tracing::debug!(line, "breakpoint set");
    }

    /// Returns whether a breakpoint was actually present.
    pub fn remove(&mut self, line: usize) -> bool {
        let removed = self.points.remove(&line);
        tracing::debug!(line, removed, "breakpoint cleared");
        removed
    }

    pub fn contains(&self, line: usize) -> bool {
        self.points.contains(&line)
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.points.iter().copied()
    }
}

impl FromIterator<usize> for Breakpoints {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_contains() {
        let mut bps = Breakpoints::new();
        bps.add(5);
        bps.add(10);
        bps.add(5);

        assert!(bps.contains(5));
        assert!(!bps.contains(7));
        assert_eq!(bps.iter().collect::<Vec<_>>(), vec![5, 10]);

        assert!(bps.remove(5));
        assert!(!bps.remove(5));
        assert!(!bps.contains(5));

        bps.clear();
        assert!(bps.is_empty());
    }
}
