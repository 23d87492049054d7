/// Collects candidate errors, each with a rank: how far the candidate got
/// before failing. The highest-ranked error is the most useful to report.
#[derive(Debug, Clone)]
pub struct ErrorRank<E> {
    entries: Vec<(E, usize)>,
}

impl<E: PartialEq> ErrorRank<E> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record `error` at `rank`. An equal error already present keeps the
    /// higher of the two ranks.
    pub fn add(&mut self, error: E, rank: usize) {
        match self.entries.iter_mut().find(|(e, _)| *e == error) {
            Some(entry) => entry.1 = entry.1.max(rank),
            None => self.entries.push((error, rank)),
        }
    }

    pub fn max_rank(&self) -> Option<usize> {
        self.entries.iter().map(|(_, rank)| *rank).max()
    }

    /// The highest-ranked error; the earliest recorded wins ties.
    pub fn best(&self) -> Option<&E> {
        self.best_index().map(|i| &self.entries[i].0)
    }

    pub fn into_best(mut self) -> Option<E> {
        let index = self.best_index()?;
        Some(self.entries.swap_remove(index).0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, (_, rank)) in self.entries.iter().enumerate() {
            if best.map_or(true, |b| *rank > self.entries[b].1) {
                best = Some(i);
            }
        }
        best
    }
}

impl<E: PartialEq> Default for ErrorRank<E> {
    fn default() -> Self {
        Self::new()
    }
}
