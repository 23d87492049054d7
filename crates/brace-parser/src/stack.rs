/// A stack whose pops can be undone.
///
/// Every popped element moves to an undo log. `rollback` puts the logged
/// elements back in their original order, `commit` forgets them, and
/// `take_popped` hands them over (bottom-most first) as the children of a
/// reduction.
#[derive(Debug, Clone)]
pub struct Stack<T> {
    elems: Vec<T>,
    popped: Vec<T>,
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self {
            elems: Vec::new(),
            popped: Vec::new(),
        }
    }

    pub fn push(&mut self, elem: T) {
        self.elems.push(elem);
    }

    pub fn peek(&self) -> Option<&T> {
        self.elems.last()
    }

    /// Pop the top element into the undo log, returning a view of it.
    pub fn pop(&mut self) -> Option<&T> {
        let top = self.elems.pop()?;
        self.popped.push(top);
        self.popped.last()
    }

    /// Restore the most recently popped element. Returns false when the log
    /// is empty.
    pub fn rollback_one(&mut self) -> bool {
        match self.popped.pop() {
            Some(elem) => {
                self.elems.push(elem);
                true
            }
            None => false,
        }
    }

    /// Restore every popped element since the last commit.
    pub fn rollback(&mut self) {
        while self.rollback_one() {}
    }

    pub fn commit(&mut self) {
        self.popped.clear();
    }

    /// Commit and return the popped elements, bottom-most first.
    pub fn take_popped(&mut self) -> Vec<T> {
        let mut popped = std::mem::take(&mut self.popped);
        popped.reverse();
        popped
    }

    /// Number of popped, uncommitted elements.
    pub fn pending(&self) -> usize {
        self.popped.len()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Elements from the bottom up.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.elems.iter()
    }

    /// The remaining elements, bottom first. Uncommitted pops are dropped.
    pub fn into_vec(self) -> Vec<T> {
        self.elems
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}
