/// A pair of a previous (source) and a next (target) value of the same type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Pair<T> {
    previous: T,
    next: T,
}

impl<T> Pair<T> {
    pub(crate) fn new(previous: T, next: T) -> Self {
        Pair { previous, next }
    }

    pub(crate) fn previous(&self) -> &T {
        &self.previous
    }

    pub(crate) fn next(&self) -> &T {
        &self.next
    }
}
