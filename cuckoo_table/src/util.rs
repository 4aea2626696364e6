/// Implements `Iterator` for a wrapper struct with fields `inner`, an iterator yielding the
/// entries of occupied slots, and `remaining`, the number of entries not yet yielded. Entries are
/// mapped with the given function.
macro_rules! impl_slot_iterator {
    () => {
        impl_slot_iterator!(|x| x);
    };
    ($f: expr) => {
        #[inline]
        fn next(&mut self) -> Option<Self::Item> {
            if self.remaining == 0 {
                return None;
            }
            let item = self.inner.next().map($f);
            if item.is_some() {
                self.remaining -= 1;
            }
            item
        }
        #[inline]
        fn size_hint(&self) -> (usize, Option<usize>) {
            (self.remaining, Some(self.remaining))
        }
        fn count(self) -> usize {
            self.remaining
        }
    };
}
pub(crate) use impl_slot_iterator;

/// Implements `Iterator` for a wrapper struct by forwarding to its `inner` iterator, mapping each
/// item with the given function.
macro_rules! impl_iterator {
    () => {
        impl_iterator!(|x| x);
    };
    ($f: expr) => {
        #[inline]
        fn next(&mut self) -> Option<Self::Item> {
            self.inner.next().map($f)
        }
        #[inline]
        fn size_hint(&self) -> (usize, Option<usize>) {
            self.inner.size_hint()
        }
        fn count(self) -> usize {
            self.inner.count()
        }
    };
}
pub(crate) use impl_iterator;
