use super::handle::Handle;

/// Append-only slot storage.
///
/// Slots are never freed: a retired node or a superseded value may still be
/// reachable from an older revision.
#[derive(Clone)]
pub(crate) struct Arena<T> {
    slots: Vec<T>,
    limit: usize,
}

impl<T> Arena<T> {
    pub(crate) fn with_limit(limit: usize) -> Self {
        assert!(limit <= Handle::<T>::MAX, "`Arena::with_limit()` - `limit` > `Handle::MAX`!");
        Self {
            slots: Vec::new(),
            limit,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots that can still be allocated.
    pub(crate) fn available(&self) -> usize {
        self.limit - self.slots.len()
    }

    pub(crate) fn alloc(&mut self, element: T) -> Handle<T> {
        // Callers reserve before a write, so running out here is a bookkeeping bug.
        assert!(
            self.slots.len() < self.limit,
            "`Arena::alloc()` - arena is at maximum capacity ({})",
            self.limit
        );
        self.slots.push(element);
        Handle::from_index(self.slots.len() - 1)
    }

    #[inline]
    pub(crate) fn get(&self, handle: Handle<T>) -> &T {
        self.slots.get(handle.to_index()).expect("`Arena::get()` - `handle` is invalid!")
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, handle: Handle<T>) -> &mut T {
        self.slots.get_mut(handle.to_index()).expect("`Arena::get_mut()` - `handle` is invalid!")
    }

    /// Iterates every slot with its handle, in allocation order.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().map(|(index, element)| (Handle::from_index(index), element))
    }
}
