use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::num::NonZero;

type RawHandle = u32;

/// Index of a slot in an [`Arena<T>`](super::arena::Arena).
///
/// The type parameter keeps node handles and value handles apart; it carries
/// no ownership.
#[repr(transparent)]
pub(crate) struct Handle<T> {
    raw: NonZero<RawHandle>,
    marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        #[allow(clippy::cast_possible_truncation)]
        let raw = (index + 1) as RawHandle;
        match NonZero::new(raw) {
            Some(raw) => Self {
                raw,
                marker: PhantomData,
            },
            None => panic!("`Handle::from_index()` - zero handle"),
        }
    }

    #[inline]
    pub(crate) const fn to_index(self) -> usize {
        (self.raw.get() - 1) as usize
    }
}

// Manual impls: derives would demand the same traits of `T`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_index())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use static_assertions::assert_eq_size;

    // Verify our assumptions about `Handle` and the niche optimization.
    assert_eq_size!(Handle<u64>, Option<Handle<u64>>);
    assert_eq_size!(Handle<String>, RawHandle);

    #[test]
    #[should_panic(expected = "`Handle::from_index()` - `index` > `Handle::MAX`!")]
    fn invalid_handle() {
        let _ = Handle::<u8>::from_index(Handle::<u8>::MAX + 1);
    }

    #[test]
    fn handles_compare_by_index() {
        let a = Handle::<u8>::from_index(3);
        let b = Handle::<u8>::from_index(3);
        assert_eq!(a, b);
        assert_ne!(a, Handle::from_index(4));
        assert_eq!(format!("{a:?}"), "#3");
    }
}
