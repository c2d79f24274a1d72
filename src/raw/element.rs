use crate::Revision;

/// Half-open validity interval `[birth, death)` of an element.
///
/// `death == None` means the element is still live ("immortal").
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Lifespan {
    birth: Revision,
    death: Option<Revision>,
}

impl Lifespan {
    #[inline]
    pub(crate) const fn born_at(birth: Revision) -> Self {
        Self { birth, death: None }
    }

    #[inline]
    pub(crate) const fn birth(&self) -> Revision {
        self.birth
    }

    #[inline]
    pub(crate) fn is_alive_at(&self, t: Revision) -> bool {
        self.birth <= t && self.death.is_none_or(|death| t < death)
    }

    #[inline]
    pub(crate) const fn is_immortal(&self) -> bool {
        self.death.is_none()
    }

    /// Ends the interval at `t`.
    ///
    /// # Panics
    ///
    /// Panics if the interval does not contain `t`.
    pub(crate) fn kill(&mut self, t: Revision) {
        assert!(
            self.is_alive_at(t),
            "`Lifespan::kill()` - element born at {} (death {:?}) is not alive at {t}",
            self.birth,
            self.death
        );
        self.death = Some(t);
    }
}

/// A key and payload stamped with the revisions during which they are present.
///
/// Inside an external node the payload is a value handle; inside an internal
/// node it is the child the routing key leads to.
#[derive(Clone, Debug)]
pub(crate) struct MortalElement<K, P> {
    key: K,
    payload: P,
    lifespan: Lifespan,
}

impl<K, P: Copy> MortalElement<K, P> {
    pub(crate) const fn new(key: K, payload: P, birth: Revision) -> Self {
        Self {
            key,
            payload,
            lifespan: Lifespan::born_at(birth),
        }
    }

    #[inline]
    pub(crate) const fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub(crate) fn payload(&self) -> P {
        self.payload
    }

    /// Re-targets a routing element. Only valid while nobody but the current
    /// write can observe the element.
    pub(crate) fn set_payload(&mut self, t: Revision, payload: P) {
        assert_eq!(self.birth(), t, "`MortalElement::set_payload()` - element is already published");
        self.payload = payload;
    }

    #[inline]
    pub(crate) const fn birth(&self) -> Revision {
        self.lifespan.birth()
    }

    #[inline]
    pub(crate) fn is_alive_at(&self, t: Revision) -> bool {
        self.lifespan.is_alive_at(t)
    }

    #[inline]
    pub(crate) const fn is_immortal(&self) -> bool {
        self.lifespan.is_immortal()
    }

    #[inline]
    pub(crate) fn kill(&mut self, t: Revision) {
        self.lifespan.kill(t);
    }

    /// A copy of this element's key and payload, born at `t`.
    pub(crate) fn reborn(&self, t: Revision) -> Self
    where
        K: Clone,
    {
        Self::new(self.key.clone(), self.payload, t)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn alive_on_half_open_interval() {
        let mut element = MortalElement::new("k", 7u32, Revision(3));
        assert!(!element.is_alive_at(Revision(2)));
        assert!(element.is_alive_at(Revision(3)));
        assert!(element.is_alive_at(Revision(1_000)));
        assert!(element.is_immortal());

        element.kill(Revision(5));
        assert!(element.is_alive_at(Revision(4)));
        assert!(!element.is_alive_at(Revision(5)));
        assert!(!element.is_immortal());
    }

    #[test]
    fn reborn_keeps_key_and_payload() {
        let mut element = MortalElement::new(10, 99u32, Revision(1));
        element.kill(Revision(4));
        let copy = element.reborn(Revision(4));
        assert_eq!(*copy.key(), 10);
        assert_eq!(copy.payload(), 99);
        assert_eq!(copy.birth(), Revision(4));
        assert!(copy.is_immortal());
    }

    #[test]
    #[should_panic(expected = "`Lifespan::kill()`")]
    fn killing_dead_element_panics() {
        let mut element = MortalElement::new(1, 1u32, Revision(1));
        element.kill(Revision(2));
        element.kill(Revision(3));
    }

    #[test]
    #[should_panic(expected = "`Lifespan::kill()`")]
    fn killing_unborn_element_panics() {
        let mut element = MortalElement::new(1, 1u32, Revision(5));
        element.kill(Revision(4));
    }

    #[test]
    #[should_panic(expected = "`MortalElement::set_payload()`")]
    fn published_payload_is_frozen() {
        let mut element = MortalElement::new(1, 1u32, Revision(2));
        element.set_payload(Revision(3), 2);
    }
}
