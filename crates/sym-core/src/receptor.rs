use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::{CoreError, CoreResult};

/// Angle of a receptor in degrees. Only multiples of 15 from 0 to 90 exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Orientation(u8);

impl Orientation {
    /// Every valid orientation.
    pub const ALL: [Orientation; 7] = [
        Self(0),
        Self(15),
        Self(30),
        Self(45),
        Self(60),
        Self(75),
        Self(90),
    ];

    /// Sum two compatible orientations must reach.
    pub const COMPLEMENT_SUM: u16 = 90;

    /// Validate a degree value.
    pub fn new(degrees: u16) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|o| u16::from(o.0) == degrees)
            .ok_or(CoreError::InvalidOrientation(degrees))
    }

    /// Pick one of the valid orientations uniformly.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// The angle in degrees.
    pub fn degrees(self) -> u16 {
        u16::from(self.0)
    }

    /// Whether the two angles add up to a right angle.
    pub fn complements(self, other: Self) -> bool {
        self.degrees() + other.degrees() == Self::COMPLEMENT_SUM
    }
}

impl TryFrom<u16> for Orientation {
    type Error = CoreError;

    fn try_from(value: u16) -> CoreResult<Self> {
        Self::new(value)
    }
}

impl From<Orientation> for u16 {
    fn from(value: Orientation) -> Self {
        value.degrees()
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.0)
    }
}

/// Identifies a receptor by its owning agent and its position on that agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReceptorId {
    /// The agent carrying the receptor.
    pub agent: AgentId,
    /// Index into that agent's receptor list.
    pub index: u8,
}

impl fmt::Display for ReceptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/r{}", self.agent, self.index)
    }
}

/// A connection point on an agent.
///
/// The link is a plain id of the peer receptor. It never owns anything and
/// must be resolved through the population before use.
#[derive(Debug, Clone, PartialEq)]
pub struct Receptor {
    id: ReceptorId,
    orientation: Orientation,
    link: Option<ReceptorId>,
}

impl Receptor {
    /// An unbound receptor.
    pub fn new(id: ReceptorId, orientation: Orientation) -> Self {
        Self {
            id,
            orientation,
            link: None,
        }
    }

    /// This receptor's id.
    pub fn id(&self) -> ReceptorId {
        self.id
    }

    /// Fixed at creation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The receptor this one is bound to, if any.
    pub fn link(&self) -> Option<ReceptorId> {
        self.link
    }

    /// Whether this receptor is bound.
    pub fn is_bound(&self) -> bool {
        self.link.is_some()
    }

    /// True iff the orientations complement each other and both sides are free.
    pub fn can_link(&self, other: &Receptor) -> bool {
        self.orientation.complements(other.orientation) && !self.is_bound() && !other.is_bound()
    }

    /// Point both receptors at each other. Does not re-check [`can_link`](Self::can_link).
    pub fn bind(&mut self, other: &mut Receptor) {
        self.link = Some(other.id);
        other.link = Some(self.id);
    }

    /// Drop the link on this side only.
    pub fn unbind(&mut self) {
        self.link = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn receptor(index: u8, degrees: u16) -> Receptor {
        let id = ReceptorId {
            agent: AgentId::default(),
            index,
        };
        Receptor::new(id, Orientation::new(degrees).unwrap())
    }

    #[test]
    fn orientation_rejects_off_grid_values() {
        assert!(Orientation::new(20).is_err());
        assert!(Orientation::new(105).is_err());
        assert_eq!(Orientation::new(75).unwrap().degrees(), 75);
    }

    #[test]
    fn complementary_pairs() {
        let pairs = [(0, 90), (15, 75), (30, 60), (45, 45)];
        for (a, b) in pairs {
            assert!(receptor(0, a).can_link(&receptor(1, b)));
            assert!(receptor(0, b).can_link(&receptor(1, a)));
        }
        assert!(!receptor(0, 30).can_link(&receptor(1, 30)));
        assert!(!receptor(0, 0).can_link(&receptor(1, 0)));
    }

    #[test]
    fn bind_is_symmetric() {
        let mut a = receptor(0, 30);
        let mut b = receptor(1, 60);
        a.bind(&mut b);
        assert_eq!(a.link(), Some(b.id()));
        assert_eq!(b.link(), Some(a.id()));
    }

    #[test]
    fn bound_receptors_cannot_link_again() {
        let mut a = receptor(0, 30);
        let mut b = receptor(1, 60);
        let c = receptor(2, 60);
        a.bind(&mut b);
        assert!(!a.can_link(&c));
        assert!(!c.can_link(&b));

        a.unbind();
        assert!(a.can_link(&c));
        assert!(b.is_bound());
    }

    #[test]
    fn orientation_serde_uses_degrees() {
        let o = Orientation::new(45).unwrap();
        assert_eq!(u16::from(o), 45);
        assert!(Orientation::try_from(46u16).is_err());
    }

    proptest! {
        #[test]
        fn compatibility_law(a in 0usize..7, b in 0usize..7, bound_a: bool, bound_b: bool) {
            let oa = Orientation::ALL[a];
            let ob = Orientation::ALL[b];
            let mut ra = receptor(0, oa.degrees());
            let mut rb = receptor(1, ob.degrees());
            let mut spare = receptor(2, 0);
            if bound_a { ra.bind(&mut spare); }
            if bound_b { rb.bind(&mut spare); }
            let expected = oa.degrees() + ob.degrees() == 90 && !bound_a && !bound_b;
            prop_assert_eq!(ra.can_link(&rb), expected);
            prop_assert_eq!(ra.orientation(), oa);
        }
    }
}
