use crate::value::Identity;
use std::collections::HashMap;

/// Identity of a visited reference target, qualified by its type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisitKey {
    pub id: Identity,
    pub ty: String,
}

impl VisitKey {
    pub fn new(id: Identity, ty: impl Into<String>) -> Self {
        Self { id, ty: ty.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Never seen; descend.
    First,
    /// Seen before with the same partner; already covered.
    Revisited,
    /// The given side was seen before paired with a different partner.
    Conflict(Side),
}

/// Per-call record of which reference targets were paired with which.
#[derive(Debug, Default)]
pub struct CycleGuard {
    a_visited: HashMap<VisitKey, VisitKey>,
    b_visited: HashMap<VisitKey, VisitKey>,
}

impl CycleGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the pair, then record it on both sides.
    pub fn visit(&mut self, a: VisitKey, b: VisitKey) -> Visit {
        let outcome = match self.a_visited.get(&a) {
            Some(paired) if *paired == b => Visit::Revisited,
            Some(_) => Visit::Conflict(Side::Left),
            None if self.b_visited.contains_key(&b) => Visit::Conflict(Side::Right),
            None => Visit::First,
        };

        self.a_visited.insert(a.clone(), b.clone());
        self.b_visited.insert(b, a);
        outcome
    }

    pub fn lookup(&self, side: Side, key: &VisitKey) -> Option<&VisitKey> {
        match side {
            Side::Left => self.a_visited.get(key),
            Side::Right => self.b_visited.get(key),
        }
    }

    pub fn len(&self) -> usize {
        self.a_visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a_visited.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: u64) -> VisitKey {
        VisitKey::new(Identity(id), "Node")
    }

    #[test]
    fn test_first_then_revisited() {
        let mut guard = CycleGuard::new();
        assert_eq!(guard.visit(key(1), key(10)), Visit::First);
        assert_eq!(guard.visit(key(1), key(10)), Visit::Revisited);
        assert_eq!(guard.len(), 1);
        assert_eq!(guard.lookup(Side::Right, &key(10)), Some(&key(1)));
    }

    #[test]
    fn test_left_conflict() {
        let mut guard = CycleGuard::new();
        guard.visit(key(1), key(10));
        assert_eq!(guard.visit(key(1), key(11)), Visit::Conflict(Side::Left));
    }

    #[test]
    fn test_right_conflict() {
        let mut guard = CycleGuard::new();
        guard.visit(key(1), key(10));
        assert_eq!(guard.visit(key(2), key(10)), Visit::Conflict(Side::Right));
    }

    #[test]
    fn test_type_qualifies_identity() {
        let mut guard = CycleGuard::new();
        guard.visit(key(1), key(10));
        let other = VisitKey::new(Identity(1), "Other");
        assert_eq!(
            guard.visit(other, VisitKey::new(Identity(10), "Other")),
            Visit::First
        );
    }
}
