//! Structural cache keys.
//!
//! A key describes an expression by the members it reads, never by the tree
//! nodes it was built from. Nodes of a captured lambda reach its closure
//! objects, so a key that kept them alive would pin those objects for the
//! lifetime of the cache; keys therefore copy out `(declaring type, member)`
//! name pairs.

use std::fmt;
use std::hash::{Hash, Hasher};

use smallvec::SmallVec;
use vela_ir::{ExprKind, ExprRef, MemberKey, Name, Type};

/// Member chain of a chained accessor, from the terminal member inward, plus
/// the model type the chain starts from.
///
/// Equality is positional over `(declaring type, member)`, except that a
/// position where both members are synthesized ends the comparison as equal.
/// Closure classes generated at different call sites differ in name while
/// denoting the same access, and treating them as one avoids fragmenting the
/// cache. Hashing stops at the first synthesized member to stay consistent
/// with that rule.
#[derive(Clone)]
pub struct MemberChainKey {
    model_type: Name,
    members: SmallVec<[MemberKey; 4]>,
}

impl MemberChainKey {
    pub fn new(model_type: Name, members: impl IntoIterator<Item = MemberKey>) -> Self {
        MemberChainKey {
            model_type,
            members: members.into_iter().collect(),
        }
    }

    /// Build a key from a member chain rooted at a parameter.
    ///
    /// Returns `None` if the walk from `terminal` reaches anything other than
    /// instance member accesses and a parameter.
    pub fn from_chain(model_type: &Type, terminal: &ExprRef) -> Option<Self> {
        let mut members = SmallVec::new();
        let mut current = terminal;
        loop {
            match current.kind() {
                ExprKind::Member {
                    target: Some(target),
                    member,
                } => {
                    members.push(member.key());
                    current = target;
                }
                ExprKind::Parameter(_) => break,
                _ => return None,
            }
        }
        Some(MemberChainKey {
            model_type: model_type.name(),
            members,
        })
    }

    #[inline]
    pub fn model_type(&self) -> Name {
        self.model_type
    }

    /// Members, terminal first.
    #[inline]
    pub fn members(&self) -> &[MemberKey] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl PartialEq for MemberChainKey {
    fn eq(&self, other: &Self) -> bool {
        if self.model_type != other.model_type {
            return false;
        }
        let mut left = self.members.iter();
        let mut right = other.members.iter();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) => {
                    if a.synthesized && b.synthesized {
                        return true;
                    }
                    if a.declaring_type != b.declaring_type || a.member != b.member {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

impl Eq for MemberChainKey {}

impl Hash for MemberChainKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.model_type.hash(state);
        for member in self.members.iter().take_while(|m| !m.synthesized) {
            member.declaring_type.hash(state);
            member.member.hash(state);
        }
    }
}

impl fmt::Debug for MemberChainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberChainKey({}", self.model_type)?;
        for member in self.members.iter().rev() {
            write!(f, " -> {member}")?;
        }
        f.write_str(")")
    }
}
