//! The class-index boundary.
//!
//! The lattice never inspects class hierarchies itself; it asks the
//! whole-program index through the `ClassLike` capability trait and holds
//! resolved classes behind cloneable `ClsHandle`s. Test code (and the
//! analysis driver during early passes) supplies its own implementations,
//! the same way the solver's resolver trait works in the rest of the
//! optimizer.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use hazel_common::Str;

/// Capabilities the lattice requires of a resolved class.
///
/// Two handles denote the same class iff their names are equal; the index
/// guarantees names are unique.
pub trait ClassLike: fmt::Debug + Send + Sync {
    /// The class's fully qualified name.
    fn name(&self) -> Str;

    /// Is this class a subtype of `other`?
    fn subtype_of(&self, other: &dyn ClassLike) -> bool;

    /// Could a value of this class also be a value of `other`? Conservative:
    /// must be precise when answering `false`.
    fn could_be(&self, other: &dyn ClassLike) -> bool;

    /// Could some loaded subclass override this class's behavior? When
    /// false, an upper-bound handle is in fact exact.
    fn could_be_overridden(&self) -> bool;

    /// Could instances carry a user-defined boolean conversion?
    fn could_have_magic_bool(&self) -> bool;

    /// Could this upper bound be an interface rather than a class?
    fn could_be_interface(&self) -> bool;

    /// The nearest common ancestor of this class and `other`, if the index
    /// can name one.
    fn common_ancestor(&self, other: &dyn ClassLike) -> Option<ClsHandle>;
}

/// A cloneable handle to a resolved class.
#[derive(Clone)]
pub struct ClsHandle(Arc<dyn ClassLike>);

impl ClsHandle {
    pub fn new(cls: Arc<dyn ClassLike>) -> ClsHandle {
        ClsHandle(cls)
    }

    pub fn name(&self) -> Str {
        self.0.name()
    }

    pub fn same(&self, other: &ClsHandle) -> bool {
        self.0.name() == other.0.name()
    }

    pub fn subtype_of(&self, other: &ClsHandle) -> bool {
        self.0.subtype_of(&*other.0)
    }

    pub fn could_be(&self, other: &ClsHandle) -> bool {
        self.0.could_be(&*other.0)
    }

    pub fn could_be_overridden(&self) -> bool {
        self.0.could_be_overridden()
    }

    pub fn could_have_magic_bool(&self) -> bool {
        self.0.could_have_magic_bool()
    }

    pub fn could_be_interface(&self) -> bool {
        self.0.could_be_interface()
    }

    pub fn common_ancestor(&self, other: &ClsHandle) -> Option<ClsHandle> {
        self.0.common_ancestor(&*other.0)
    }
}

impl PartialEq for ClsHandle {
    fn eq(&self, other: &ClsHandle) -> bool {
        self.same(other)
    }
}

impl Eq for ClsHandle {}

impl Hash for ClsHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for ClsHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cls({})", self.name())
    }
}
