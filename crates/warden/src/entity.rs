//! Runtime type identity for actors and targets.
//!
//! Rights name the *types* of the actor and target they apply to. At check
//! time the engine asks each concrete value whether it is an instance of
//! that type, either directly or through a declared supertype. Identity is
//! nominal (by [`TypeId`]), never structural.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A value that can act, or be acted upon, in an authorization check.
///
/// Implement it with the [`entity!`](crate::entity!) macro rather than by
/// hand:
///
/// ```
/// use warden::{entity, Entity, Kind};
///
/// struct User { id: u32 }
/// struct Admin { user: User }
///
/// entity!(User);
/// entity!(Admin: user => User);
///
/// let admin = Admin { user: User { id: 1 } };
/// let admin: &dyn Entity = &admin;
/// assert!(admin.is(Kind::of::<Admin>()));
/// assert!(admin.is(Kind::of::<User>()));
/// assert_eq!(admin.downcast::<User>().map(|u| u.id), Some(1));
/// ```
pub trait Entity: Any + Send + Sync + 'static {
    /// The concrete value.
    fn as_any(&self) -> &dyn Any;

    /// Short runtime type name, without the module path.
    fn type_name(&self) -> &'static str {
        short_name(std::any::type_name::<Self>())
    }

    /// View this value as one of its declared supertypes.
    ///
    /// Only consulted when `kind` is not the concrete type itself.
    fn upcast(&self, kind: Kind) -> Option<&dyn Any> {
        let _ = kind;
        None
    }
}

impl dyn Entity {
    /// Descriptor of the concrete type.
    pub fn kind(&self) -> Kind {
        Kind {
            id: self.as_any().type_id(),
            name: self.type_name(),
        }
    }

    /// This value seen as an instance of `kind`, if it is one.
    pub fn view(&self, kind: Kind) -> Option<&dyn Any> {
        let any = self.as_any();
        if any.type_id() == kind.id {
            Some(any)
        } else {
            self.upcast(kind)
        }
    }

    /// Whether this value is an instance of `kind` or of one of its subtypes.
    pub fn is(&self, kind: Kind) -> bool {
        self.view(kind).is_some()
    }

    /// Typed view of this value as `T`.
    pub fn downcast<T: Entity>(&self) -> Option<&T> {
        self.view(Kind::of::<T>())?.downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Entity").field(&self.type_name()).finish()
    }
}

/// Runtime descriptor of an [`Entity`] type.
///
/// Equality and hashing only consider the type identity.
#[derive(Clone, Copy)]
pub struct Kind {
    id: TypeId,
    name: &'static str,
}

impl Kind {
    /// Descriptor of `T`.
    pub fn of<T: Entity>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: short_name(std::any::type_name::<T>()),
        }
    }

    /// Short type name, without the module path.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Kind {}

impl Hash for Kind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Kind").field(&self.name).finish()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strip the module path from a `std::any::type_name` string.
///
/// Generic arguments are kept as-is: `a::Wrapper<b::Inner>` becomes
/// `Wrapper<b::Inner>`. Tuples, arrays, slices and references have no
/// leading path and are returned unchanged.
pub(crate) fn short_name(full: &'static str) -> &'static str {
    if full.starts_with(['(', '[', '&', '*']) {
        return full;
    }
    let head = &full[..full.find(['<', '(', '[']).unwrap_or(full.len())];
    match head.rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

/// Implement [`Entity`] for a type.
///
/// `entity!(User)` declares a plain entity. Supertypes are declared by
/// naming the field that holds the supertype value:
/// `entity!(Admin: user => User)`. Supertype chains are followed
/// transitively, so an `Admin` also matches every supertype of `User`.
#[macro_export]
macro_rules! entity {
    ($ty:ty : $($field:tt => $parent:ty),+ $(,)?) => {
        impl $crate::Entity for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn upcast(
                &self,
                kind: $crate::Kind,
            ) -> ::std::option::Option<&dyn ::std::any::Any> {
                $(
                    let parent: &$parent = &self.$field;
                    let parent: &dyn $crate::Entity = parent;
                    if let ::std::option::Option::Some(view) = parent.view(kind) {
                        return ::std::option::Option::Some(view);
                    }
                )+
                ::std::option::Option::None
            }
        }
    };
    ($ty:ty) => {
        impl $crate::Entity for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person {
        name: &'static str,
    }
    struct User {
        person: Person,
    }
    struct Admin {
        user: User,
    }
    struct Team(u32);
    struct Wrapper<T>(T);

    entity!(Person);
    entity!(User: person => Person);
    entity!(Admin: user => User);
    entity!(Team);
    entity!(Wrapper<u8>);
    entity!((Team, Team));

    fn admin() -> Admin {
        Admin {
            user: User {
                person: Person { name: "ada" },
            },
        }
    }

    #[test]
    fn test_kind_equality_is_type_identity() {
        assert_eq!(Kind::of::<User>(), Kind::of::<User>());
        assert_ne!(Kind::of::<User>(), Kind::of::<Admin>());
        assert_eq!(Kind::of::<User>().name(), "User");
        assert_eq!(Kind::of::<Wrapper<u8>>().to_string(), "Wrapper<u8>");
    }

    #[test]
    fn test_is_matches_concrete_type() {
        let team = Team(7);
        let team: &dyn Entity = &team;
        assert!(team.is(Kind::of::<Team>()));
        assert!(!team.is(Kind::of::<User>()));
        assert_eq!(team.kind(), Kind::of::<Team>());
        assert_eq!(team.downcast::<Team>().map(|t| t.0), Some(7));
    }

    #[test]
    fn test_is_follows_supertypes_transitively() {
        let admin = admin();
        let admin: &dyn Entity = &admin;
        assert!(admin.is(Kind::of::<Admin>()));
        assert!(admin.is(Kind::of::<User>()));
        assert!(admin.is(Kind::of::<Person>()));
        assert!(!admin.is(Kind::of::<Team>()));
        assert_eq!(admin.downcast::<Person>().map(|p| p.name), Some("ada"));
    }

    #[test]
    fn test_supertype_does_not_match_subtype() {
        let user = User {
            person: Person { name: "bob" },
        };
        let user: &dyn Entity = &user;
        assert!(!user.is(Kind::of::<Admin>()));
        assert!(user.downcast::<Admin>().is_none());
    }

    #[test]
    fn test_type_name_is_short() {
        let admin = admin();
        let admin: &dyn Entity = &admin;
        assert_eq!(admin.type_name(), "Admin");
        assert_eq!(short_name("a::b::C"), "C");
        assert_eq!(short_name("C"), "C");
        assert_eq!(short_name("a::W<b::C>"), "W<b::C>");
    }

    #[test]
    fn test_type_name_of_compound_types() {
        assert_eq!(short_name("(a::X, b::Y)"), "(a::X, b::Y)");
        assert_eq!(short_name("[a::X; 2]"), "[a::X; 2]");
        assert_eq!(short_name("a::W<(b::X, c::Y)>"), "W<(b::X, c::Y)>");

        let pair = (Team(1), Team(2));
        let pair: &dyn Entity = &pair;
        assert!(pair.type_name().starts_with('('));
        assert!(pair.type_name().ends_with("Team)"));
        assert_eq!(Kind::of::<(Team, Team)>().name(), pair.type_name());
    }
}
