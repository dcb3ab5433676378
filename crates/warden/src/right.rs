//! A single authorization rule.

use crate::entity::{Entity, Kind};
use crate::error::{BoxError, Error, Result};
use futures::future::BoxFuture;
use futures::{FutureExt, TryFutureExt};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Grants actors of one type the right to perform an action on targets of
/// another type, optionally gated by a condition.
///
/// A `Right` is immutable once built. Cloning is cheap: the condition is
/// shared.
#[derive(Clone)]
pub struct Right {
    actor: Kind,
    action: String,
    target: Kind,
    condition: Option<Arc<dyn Condition>>,
}

impl Right {
    /// Unconditional right for `A` to perform `action` on `T`.
    pub fn new<A: Entity, T: Entity>(action: impl Into<String>) -> Self {
        Self {
            actor: Kind::of::<A>(),
            action: action.into(),
            target: Kind::of::<T>(),
            condition: None,
        }
    }

    /// Right gated by a synchronous predicate.
    pub fn when<A, T, F>(action: impl Into<String>, condition: F) -> Self
    where
        A: Entity,
        T: Entity,
        F: Fn(&A, &T) -> bool + Send + Sync + 'static,
    {
        Self::try_when(action, move |actor: &A, target: &T| {
            Ok::<_, BoxError>(condition(actor, target))
        })
    }

    /// Right gated by a synchronous predicate that may fail.
    ///
    /// A failure aborts the whole check and reaches the caller unchanged.
    pub fn try_when<A, T, F, E>(action: impl Into<String>, condition: F) -> Self
    where
        A: Entity,
        T: Entity,
        F: Fn(&A, &T) -> std::result::Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let predicate = Predicate {
            f: move |actor: &A, target: &T| -> std::result::Result<bool, BoxError> {
                condition(actor, target).map_err(Into::into)
            },
            _types: PhantomData,
        };
        Self::new::<A, T>(action).with_condition(Arc::new(predicate))
    }

    /// Right gated by an asynchronous predicate.
    ///
    /// ```
    /// use futures::FutureExt;
    /// use warden::{entity, Right};
    ///
    /// struct User { id: u32 }
    /// struct Doc { owner: u32 }
    /// entity!(User);
    /// entity!(Doc);
    ///
    /// let right = Right::when_async::<User, Doc, _>("edit", |user, doc| {
    ///     async move { Ok(user.id == doc.owner) }.boxed()
    /// });
    /// assert_eq!(right.action(), "edit");
    /// ```
    pub fn when_async<A, T, F>(action: impl Into<String>, condition: F) -> Self
    where
        A: Entity,
        T: Entity,
        F: for<'a> Fn(&'a A, &'a T) -> BoxFuture<'a, std::result::Result<bool, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        let predicate = AsyncPredicate {
            f: condition,
            _types: PhantomData,
        };
        Self::new::<A, T>(action).with_condition(Arc::new(predicate))
    }

    fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Action name, compared by exact equality.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Whether a condition gates this right.
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    /// Whether actor type, action and target type all line up.
    ///
    /// The condition is not consulted.
    pub fn matches(&self, actor: &dyn Entity, action: &str, target: &dyn Entity) -> bool {
        self.bind(actor, action, target).is_some()
    }

    /// Evaluate the condition for a concrete actor and target.
    ///
    /// An absent condition is satisfied. Values of the wrong types never
    /// satisfy a condition.
    pub fn check<'a>(&'a self, actor: &'a dyn Entity, target: &'a dyn Entity) -> Verdict<'a> {
        match (actor.view(self.actor), target.view(self.target)) {
            (Some(actor), Some(target)) => self.check_bound(actor, target),
            _ => Verdict::Ready(Ok(false)),
        }
    }

    /// Typed views of actor and target, tested cheapest first: actor type,
    /// then action, then target type.
    pub(crate) fn bind<'a>(
        &self,
        actor: &'a dyn Entity,
        action: &str,
        target: &'a dyn Entity,
    ) -> Option<(&'a dyn Any, &'a dyn Any)> {
        let actor = actor.view(self.actor)?;
        if action != self.action {
            return None;
        }
        let target = target.view(self.target)?;
        Some((actor, target))
    }

    pub(crate) fn check_bound<'a>(&'a self, actor: &'a dyn Any, target: &'a dyn Any) -> Verdict<'a> {
        match &self.condition {
            Some(condition) => condition.check(actor, target),
            None => Verdict::Ready(Ok(true)),
        }
    }
}

impl fmt::Debug for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Right")
            .field("actor", &self.actor)
            .field("action", &self.action)
            .field("target", &self.target)
            .field("conditional", &self.is_conditional())
            .finish()
    }
}

/// Outcome of a condition: known now, or still to be awaited.
pub enum Verdict<'a> {
    Ready(Result<bool>),
    Pending(BoxFuture<'a, Result<bool>>),
}

impl Verdict<'_> {
    /// Wait for the outcome.
    pub async fn resolve(self) -> Result<bool> {
        match self {
            Verdict::Ready(result) => result,
            Verdict::Pending(future) => future.await,
        }
    }
}

impl fmt::Debug for Verdict<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Verdict::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Type-erased condition over already-matched actor and target views.
trait Condition: Send + Sync {
    fn check<'a>(&'a self, actor: &'a dyn Any, target: &'a dyn Any) -> Verdict<'a>;
}

struct Predicate<A, T, F> {
    f: F,
    _types: PhantomData<fn(&A, &T)>,
}

impl<A, T, F> Condition for Predicate<A, T, F>
where
    A: Entity,
    T: Entity,
    F: Fn(&A, &T) -> std::result::Result<bool, BoxError> + Send + Sync,
{
    fn check<'a>(&'a self, actor: &'a dyn Any, target: &'a dyn Any) -> Verdict<'a> {
        match (actor.downcast_ref::<A>(), target.downcast_ref::<T>()) {
            (Some(actor), Some(target)) => {
                Verdict::Ready((self.f)(actor, target).map_err(Error::Condition))
            }
            _ => Verdict::Ready(Ok(false)),
        }
    }
}

struct AsyncPredicate<A, T, F> {
    f: F,
    _types: PhantomData<fn(&A, &T)>,
}

impl<A, T, F> Condition for AsyncPredicate<A, T, F>
where
    A: Entity,
    T: Entity,
    F: for<'a> Fn(&'a A, &'a T) -> BoxFuture<'a, std::result::Result<bool, BoxError>>
        + Send
        + Sync,
{
    fn check<'a>(&'a self, actor: &'a dyn Any, target: &'a dyn Any) -> Verdict<'a> {
        match (actor.downcast_ref::<A>(), target.downcast_ref::<T>()) {
            (Some(actor), Some(target)) => {
                Verdict::Pending((self.f)(actor, target).map_err(Error::Condition).boxed())
            }
            _ => Verdict::Ready(Ok(false)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity;
    use futures::executor::block_on;

    struct User {
        id: u32,
    }
    struct Admin {
        user: User,
    }
    struct Post {
        author: u32,
    }

    entity!(User);
    entity!(Admin: user => User);
    entity!(Post);

    #[derive(Debug, thiserror::Error)]
    #[error("lookup failed")]
    struct LookupFailed;

    #[test]
    fn test_matches_checks_types_and_action() {
        let right = Right::new::<User, Post>("see");
        let user = User { id: 1 };
        let post = Post { author: 2 };

        assert!(right.matches(&user, "see", &post));
        assert!(!right.matches(&user, "delete", &post));
        assert!(!right.matches(&post, "see", &user));
        assert!(!right.matches(&user, "See", &post));
    }

    #[test]
    fn test_matches_subtype_actor() {
        let right = Right::new::<User, Post>("see");
        let admin = Admin {
            user: User { id: 1 },
        };
        assert!(right.matches(&admin, "see", &Post { author: 1 }));

        let admin_only = Right::new::<Admin, Post>("see");
        assert!(!admin_only.matches(&User { id: 1 }, "see", &Post { author: 1 }));
    }

    #[test]
    fn test_unconditional_check_is_ready_true() {
        let right = Right::new::<User, Post>("see");
        let verdict = right.check(&User { id: 1 }, &Post { author: 2 });
        assert!(matches!(verdict, Verdict::Ready(Ok(true))));
        assert!(!right.is_conditional());
    }

    #[test]
    fn test_sync_condition() {
        let right = Right::when("delete", |user: &User, post: &Post| user.id == post.author);
        assert!(right.is_conditional());

        let owner = right.check(&User { id: 1 }, &Post { author: 1 });
        assert!(matches!(owner, Verdict::Ready(Ok(true))));
        let stranger = right.check(&User { id: 2 }, &Post { author: 1 });
        assert!(matches!(stranger, Verdict::Ready(Ok(false))));
    }

    #[test]
    fn test_condition_sees_supertype_view() {
        let right = Right::when("delete", |user: &User, post: &Post| user.id == post.author);
        let admin = Admin {
            user: User { id: 3 },
        };
        let verdict = block_on(right.check(&admin, &Post { author: 3 }).resolve());
        assert!(verdict.unwrap());
    }

    #[test]
    fn test_check_with_wrong_types_is_false() {
        let right = Right::when("delete", |_: &User, _: &Post| true);
        let verdict = right.check(&Post { author: 1 }, &User { id: 1 });
        assert!(matches!(verdict, Verdict::Ready(Ok(false))));
    }

    #[test]
    fn test_try_when_failure_propagates() {
        let right = Right::try_when("see", |_: &User, _: &Post| Err::<bool, _>(LookupFailed));
        let err = block_on(right.check(&User { id: 1 }, &Post { author: 1 }).resolve())
            .unwrap_err();
        assert_eq!(err.to_string(), "lookup failed");
        assert!(matches!(err, Error::Condition(_)));
    }

    #[test]
    fn test_async_condition_is_pending() {
        let right = Right::when_async::<User, Post, _>("edit", |user, post| {
            async move { Ok(user.id == post.author) }.boxed()
        });
        let user = User { id: 5 };
        let post = Post { author: 5 };

        let verdict = right.check(&user, &post);
        assert!(matches!(verdict, Verdict::Pending(_)));
        assert!(block_on(verdict.resolve()).unwrap());
    }

    #[test]
    fn test_debug_output() {
        let right = Right::new::<User, Post>("see");
        assert_eq!(
            format!("{right:?}"),
            "Right { actor: Kind(\"User\"), action: \"see\", target: Kind(\"Post\"), conditional: false }"
        );
    }
}
