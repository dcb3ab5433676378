//! The authorization engine.

use crate::entity::Entity;
use crate::error::{BoxError, Error, Result};
use crate::right::Right;
use crate::Config;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace, warn};

/// Called when [`Warden::authorize`] denies a request.
///
/// The returned error is what `authorize` fails with; the engine never
/// continues past a denial.
pub type OnNotAuthorized = Arc<dyn Fn(&dyn Entity, &str, &dyn Entity) -> Error + Send + Sync>;

/// Default denial handler: names the actor type, the action and the target
/// type.
pub fn not_authorized(actor: &dyn Entity, action: &str, target: &dyn Entity) -> Error {
    Error::NotAuthorized {
        actor: actor.type_name(),
        action: action.to_string(),
        target: target.type_name(),
    }
}

/// Ordered set of [`Right`]s answering "may this actor do that to this
/// target?".
///
/// Rights are consulted **one by one** in the order they were registered and
/// the first one that fully matches (types, action and condition) grants
/// access. A right whose condition is not met does not stop the scan; later
/// rights are still tried. Register commonly met rights first.
///
/// # Build, then use
///
/// Registration takes `self` or `&mut self`, checks take `&self`. Finish
/// registering before sharing the engine (for example behind an `Arc`); the
/// borrow checker rejects registration while a check is in flight.
///
/// ```
/// use warden::{entity, Warden};
///
/// struct User { id: u32 }
/// struct Post { author: u32 }
/// entity!(User);
/// entity!(Post);
///
/// # futures::executor::block_on(async {
/// let warden = Warden::new()
///     .allow::<User, Post>("see")
///     .allow_if("delete", |user: &User, post: &Post| user.id == post.author);
///
/// let post = Post { author: 1 };
/// assert!(warden.can(&User { id: 1 }, "delete", &post).await?);
/// assert!(warden.cannot(&User { id: 2 }, "delete", &post).await?);
/// assert!(warden.authorize(&User { id: 2 }, "see", &post).await.is_ok());
/// # Ok::<(), warden::Error>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct Warden {
    name: String,
    log_denials: bool,
    rights: Vec<Right>,
    on_not_authorized: OnNotAuthorized,
}

impl Warden {
    /// Create an empty engine with the default denial handler.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create an empty engine with a custom denial handler.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&dyn Entity, &str, &dyn Entity) -> Error + Send + Sync + 'static,
    {
        Self::new().on_not_authorized(handler)
    }

    /// Create an empty engine from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.name.clone(),
            log_denials: config.log_denials,
            rights: Vec::new(),
            on_not_authorized: Arc::new(not_authorized),
        }
    }

    /// Create an engine seeded with already built rights, kept in order.
    pub fn from_rights<F>(rights: impl IntoIterator<Item = Right>, handler: F) -> Self
    where
        F: Fn(&dyn Entity, &str, &dyn Entity) -> Error + Send + Sync + 'static,
    {
        let mut warden = Self::with_handler(handler);
        warden.rights.extend(rights);
        warden
    }

    /// Replace the denial handler while building.
    pub fn on_not_authorized<F>(mut self, handler: F) -> Self
    where
        F: Fn(&dyn Entity, &str, &dyn Entity) -> Error + Send + Sync + 'static,
    {
        self.on_not_authorized = Arc::new(handler);
        self
    }

    /// Append a right after all previously registered ones.
    pub fn register(&mut self, right: Right) -> &mut Self {
        trace!(warden = %self.name, ?right, index = self.rights.len(), "registered right");
        self.rights.push(right);
        self
    }

    /// Allow every `A` to perform `action` on every `T`.
    pub fn allow<A: Entity, T: Entity>(mut self, action: impl Into<String>) -> Self {
        self.register(Right::new::<A, T>(action));
        self
    }

    /// Allow `A` to perform `action` on `T` when `condition` holds.
    pub fn allow_if<A, T, F>(mut self, action: impl Into<String>, condition: F) -> Self
    where
        A: Entity,
        T: Entity,
        F: Fn(&A, &T) -> bool + Send + Sync + 'static,
    {
        self.register(Right::when(action, condition));
        self
    }

    /// Allow `A` to perform `action` on `T` when the asynchronous `condition`
    /// resolves to `true`.
    pub fn allow_if_async<A, T, F>(mut self, action: impl Into<String>, condition: F) -> Self
    where
        A: Entity,
        T: Entity,
        F: for<'a> Fn(&'a A, &'a T) -> BoxFuture<'a, std::result::Result<bool, BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.register(Right::when_async(action, condition));
        self
    }

    /// Engine label from configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `actor` may perform `action` on `target`.
    ///
    /// Denial is `Ok(false)`. The only error is a condition that itself
    /// failed; it is returned unchanged and ends the scan.
    #[instrument(
        level = "debug",
        skip_all,
        fields(
            warden = %self.name,
            actor = actor.type_name(),
            action = action,
            target = target.type_name(),
        )
    )]
    pub async fn can(&self, actor: &dyn Entity, action: &str, target: &dyn Entity) -> Result<bool> {
        for (index, right) in self.rights.iter().enumerate() {
            let verdict = match right.bind(actor, action, target) {
                Some((actor, target)) => right.check_bound(actor, target),
                None => continue,
            };
            if verdict.resolve().await? {
                debug!(index, "granted");
                return Ok(true);
            }
            trace!(index, "condition not met");
        }

        debug!("denied: no right matched");
        Ok(false)
    }

    /// The opposite of [`can`](Self::can).
    pub async fn cannot(
        &self,
        actor: &dyn Entity,
        action: &str,
        target: &dyn Entity,
    ) -> Result<bool> {
        Ok(!self.can(actor, action, target).await?)
    }

    /// Like [`can`](Self::can), but a denial fails with the error built by
    /// the denial handler.
    pub async fn authorize(
        &self,
        actor: &dyn Entity,
        action: &str,
        target: &dyn Entity,
    ) -> Result<()> {
        if self.can(actor, action, target).await? {
            return Ok(());
        }

        if self.log_denials {
            warn!(
                warden = %self.name,
                actor = actor.type_name(),
                action,
                target = target.type_name(),
                "not authorized"
            );
        } else {
            debug!(
                warden = %self.name,
                actor = actor.type_name(),
                action,
                target = target.type_name(),
                "not authorized"
            );
        }
        Err((self.on_not_authorized)(actor, action, target))
    }
}

impl Default for Warden {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Warden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Warden")
            .field("name", &self.name)
            .field("log_denials", &self.log_denials)
            .field("rights", &self.rights)
            .finish_non_exhaustive()
    }
}
