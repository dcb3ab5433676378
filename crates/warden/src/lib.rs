//! In-process authorization: declare who may do what to whom, then ask.
//!
//! A [`Warden`] holds an ordered list of [`Right`]s. Each right names an
//! actor type, an action and a target type, and may carry a condition over
//! the concrete actor and target. A check walks the rights in registration
//! order and grants access on the first right that fully matches.
//!
//! # Core Concepts
//!
//! ## Entity
//!
//! Actors and targets implement [`Entity`], usually through the
//! [`entity!`] macro. Types are matched nominally by [`Kind`]; a type may
//! declare supertypes so that, for example, an `Admin` matches rights
//! written for `User`.
//!
//! ## Right
//!
//! A [`Right`] is unconditional, or gated by a synchronous or asynchronous
//! condition. A condition that fails (rather than answering `false`) aborts
//! the check and its error reaches the caller unchanged.
//!
//! ## Checks
//!
//! - [`Warden::can`] answers `true` or `false`.
//! - [`Warden::cannot`] is its negation.
//! - [`Warden::authorize`] fails with the error built by the denial handler
//!   when access is denied.
//!
//! # Example
//!
//! ```
//! use warden::{entity, Warden};
//!
//! struct User { id: String }
//! struct Doc { id: String }
//! entity!(User);
//! entity!(Doc);
//!
//! # futures::executor::block_on(async {
//! let warden = Warden::new()
//!     .allow::<User, Doc>("see")
//!     .allow_if("delete", |user: &User, doc: &Doc| user.id == doc.id);
//!
//! let doc = Doc { id: "1".into() };
//! let owner = User { id: "1".into() };
//! let other = User { id: "2".into() };
//!
//! assert!(warden.can(&owner, "delete", &doc).await?);
//! assert!(!warden.can(&other, "delete", &doc).await?);
//! assert!(warden.can(&other, "see", &doc).await?);
//! assert!(!warden.can(&owner, "open", &doc).await?);
//!
//! let err = warden.authorize(&other, "delete", &doc).await.unwrap_err();
//! assert_eq!(err.to_string(), "User is not allowed to delete Doc.");
//! # Ok::<(), warden::Error>(())
//! # }).unwrap();
//! ```

mod config;
mod entity;
mod error;
mod right;
mod warden;

pub use config::Config;
pub use entity::{Entity, Kind};
pub use error::{BoxError, Error, Result};
pub use right::{Right, Verdict};
pub use warden::{OnNotAuthorized, Warden, not_authorized};
