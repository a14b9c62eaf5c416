//! Gated workflows shared by the event portal.
//!
//! Every workflow follows the same layering: `domain` types, a pure transition module, a
//! repository trait, a service composing guards and storage, and an axum router.

pub mod actors;
pub mod errors;
pub mod judging;
pub mod memory;
pub mod mentoring;
pub mod notifications;
pub mod participation;

pub use actors::UserId;
pub use errors::{RepositoryError, WorkflowErrorKind};
pub use notifications::{Notification, NotificationError, NotificationPublisher};
