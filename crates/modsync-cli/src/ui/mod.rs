//! Terminal rendering.
//!
//! Everything printed to stdout goes through a single [`actor::UiActor`]
//! thread, so concurrent download tasks never interleave partial lines.

pub mod actor;
pub mod output;
pub mod theme;

pub use actor::UiActor;
pub use output::Output;
pub use theme::Theme;
