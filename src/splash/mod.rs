//! Splash-screen lifecycle and presentation
//!
//! The presentation side of startup: the [`LifecycleGate`] that keeps the
//! splash visible until both the minimum-duration timer and the finish
//! request have fired, the bounce animation for indeterminate progress, and
//! the console splash screen itself.

pub mod animation;
pub mod gate;
pub mod screen;

pub use animation::BounceRamp;
pub use gate::{FinishStatus, GatePhase, LifecycleGate};
pub use screen::{ProgressMode, SplashScreen};
