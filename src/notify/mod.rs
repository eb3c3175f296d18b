//! Notifications driven by the event stream.
//!
//! Turns dispatched events into toasts, audio cues and modal state. The
//! effects are data ([`UiEffect`]); rendering them is up to the view.

pub mod clock;
pub mod coordinator;
pub mod effects;

pub use clock::SessionClock;
pub use coordinator::{
    CachedSnapshot, CoordinatorHandler, GameSnapshot, NotificationCoordinator, SnapshotSource,
};
pub use effects::{AudioCue, AudioSink, LogAudioSink, Severity, UiEffect, play_cue};
