//! UI effects and audio cues.

use std::fmt;

use serde::Serialize;

use crate::cache::QueryKind;
use crate::domain::{Auction, Trade, TradeId};
use crate::error::ClientError;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information.
    Info,
    /// Something good happened.
    Success,
    /// Something needs attention.
    Warning,
    /// Something failed.
    Error,
}

/// A short sound played by the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    /// Dice rolled.
    Dice,
    /// Something arrived for the local user.
    Notification,
    /// It is now the local user's turn.
    YourTurn,
    /// Money arrived.
    Cash,
    /// Bad outcome.
    Fail,
    /// Good outcome.
    Success,
    /// Roulette spinning.
    Roulette,
}

impl AudioCue {
    /// Asset path served by the web app.
    #[must_use]
    pub const fn asset(self) -> &'static str {
        match self {
            Self::Dice => "/dice.mp3",
            Self::Notification | Self::YourTurn => "/notification.mp3",
            Self::Cash => "/cash.mp3",
            Self::Fail => "/fail.mp3",
            Self::Success => "/success.mp3",
            Self::Roulette => "/roullette.mp3",
        }
    }
}

impl fmt::Display for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dice => "dice",
            Self::Notification => "notification",
            Self::YourTurn => "your_turn",
            Self::Cash => "cash",
            Self::Fail => "fail",
            Self::Success => "success",
            Self::Roulette => "roulette",
        };
        f.write_str(name)
    }
}

/// One thing the view should do in response to an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum UiEffect {
    /// Show a transient message.
    Toast {
        /// Text.
        message: String,
        /// Severity.
        severity: Severity,
    },
    /// Play a sound.
    Play {
        /// Cue.
        cue: AudioCue,
    },
    /// Open the auction modal.
    ShowAuction {
        /// The running auction.
        auction: Auction,
    },
    /// Close the auction modal.
    ClearAuction,
    /// Open the incoming-trade modal.
    ShowIncomingTrade {
        /// The pending offer.
        trade: Trade,
    },
    /// Close the incoming-trade modal showing this trade.
    ClearIncomingTrade {
        /// Trade that was displayed.
        trade_id: TradeId,
    },
    /// Mark a cached view of the current game stale.
    Invalidate {
        /// View.
        kind: QueryKind,
    },
    /// The game ended; the results screen has not been seen yet.
    ResetResultsViewed,
}

impl UiEffect {
    /// Shorthand for an info toast.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::Toast {
            message: message.into(),
            severity: Severity::Info,
        }
    }
}

/// Plays audio cues.
///
/// Playback can fail for reasons outside the client's control (no device,
/// autoplay blocked). Failures are logged by [`play_cue`] and never
/// surfaced.
pub trait AudioSink: Send + Sync {
    /// Plays `cue`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AudioPlayback`] if the cue could not be played.
    fn play(&self, cue: AudioCue) -> Result<(), ClientError>;
}

/// Plays `cue` on `sink`, logging and swallowing any failure.
pub fn play_cue(sink: &dyn AudioSink, cue: AudioCue) {
    if let Err(e) = sink.play(cue) {
        tracing::debug!(%cue, error = %e, "audio cue failed");
    }
}

/// Sink that only logs the cue. Used by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAudioSink;

impl AudioSink for LogAudioSink {
    fn play(&self, cue: AudioCue) -> Result<(), ClientError> {
        tracing::info!(%cue, asset = cue.asset(), "audio cue");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Blocked(AtomicUsize);

    impl AudioSink for Blocked {
        fn play(&self, _cue: AudioCue) -> Result<(), ClientError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::AudioPlayback("autoplay blocked".to_string()))
        }
    }

    #[test]
    fn playback_failure_is_swallowed() {
        let sink = Blocked(AtomicUsize::new(0));
        play_cue(&sink, AudioCue::Cash);
        assert_eq!(sink.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn effects_serialize_with_a_tag() {
        let json = serde_json::to_value(UiEffect::Invalidate {
            kind: QueryKind::Trades,
        })
        .ok();
        assert_eq!(
            json.as_ref().and_then(|v| v.get("effect")).and_then(|v| v.as_str()),
            Some("invalidate")
        );
    }

    #[test]
    fn cue_assets() {
        assert_eq!(AudioCue::Roulette.asset(), "/roullette.mp3");
        assert_eq!(AudioCue::YourTurn.to_string(), "your_turn");
    }
}
