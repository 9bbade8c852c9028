//! Alarm audio seam and the single active-sound slot.
//!
//! # Invariants
//! - At most one sound handle is active.
//! - A new playback always stops the previous handle first.
//! - Playback failures are logged and never propagate to the ring.

use crate::model::alarm::AlarmSound;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SoundHandle = u64;

/// Platform-reported playback failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioError(pub String);

impl Display for AudioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "audio error: {}", self.0)
    }
}

impl Error for AudioError {}

pub trait AudioPlayer: Send {
    fn play(&mut self, sound: AlarmSound, looping: bool) -> Result<SoundHandle, AudioError>;
    fn stop(&mut self, handle: SoundHandle) -> Result<(), AudioError>;
}

/// Player for hosts without audio output.
#[derive(Debug, Default)]
pub struct SilentAudio {
    next_handle: SoundHandle,
}

impl AudioPlayer for SilentAudio {
    fn play(&mut self, _sound: AlarmSound, _looping: bool) -> Result<SoundHandle, AudioError> {
        self.next_handle += 1;
        Ok(self.next_handle)
    }

    fn stop(&mut self, _handle: SoundHandle) -> Result<(), AudioError> {
        Ok(())
    }
}

pub(crate) struct SoundSlot {
    player: Box<dyn AudioPlayer>,
    active: Option<SoundHandle>,
}

impl SoundSlot {
    pub(crate) fn new(player: Box<dyn AudioPlayer>) -> Self {
        Self {
            player,
            active: None,
        }
    }

    pub(crate) fn active(&self) -> Option<SoundHandle> {
        self.active
    }

    /// Stops whatever is playing, then starts `sound`.
    pub(crate) fn swap(&mut self, sound: AlarmSound, looping: bool) -> Option<SoundHandle> {
        self.stop();
        match self.player.play(sound, looping) {
            Ok(handle) => {
                debug!(
                    "event=audio_play module=scheduler status=ok sound={} handle={} looping={}",
                    sound, handle, looping
                );
                self.active = Some(handle);
                Some(handle)
            }
            Err(err) => {
                warn!(
                    "event=audio_play module=scheduler status=error sound={} error={}",
                    sound, err
                );
                None
            }
        }
    }

    pub(crate) fn stop(&mut self) {
        let Some(handle) = self.active.take() else {
            return;
        };
        if let Err(err) = self.player.stop(handle) {
            warn!(
                "event=audio_stop module=scheduler status=error handle={} error={}",
                handle, err
            );
        }
    }

    /// Drops a handle that finished on its own, without issuing a stop.
    pub(crate) fn forget(&mut self, handle: SoundHandle) -> bool {
        if self.active == Some(handle) {
            self.active = None;
            return true;
        }
        false
    }
}
