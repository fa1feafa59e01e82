//! Ephemeral playback state for the animation player panel.
//!
//! This is purely local UI state layered on top of a completed animation's
//! derived media URL. It is deliberately separate from `Animation.status`
//! (the server-side rendering state) and resets freely whenever the
//! selection changes.

use std::time::Duration;

use chalkboard_core::{Animation, AnimationStatus};

/// Transport-control state for one selected animation
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Whether playback is currently advancing
    pub playing: bool,
    /// Whether audio is muted
    pub muted: bool,
    /// Current position in seconds
    pub position: f64,
    /// Total duration in seconds (0.0 when the server has not reported one)
    pub duration: f64,
}

impl PlayerState {
    /// Fresh state for an animation; only completed animations are playable
    pub fn for_animation(animation: &Animation) -> Self {
        Self {
            playing: false,
            muted: false,
            position: 0.0,
            duration: match animation.status {
                AnimationStatus::Completed => animation.duration.unwrap_or(0.0),
                _ => 0.0,
            },
        }
    }

    pub fn idle() -> Self {
        Self {
            playing: false,
            muted: false,
            position: 0.0,
            duration: 0.0,
        }
    }

    pub fn toggle_play(&mut self) {
        // Pressing play at the end restarts from the top
        if !self.playing && self.duration > 0.0 && self.position >= self.duration {
            self.position = 0.0;
        }
        self.playing = !self.playing;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn restart(&mut self) {
        self.position = 0.0;
    }

    /// Seek relative to the current position, clamped to the video bounds
    pub fn seek_by(&mut self, secs: f64) {
        self.position = (self.position + secs).clamp(0.0, self.duration);
    }

    /// Advance the position while playing; stops at the end
    pub fn tick(&mut self, elapsed: Duration) {
        if !self.playing {
            return;
        }
        self.position += elapsed.as_secs_f64();
        if self.position >= self.duration {
            self.position = self.duration;
            self.playing = false;
        }
    }

    /// Playback progress in 0.0..=1.0 for the gauge widget
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            0.0
        } else {
            (self.position / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Format seconds as `m:ss` for the time display
pub fn format_time(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(9.4), "0:09");
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn test_seek_is_clamped() {
        let mut player = PlayerState {
            playing: false,
            muted: false,
            position: 2.0,
            duration: 10.0,
        };
        player.seek_by(-5.0);
        assert_eq!(player.position, 0.0);
        player.seek_by(25.0);
        assert_eq!(player.position, 10.0);
    }

    #[test]
    fn test_tick_stops_at_end() {
        let mut player = PlayerState {
            playing: true,
            muted: false,
            position: 9.5,
            duration: 10.0,
        };
        player.tick(Duration::from_secs(2));
        assert_eq!(player.position, 10.0);
        assert!(!player.playing);
    }

    #[test]
    fn test_play_after_end_restarts() {
        let mut player = PlayerState {
            playing: false,
            muted: false,
            position: 10.0,
            duration: 10.0,
        };
        player.toggle_play();
        assert!(player.playing);
        assert_eq!(player.position, 0.0);
    }
}
