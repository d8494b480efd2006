// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Instant;

/// Position bookkeeping for a stream that advances on its own clock.
///
/// The position is `anchor_position + elapsed * rate` while playing, clamped
/// to `[0, duration]` once the duration is known. Every state change
/// re-anchors at the current position so rate changes never jump.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    anchor_position: f64,
    anchor_instant:  Option<Instant>,
    rate:            f64,
    duration:        Option<f64>,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            anchor_position: 0.0,
            anchor_instant:  None,
            rate:            1.0,
            duration:        None,
        }
    }
}

impl PlaybackClock {
    pub fn new() -> Self { Self::default() }

    pub const fn is_playing(&self) -> bool { self.anchor_instant.is_some() }

    pub const fn rate(&self) -> f64 { self.rate }

    pub const fn duration(&self) -> Option<f64> { self.duration }

    pub fn position(&self, now: Instant) -> f64 {
        let raw = match self.anchor_instant {
            Some(started) => {
                let elapsed = now.saturating_duration_since(started).as_secs_f64();
                self.anchor_position + elapsed * self.rate
            }
            None => self.anchor_position,
        };
        self.clamp(raw)
    }

    /// Whether a playing clock has run past the known duration.
    pub fn ended(&self, now: Instant) -> bool {
        self.duration
            .is_some_and(|d| self.is_playing() && self.position(now) >= d)
    }

    pub fn play(&mut self, now: Instant) {
        if self.is_playing() {
            return;
        }
        if self.duration.is_some_and(|d| self.anchor_position >= d) {
            // Playing an ended stream restarts it.
            self.anchor_position = 0.0;
        }
        self.anchor_instant = Some(now);
    }

    pub fn pause(&mut self, now: Instant) {
        if !self.is_playing() {
            return;
        }
        self.anchor_position = self.position(now);
        self.anchor_instant = None;
    }

    pub fn seek(&mut self, seconds: f64, now: Instant) {
        self.anchor_position = self.clamp(seconds);
        if self.is_playing() {
            self.anchor_instant = Some(now);
        }
    }

    pub fn set_rate(&mut self, rate: f64, now: Instant) {
        self.rebase(now);
        self.rate = rate;
    }

    /// Records the stream duration once metadata is known.
    pub fn set_duration(&mut self, duration: Option<f64>, now: Instant) {
        self.duration = duration.filter(|d| d.is_finite() && *d >= 0.0);
        self.anchor_position = self.clamp(self.anchor_position);
        if self.is_playing() {
            self.anchor_instant = Some(now);
        }
    }

    fn rebase(&mut self, now: Instant) {
        if self.is_playing() {
            self.anchor_position = self.position(now);
            self.anchor_instant = Some(now);
        }
    }

    fn clamp(&self, seconds: f64) -> f64 {
        let lower = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.duration.map_or(lower, |d| lower.min(d))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn advances_with_rate_while_playing() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.play(t0);
        assert!((clock.position(t0 + Duration::from_secs(4)) - 4.0).abs() < 1e-9);

        clock.set_rate(2.0, t0 + Duration::from_secs(4));
        let pos = clock.position(t0 + Duration::from_secs(6));
        assert!((pos - 8.0).abs() < 1e-9);
    }

    #[test]
    fn pause_freezes_and_is_idempotent() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.play(t0);
        clock.pause(t0 + Duration::from_secs(3));
        clock.pause(t0 + Duration::from_secs(9));
        assert!(!clock.is_playing());
        assert!((clock.position(t0 + Duration::from_secs(60)) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn seek_clamps_to_known_duration() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.set_duration(Some(30.0), t0);
        clock.seek(100.0, t0);
        assert!((clock.position(t0) - 30.0).abs() < 1e-9);
        clock.seek(-5.0, t0);
        assert!(clock.position(t0).abs() < 1e-9);
    }

    #[test]
    fn playing_past_end_reports_ended_and_restarts() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.set_duration(Some(10.0), t0);
        clock.play(t0);
        let later = t0 + Duration::from_secs(12);
        assert!(clock.ended(later));
        assert!((clock.position(later) - 10.0).abs() < 1e-9);

        clock.pause(later);
        clock.play(later);
        assert!(clock.position(later).abs() < 1e-9);
    }
}
