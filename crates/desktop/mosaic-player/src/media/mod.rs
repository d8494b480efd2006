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

//! Media stream capability.
//!
//! The group controller only ever talks to [`MediaHandle`]. Load and decode
//! failures never travel through its methods; each handle reports them
//! through its own [`ErrorSink`], scoped to that one stream.

mod clock;
mod stream;

use std::sync::Arc;

pub use clock::PlaybackClock;
use num_enum::{IntoPrimitive, TryFromPrimitive};
pub use stream::{StreamPlayer, stream_locator};

/// Control surface of one renderable media stream.
///
/// Every request is fire-and-forget: the underlying resource applies it on
/// its own clock and reports failures through its error channel.
pub trait MediaHandle: Send + Sync {
    /// Requests playback to resume.
    fn play(&self);

    /// Requests playback to suspend. Pausing a paused stream is a no-op.
    fn pause(&self);

    /// Requests a move to `seconds`. Positions past the end are clamped by
    /// the resource.
    fn seek(&self, seconds: f64);

    /// Requests a playback speed multiplier.
    fn set_rate(&self, rate: f64);

    /// Last known position in seconds, `0.0` until metadata has loaded.
    fn current_time(&self) -> f64;
}

/// Standard media error codes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    strum_macros::Display,
    strum_macros::AsRefStr,
)]
#[repr(u16)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaErrorCode {
    /// The fetch or a request was aborted.
    #[strum(serialize = "MEDIA_ERR_ABORTED")]
    Aborted         = 1,
    /// A network error prevented the resource from loading.
    #[strum(serialize = "MEDIA_ERR_NETWORK")]
    Network         = 2,
    /// The resource loaded but could not be decoded.
    #[strum(serialize = "MEDIA_ERR_DECODE")]
    Decode          = 3,
    /// The locator or its content type is not supported.
    #[strum(serialize = "MEDIA_ERR_SRC_NOT_SUPPORTED")]
    SrcNotSupported = 4,
}

/// A load or decode failure scoped to a single stream.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("stream {slot}: {code} ({}): {message}", u16::from(*code))]
pub struct StreamError {
    pub slot:    usize,
    pub code:    MediaErrorCode,
    pub message: String,
}

impl StreamError {
    pub fn new(slot: usize, code: MediaErrorCode, message: impl Into<String>) -> Self {
        Self {
            slot,
            code,
            message: message.into(),
        }
    }
}

impl std::error::Error for StreamError {}

/// Per-stream error channel.
pub type ErrorSink = Arc<dyn Fn(StreamError) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_numbering() {
        assert_eq!(u16::from(MediaErrorCode::Network), 2);
        assert_eq!(
            MediaErrorCode::try_from(4_u16).unwrap(),
            MediaErrorCode::SrcNotSupported
        );
        assert!(MediaErrorCode::try_from(9_u16).is_err());
    }

    #[test]
    fn stream_error_display() {
        let err = StreamError::new(3, MediaErrorCode::Decode, "bad frame");
        assert_eq!(err.to_string(), "stream 3: MEDIA_ERR_DECODE (3): bad frame");
    }
}
