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

//! HTTP-served stream handle.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use reqwest::{StatusCode, Url, header};
use tracing::{debug, info, warn};

use super::{ErrorSink, MediaErrorCode, MediaHandle, PlaybackClock, StreamError};
use crate::err::{InvalidLocatorSnafu, Result};

/// Non-standard header some media servers use to announce the duration in
/// seconds.
const CONTENT_DURATION: &str = "x-content-duration";

/// Builds `<base>/video?filename=<name>.mp4`.
pub fn stream_locator(base: &str, name: &str) -> Result<Url> {
    let invalid = |message: String| {
        InvalidLocatorSnafu {
            base,
            name,
            message,
        }
        .build()
    };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("base url cannot carry a path".to_string()))?
        .pop_if_empty()
        .push("video");
    url.query_pairs_mut()
        .clear()
        .append_pair("filename", &format!("{name}.mp4"));
    Ok(url)
}

#[derive(Debug, Clone)]
enum LoadState {
    Pending,
    Ready,
    Failed(StreamError),
}

#[derive(Debug)]
struct StreamState {
    clock: PlaybackClock,
    load:  LoadState,
}

/// One video stream addressed by URL.
///
/// The byte stream itself is decoded elsewhere; this handle probes the
/// locator, keeps the transport state on a [`PlaybackClock`] and reports
/// failures through its own sink.
pub struct StreamPlayer {
    slot:          usize,
    locator:       Url,
    client:        reqwest::Client,
    probe_timeout: Duration,
    state:         Mutex<StreamState>,
    sink:          ErrorSink,
}

impl std::fmt::Debug for StreamPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamPlayer")
            .field("slot", &self.slot)
            .field("locator", &self.locator.as_str())
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl StreamPlayer {
    pub fn new(
        slot: usize,
        locator: Url,
        client: reqwest::Client,
        probe_timeout: Duration,
        sink: ErrorSink,
    ) -> Self {
        Self {
            slot,
            locator,
            client,
            probe_timeout,
            state: Mutex::new(StreamState {
                clock: PlaybackClock::new(),
                load:  LoadState::Pending,
            }),
            sink,
        }
    }

    pub const fn slot(&self) -> usize { self.slot }

    pub const fn locator(&self) -> &Url { &self.locator }

    pub fn is_loaded(&self) -> bool { matches!(self.state.lock().load, LoadState::Ready) }

    pub fn is_playing(&self) -> bool { self.state.lock().clock.is_playing() }

    pub fn rate(&self) -> f64 { self.state.lock().clock.rate() }

    pub fn duration(&self) -> Option<f64> { self.state.lock().clock.duration() }

    /// Whether a loaded stream has played past its known duration.
    pub fn has_ended(&self) -> bool {
        let state = self.state.lock();
        matches!(state.load, LoadState::Ready) && state.clock.ended(Instant::now())
    }

    pub fn load_error(&self) -> Option<StreamError> {
        match &self.state.lock().load {
            LoadState::Failed(err) => Some(err.clone()),
            LoadState::Pending | LoadState::Ready => None,
        }
    }

    /// Probes the locator and records the metadata, or reports the failure.
    #[tracing::instrument(level = "debug", skip(self), fields(slot = self.slot, locator = %self.locator))]
    pub async fn load(&self) {
        match self.probe().await {
            Ok(duration) => self.mark_ready(duration),
            Err(err) => self.fail(err),
        }
    }

    /// Metadata is available; the position becomes meaningful from here on.
    pub fn mark_ready(&self, duration: Option<f64>) {
        let mut state = self.state.lock();
        state.clock.set_duration(duration, Instant::now());
        state.load = LoadState::Ready;
        info!(slot = self.slot, ?duration, "stream metadata loaded");
    }

    /// Records a load failure and reports it.
    pub fn fail(&self, err: StreamError) {
        {
            let mut state = self.state.lock();
            state.clock.pause(Instant::now());
            state.load = LoadState::Failed(err.clone());
        }
        self.report(err);
    }

    async fn probe(&self) -> std::result::Result<Option<f64>, StreamError> {
        let response = self
            .client
            .get(self.locator.clone())
            .header(header::RANGE, "bytes=0-0")
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| {
                let code = if e.is_builder() {
                    MediaErrorCode::SrcNotSupported
                } else {
                    MediaErrorCode::Network
                };
                StreamError::new(self.slot, code, e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
            return Err(StreamError::new(
                self.slot,
                MediaErrorCode::SrcNotSupported,
                format!("server answered {status}"),
            ));
        }
        if !status.is_success() {
            return Err(StreamError::new(
                self.slot,
                MediaErrorCode::Network,
                format!("server answered {status}"),
            ));
        }

        let headers = response.headers();
        if let Some(content_type) = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            let playable = content_type.starts_with("video/")
                || content_type.starts_with("application/octet-stream");
            if !playable {
                return Err(StreamError::new(
                    self.slot,
                    MediaErrorCode::SrcNotSupported,
                    format!("unsupported content type {content_type}"),
                ));
            }
        }

        Ok(headers
            .get(CONTENT_DURATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<f64>().ok()))
    }

    fn report(&self, err: StreamError) {
        warn!(
            slot = err.slot,
            code = u16::from(err.code),
            message = %err.message,
            "stream error"
        );
        (self.sink)(err);
    }
}

impl MediaHandle for StreamPlayer {
    fn play(&self) {
        let failed = {
            let mut state = self.state.lock();
            match &state.load {
                LoadState::Failed(err) => Some(err.clone()),
                LoadState::Pending | LoadState::Ready => {
                    state.clock.play(Instant::now());
                    None
                }
            }
        };
        match failed {
            // The resource never became available, so the request is rejected.
            Some(err) => self.report(err),
            None => debug!(slot = self.slot, "play"),
        }
    }

    fn pause(&self) {
        self.state.lock().clock.pause(Instant::now());
        debug!(slot = self.slot, "pause");
    }

    fn seek(&self, seconds: f64) {
        self.state.lock().clock.seek(seconds, Instant::now());
        debug!(slot = self.slot, seconds, "seek");
    }

    fn set_rate(&self, rate: f64) {
        if !rate.is_finite() || rate <= 0.0 {
            self.report(StreamError::new(
                self.slot,
                MediaErrorCode::Aborted,
                format!("unsupported playback rate {rate}"),
            ));
            return;
        }
        self.state.lock().clock.set_rate(rate, Instant::now());
        debug!(slot = self.slot, rate, "set rate");
    }

    fn current_time(&self) -> f64 {
        let state = self.state.lock();
        match state.load {
            LoadState::Ready => state.clock.position(Instant::now()),
            LoadState::Pending | LoadState::Failed(_) => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    fn recording_sink() -> (ErrorSink, Arc<Mutex<Vec<StreamError>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink: ErrorSink = Arc::new(move |err| sink_seen.lock().push(err));
        (sink, seen)
    }

    /// Serves a single canned HTTP response and returns the base url.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0_u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    fn player(base: &str, sink: ErrorSink) -> StreamPlayer {
        StreamPlayer::new(
            2,
            stream_locator(base, "driver_front_image_rect_compressed").unwrap(),
            reqwest::Client::new(),
            Duration::from_secs(5),
            sink,
        )
    }

    #[test]
    fn locator_shape() {
        let url = stream_locator("http://localhost:8000", "center_front_image_rect_compressed")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/video?filename=center_front_image_rect_compressed.mp4"
        );

        let nested = stream_locator("http://example.com/api/", "center_rear").unwrap();
        assert_eq!(
            nested.as_str(),
            "http://example.com/api/video?filename=center_rear.mp4"
        );

        assert!(stream_locator("not a url", "center_rear").is_err());
    }

    #[test]
    fn time_is_zero_until_metadata_loads() {
        let (sink, seen) = recording_sink();
        let p = player("http://localhost:8000", sink);
        p.seek(12.0);
        p.play();
        assert!(p.current_time().abs() < f64::EPSILON);

        p.mark_ready(Some(60.0));
        assert!(p.current_time() >= 12.0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn playing_past_duration_has_ended() {
        let (sink, _) = recording_sink();
        let p = player("http://localhost:8000", sink);
        p.play();
        assert!(!p.has_ended());

        p.mark_ready(Some(0.0));
        assert!(p.is_playing());
        assert!(p.has_ended());

        p.pause();
        assert!(!p.has_ended());
    }

    #[test]
    fn invalid_rate_is_reported_and_ignored() {
        let (sink, seen) = recording_sink();
        let p = player("http://localhost:8000", sink);
        p.set_rate(2.0);
        p.set_rate(0.0);
        p.set_rate(f64::NAN);
        assert!((p.rate() - 2.0).abs() < f64::EPSILON);

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|e| e.code == MediaErrorCode::Aborted && e.slot == 2));
    }

    #[tokio::test]
    async fn load_reads_duration() {
        let base = serve_once(
            "HTTP/1.1 206 Partial Content\r\nContent-Type: video/mp4\r\nX-Content-Duration: \
             42.5\r\nContent-Length: 1\r\nConnection: close\r\n\r\n0",
        )
        .await;
        let (sink, seen) = recording_sink();
        let p = player(&base, sink);
        p.load().await;

        assert!(p.is_loaded());
        assert_eq!(p.duration(), Some(42.5));
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_not_supported_and_play_is_rejected() {
        let base = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Type: application/json\r\nContent-Length: \
             2\r\nConnection: close\r\n\r\n{}",
        )
        .await;
        let (sink, seen) = recording_sink();
        let p = player(&base, sink);
        p.load().await;
        p.play();

        assert!(!p.is_loaded());
        assert!(!p.is_playing());
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|e| e.code == MediaErrorCode::SrcNotSupported));
    }

    #[tokio::test]
    async fn non_video_content_is_rejected() {
        let base = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 2\r\nConnection: \
             close\r\n\r\nhi",
        )
        .await;
        let (sink, seen) = recording_sink();
        let p = player(&base, sink);
        p.load().await;

        assert_eq!(
            p.load_error().map(|e| e.code),
            Some(MediaErrorCode::SrcNotSupported)
        );
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (sink, seen) = recording_sink();
        let p = player(&format!("http://{addr}"), sink);
        p.load().await;

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].code, MediaErrorCode::Network);
    }
}
