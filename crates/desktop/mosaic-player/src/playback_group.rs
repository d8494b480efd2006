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

//! Best-effort broadcast of transport commands across a fixed set of slots.
//!
//! The controller never owns a handle. Views register a handle when they
//! mount and unregister it when they unmount; the controller only keeps a
//! weak reference, so a handle dropped without unregistering is simply
//! skipped. Commands go out in ascending slot order, one call per bound
//! handle, with no aggregate result and no rollback.

use std::sync::{Arc, Weak};

use snafu::ensure;
use tracing::debug;

use crate::{
    err::{Result, SlotOutOfRangeSnafu},
    media::MediaHandle,
};

/// Playback rates offered by the transport controls.
pub const RATE_PRESETS: [f64; 3] = [0.5, 1.0, 2.0];

/// One configured stream position.
pub struct StreamSlot {
    index:   usize,
    locator: String,
    handle:  Option<Weak<dyn MediaHandle>>,
}

impl std::fmt::Debug for StreamSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSlot")
            .field("index", &self.index)
            .field("locator", &self.locator)
            .field("bound", &self.handle().is_some())
            .finish()
    }
}

impl StreamSlot {
    pub const fn index(&self) -> usize { self.index }

    pub fn locator(&self) -> &str { &self.locator }

    /// The bound handle, if one is registered and still alive.
    pub fn handle(&self) -> Option<Arc<dyn MediaHandle>> {
        self.handle.as_ref().and_then(Weak::upgrade)
    }
}

#[derive(Debug)]
pub struct PlaybackGroupController {
    slots: Vec<StreamSlot>,
}

impl PlaybackGroupController {
    /// One slot per locator, indexed in the given order.
    pub fn new<I, S>(locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = locators
            .into_iter()
            .enumerate()
            .map(|(index, locator)| StreamSlot {
                index,
                locator: locator.into(),
                handle: None,
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize { self.slots.len() }

    pub fn is_empty(&self) -> bool { self.slots.is_empty() }

    pub fn slots(&self) -> &[StreamSlot] { &self.slots }

    /// Binds `handle` to slot `index`, replacing any previous binding.
    pub fn register_handle(&mut self, index: usize, handle: &Arc<dyn MediaHandle>) -> Result<()> {
        let slot = self.slot_mut(index)?;
        slot.handle = Some(Arc::downgrade(handle));
        debug!(slot = index, "handle registered");
        Ok(())
    }

    /// Clears slot `index`. Clearing an unbound slot is a no-op.
    pub fn unregister_handle(&mut self, index: usize) -> Result<()> {
        let slot = self.slot_mut(index)?;
        slot.handle = None;
        debug!(slot = index, "handle unregistered");
        Ok(())
    }

    /// Indices of slots with a live handle, ascending.
    pub fn bound_slots(&self) -> Vec<usize> {
        self.bound().map(|(index, _)| index).collect()
    }

    pub fn play_all(&self) { self.broadcast("play", |h| h.play()); }

    pub fn pause_all(&self) { self.broadcast("pause", |h| h.pause()); }

    /// `rate` is passed through untouched; validating it is the handle's job.
    pub fn set_rate_all(&self, rate: f64) { self.broadcast("set_rate", |h| h.set_rate(rate)); }

    pub fn seek_all(&self, seconds: f64) { self.broadcast("seek", |h| h.seek(seconds)); }

    /// `(slot, position)` for every bound handle.
    pub fn positions(&self) -> Vec<(usize, f64)> {
        self.bound()
            .map(|(index, handle)| (index, handle.current_time()))
            .collect()
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut StreamSlot> {
        let len = self.slots.len();
        ensure!(index < len, SlotOutOfRangeSnafu { index, len });
        Ok(&mut self.slots[index])
    }

    fn bound(&self) -> impl Iterator<Item = (usize, Arc<dyn MediaHandle>)> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.handle().map(|handle| (slot.index, handle)))
    }

    fn broadcast(&self, command: &'static str, op: impl Fn(&dyn MediaHandle)) {
        let mut reached = 0_usize;
        for (_, handle) in self.bound() {
            op(handle.as_ref());
            reached += 1;
        }
        debug!(command, reached, slots = self.slots.len(), "broadcast");
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl MediaHandle for Recorder {
        fn play(&self) { self.calls.lock().push("play".into()); }

        fn pause(&self) { self.calls.lock().push("pause".into()); }

        fn seek(&self, seconds: f64) { self.calls.lock().push(format!("seek {seconds}")); }

        fn set_rate(&self, rate: f64) { self.calls.lock().push(format!("rate {rate}")); }

        fn current_time(&self) -> f64 { 7.0 }
    }

    fn group(n: usize) -> PlaybackGroupController {
        PlaybackGroupController::new((0..n).map(|i| format!("stream-{i}")))
    }

    #[test]
    fn register_out_of_range() {
        let mut g = group(2);
        let h: Arc<dyn MediaHandle> = Arc::new(Recorder::default());
        let err = g.register_handle(2, &h).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::SlotOutOfRange { index: 2, len: 2, .. }
        ));
        assert!(g.unregister_handle(5).is_err());
    }

    #[test]
    fn reregistration_replaces_only_that_slot() {
        let mut g = group(2);
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let other = Arc::new(Recorder::default());
        let (h1, h2, h3): (Arc<dyn MediaHandle>, Arc<dyn MediaHandle>, Arc<dyn MediaHandle>) =
            (first.clone(), second.clone(), other.clone());

        g.register_handle(0, &h1).unwrap();
        g.register_handle(1, &h3).unwrap();
        g.register_handle(0, &h2).unwrap();
        g.pause_all();

        assert!(first.calls.lock().is_empty());
        assert_eq!(*second.calls.lock(), vec!["pause"]);
        assert_eq!(*other.calls.lock(), vec!["pause"]);
    }

    #[test]
    fn dropped_handle_counts_as_unbound() {
        let mut g = group(3);
        let kept: Arc<dyn MediaHandle> = Arc::new(Recorder::default());
        g.register_handle(0, &kept).unwrap();
        {
            let transient: Arc<dyn MediaHandle> = Arc::new(Recorder::default());
            g.register_handle(1, &transient).unwrap();
        }
        assert_eq!(g.bound_slots(), vec![0]);
        assert_eq!(g.positions(), vec![(0, 7.0)]);
        g.play_all();
    }

    #[test]
    fn empty_group_is_a_noop() {
        let g = group(0);
        assert!(g.is_empty());
        g.play_all();
        g.set_rate_all(RATE_PRESETS[2]);
        assert!(g.positions().is_empty());
    }
}
