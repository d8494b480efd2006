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

use std::sync::Arc;

use mosaic_player::{MediaHandle, PlaybackGroupController, RosbagSelectionModel, Session};
use parking_lot::Mutex;

/// Shared log of `(slot, call)` across every fake handle in a test.
type CallLog = Arc<Mutex<Vec<(usize, String)>>>;

struct FakeHandle {
    slot: usize,
    log:  CallLog,
}

impl FakeHandle {
    fn record(&self, call: impl Into<String>) { self.log.lock().push((self.slot, call.into())); }
}

impl MediaHandle for FakeHandle {
    fn play(&self) { self.record("play"); }

    fn pause(&self) { self.record("pause"); }

    fn seek(&self, seconds: f64) { self.record(format!("seek {seconds}")); }

    fn set_rate(&self, rate: f64) { self.record(format!("set_rate {rate}")); }

    fn current_time(&self) -> f64 { 0.0 }
}

fn handles(n: usize, log: &CallLog) -> Vec<Arc<dyn MediaHandle>> {
    (0..n)
        .map(|slot| {
            Arc::new(FakeHandle {
                slot,
                log: log.clone(),
            }) as Arc<dyn MediaHandle>
        })
        .collect()
}

fn group(n: usize) -> PlaybackGroupController {
    PlaybackGroupController::new((0..n).map(|i| format!("http://localhost:8000/video?filename={i}.mp4")))
}

#[test]
fn set_rate_all_reaches_every_handle_once_in_order() {
    let log = CallLog::default();
    let hs = handles(6, &log);
    let mut g = group(6);
    for (i, h) in hs.iter().enumerate() {
        g.register_handle(i, h).unwrap();
    }

    g.set_rate_all(2.0);

    let expected: Vec<_> = (0..6).map(|i| (i, "set_rate 2".to_string())).collect();
    assert_eq!(*log.lock(), expected);
}

#[test]
fn play_all_skips_unbound_slots_for_any_size() {
    for n in [1_usize, 2, 5, 6, 11] {
        let log = CallLog::default();
        let hs = handles(n, &log);
        let mut g = group(n);
        let bound: Vec<usize> = (0..n).filter(|i| i % 2 == 0).collect();
        for &i in &bound {
            g.register_handle(i, &hs[i]).unwrap();
        }

        g.play_all();

        let called: Vec<usize> = log.lock().iter().map(|(slot, _)| *slot).collect();
        assert_eq!(called, bound, "group of {n}");
        assert!(log.lock().iter().all(|(_, call)| call == "play"));
    }
}

#[test]
fn unregistered_handle_is_never_touched() {
    let log = CallLog::default();
    let hs = handles(3, &log);
    let mut g = group(3);
    for (i, h) in hs.iter().enumerate() {
        g.register_handle(i, h).unwrap();
    }

    g.unregister_handle(1).unwrap();
    g.play_all();
    g.pause_all();
    g.seek_all(4.0);

    assert!(log.lock().iter().all(|(slot, _)| *slot != 1));
    assert_eq!(log.lock().len(), 6);
    assert_eq!(g.bound_slots(), vec![0, 2]);
}

#[test]
fn pause_after_play_rebroadcasts_independently() {
    let log = CallLog::default();
    let hs = handles(2, &log);
    let mut g = group(2);
    g.register_handle(0, &hs[0]).unwrap();
    g.register_handle(1, &hs[1]).unwrap();

    g.play_all();
    g.pause_all();

    let calls: Vec<_> = log.lock().iter().map(|(s, c)| format!("{s}:{c}")).collect();
    assert_eq!(calls, vec!["0:play", "1:play", "0:pause", "1:pause"]);
}

#[test]
fn grouped_view_of_sample_catalog() {
    let sessions = vec![
        Session::builder()
            .id("1")
            .name("Run A")
            .category("Experiments")
            .path("/bags/a.bag")
            .build(),
        Session::builder()
            .id("2")
            .name("Run B")
            .category("Experiments")
            .path("/bags/b.bag")
            .build(),
        Session::builder()
            .id("3")
            .name("Debug")
            .category("Tests")
            .path("/bags/debug.bag")
            .build(),
    ];
    let model = RosbagSelectionModel::new(sessions);
    let grouped = model.grouped_view();

    let shape: Vec<(String, Vec<String>)> = grouped
        .groups()
        .iter()
        .map(|g| {
            (
                g.category.clone(),
                g.sessions.iter().map(|s| s.name.clone()).collect(),
            )
        })
        .collect();
    assert_eq!(
        shape,
        vec![
            ("Experiments".to_string(), vec!["Run A".to_string(), "Run B".to_string()]),
            ("Tests".to_string(), vec!["Debug".to_string()]),
        ]
    );
}
