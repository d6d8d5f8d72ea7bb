// SPDX-License-Identifier: MPL-2.0
//! End-to-end retry flows through the public loader API, with simulated
//! connectivity and a paused Tokio clock.

use retry_lens::{
    ImageFetcher, ImageLoader, LoadFailure, LoadRequest, LoaderEvent, ResourceKey, RetryConfig,
    SimulatedConnectivity, StaticConnectivity, VisualState,
};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone, Copy)]
enum Step {
    Succeed,
    Fail,
    /// Never resolves; used to hold an attempt in flight.
    Hang,
}

/// Fetcher that replays a fixed script and records every request it sees.
#[derive(Clone)]
struct ScriptedFetcher {
    script: Arc<Mutex<VecDeque<Step>>>,
    requests: Arc<Mutex<Vec<LoadRequest>>>,
}

impl ScriptedFetcher {
    fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<LoadRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn cache_keys(&self) -> Vec<String> {
        self.requests().iter().map(LoadRequest::cache_key).collect()
    }
}

impl ImageFetcher for ScriptedFetcher {
    type Image = String;

    fn fetch(
        &self,
        request: LoadRequest,
    ) -> impl Future<Output = Result<String, LoadFailure>> + Send {
        self.requests.lock().unwrap().push(request.clone());
        let step = self.script.lock().unwrap().pop_front();
        async move {
            match step {
                Some(Step::Succeed) | None => Ok(format!("image:{}", request.cache_key())),
                Some(Step::Fail) => Err(LoadFailure::new("simulated failure")),
                Some(Step::Hang) => std::future::pending().await,
            }
        }
    }
}

fn config(max_retries: u32, retry_delay_ms: u64) -> RetryConfig {
    RetryConfig {
        max_retries,
        retry_delay_ms,
        connectivity_enabled: true,
    }
}

fn key(raw: &str) -> Option<ResourceKey> {
    ResourceKey::new(raw)
}

/// Awaits the next state event, skipping image payloads.
async fn next_state(loader: &mut ImageLoader<String>) -> VisualState {
    loop {
        match loader.recv_event().await {
            Some(LoaderEvent::State(state)) => return state,
            Some(LoaderEvent::ImageReady(_)) => continue,
            None => panic!("loader task stopped unexpectedly"),
        }
    }
}

fn retry_pending(attempt: u32, max_retries: u32) -> VisualState {
    VisualState::RetryPending {
        attempt,
        max_retries,
    }
}

#[tokio::test(start_paused = true)]
async fn fixed_delay_retries_then_fallback() {
    let fetcher = ScriptedFetcher::new([Step::Fail, Step::Fail, Step::Fail]);
    let connectivity = StaticConnectivity::online();
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(2, 100));

    let started = Instant::now();
    loader.bind(key("imgA")).unwrap();

    assert_eq!(next_state(&mut loader).await, retry_pending(0, 2));
    assert_eq!(next_state(&mut loader).await, retry_pending(1, 2));
    assert_eq!(next_state(&mut loader).await, retry_pending(2, 2));
    assert_eq!(next_state(&mut loader).await, VisualState::Fallback);

    // Two retries, each after the fixed 100 ms delay.
    assert_eq!(started.elapsed(), Duration::from_millis(200));
    assert_eq!(
        fetcher.cache_keys(),
        vec!["imgA", "imgA#retry-1", "imgA#retry-2"]
    );

    // Fallback is terminal: nothing further is dispatched.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fetcher.requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn success_delivers_image_then_success_state() {
    let fetcher = ScriptedFetcher::new([Step::Succeed]);
    let connectivity = StaticConnectivity::online();
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(3, 100));

    loader.bind(key("imgA")).unwrap();
    assert_eq!(next_state(&mut loader).await, retry_pending(0, 3));

    match loader.recv_event().await {
        Some(LoaderEvent::ImageReady(image)) => assert_eq!(image, "image:imgA"),
        other => panic!("expected image, got {:?}", other),
    }
    assert_eq!(next_state(&mut loader).await, VisualState::Success);
}

#[tokio::test(start_paused = true)]
async fn failure_then_success_continues_counting_later() {
    // One failure, then a success; the next failure on the same key starts
    // from retry_count = 1 rather than 0.
    let fetcher = ScriptedFetcher::new([Step::Fail, Step::Succeed]);
    let connectivity = StaticConnectivity::online();
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(2, 100));

    loader.bind(key("imgA")).unwrap();
    assert_eq!(next_state(&mut loader).await, retry_pending(0, 2));
    assert_eq!(next_state(&mut loader).await, retry_pending(1, 2));
    assert_eq!(next_state(&mut loader).await, VisualState::Success);

    assert_eq!(fetcher.cache_keys(), vec!["imgA", "imgA#retry-1"]);
}

#[tokio::test(start_paused = true)]
async fn reconnect_bypasses_retry_delay() {
    let fetcher = ScriptedFetcher::new([Step::Fail, Step::Fail, Step::Hang]);
    let connectivity = SimulatedConnectivity::new(true);
    // Delay long enough that the second retry could only come from the
    // reconnect trigger.
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(3, 100));

    let started = Instant::now();
    loader.bind(key("imgA")).unwrap();
    assert_eq!(next_state(&mut loader).await, retry_pending(0, 3));
    assert_eq!(next_state(&mut loader).await, retry_pending(1, 3));
    // First retry fires on the timer and fails again.
    assert_eq!(next_state(&mut loader).await, retry_pending(2, 3));
    assert_eq!(started.elapsed(), Duration::from_millis(100));

    // Drop offline, then reconnect before the second retry timer elapses.
    connectivity.set_connected(false);
    assert_eq!(next_state(&mut loader).await, VisualState::Offline);
    connectivity.set_connected(true);
    assert_eq!(next_state(&mut loader).await, retry_pending(2, 3));

    // The reconnect dispatched immediately, without waiting for the delay.
    assert_eq!(started.elapsed(), Duration::from_millis(100));
    assert_eq!(
        fetcher.cache_keys(),
        vec!["imgA", "imgA#retry-1", "imgA#retry-2"]
    );

    // Exactly one request per reconnect; the stale timer must not add more.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fetcher.requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn reconnect_after_exhaustion_grants_no_fresh_budget() {
    let fetcher = ScriptedFetcher::new([Step::Fail, Step::Fail, Step::Fail]);
    let connectivity = SimulatedConnectivity::new(true);
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(2, 100));

    loader.bind(key("imgA")).unwrap();
    loop {
        if next_state(&mut loader).await == VisualState::Fallback {
            break;
        }
    }
    assert_eq!(fetcher.requests().len(), 3);

    connectivity.set_connected(false);
    assert_eq!(next_state(&mut loader).await, VisualState::Offline);
    connectivity.set_connected(true);
    assert_eq!(next_state(&mut loader).await, VisualState::Fallback);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fetcher.requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_fetched_while_offline() {
    let fetcher = ScriptedFetcher::new([Step::Succeed]);
    let connectivity = SimulatedConnectivity::new(false);
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(3, 100));

    loader.bind(key("imgA")).unwrap();
    assert_eq!(next_state(&mut loader).await, VisualState::Offline);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(fetcher.requests().is_empty());

    // Reconnecting dispatches the deferred initial load.
    connectivity.set_connected(true);
    assert_eq!(next_state(&mut loader).await, retry_pending(0, 3));
    assert_eq!(next_state(&mut loader).await, VisualState::Success);
    assert_eq!(fetcher.cache_keys(), vec!["imgA"]);
}

#[tokio::test(start_paused = true)]
async fn rebinding_resets_the_retry_budget() {
    let fetcher = ScriptedFetcher::new([Step::Fail, Step::Fail, Step::Succeed]);
    let connectivity = StaticConnectivity::online();
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(1, 100));

    loader.bind(key("imgA")).unwrap();
    assert_eq!(next_state(&mut loader).await, retry_pending(0, 1));
    assert_eq!(next_state(&mut loader).await, retry_pending(1, 1));

    // Rebind before imgA's retry timer elapses: the timer is cancelled and
    // the budget starts over for imgB.
    loader.bind(key("imgB")).unwrap();
    assert_eq!(next_state(&mut loader).await, retry_pending(0, 1));
    assert_eq!(next_state(&mut loader).await, retry_pending(1, 1));
    assert_eq!(next_state(&mut loader).await, VisualState::Success);

    assert_eq!(fetcher.cache_keys(), vec!["imgA", "imgB", "imgB#retry-1"]);
}

#[tokio::test(start_paused = true)]
async fn rebinding_drops_the_in_flight_fetch() {
    let fetcher = ScriptedFetcher::new([Step::Hang, Step::Succeed]);
    let connectivity = StaticConnectivity::online();
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(3, 100));

    loader.bind(key("imgA")).unwrap();
    assert_eq!(next_state(&mut loader).await, retry_pending(0, 3));

    // The attempt is held in flight; nothing resolves on its own.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(loader.try_recv_event().is_none());
    assert_eq!(fetcher.requests().len(), 1);

    // Rebinding drops the hung attempt; its outcome must never surface.
    loader.bind(key("imgB")).unwrap();
    assert_eq!(next_state(&mut loader).await, retry_pending(0, 3));
    match loader.recv_event().await {
        Some(LoaderEvent::ImageReady(image)) => assert_eq!(image, "image:imgB"),
        other => panic!("expected image, got {:?}", other),
    }
    assert_eq!(next_state(&mut loader).await, VisualState::Success);
    assert_eq!(fetcher.cache_keys(), vec!["imgA", "imgB"]);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(loader.try_recv_event().is_none());
    assert_eq!(fetcher.requests().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn visual_states_watch_follows_transitions() {
    let fetcher = ScriptedFetcher::new([Step::Fail, Step::Succeed]);
    let connectivity = StaticConnectivity::online();
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(3, 100));

    let states = loader.visual_states();
    assert_eq!(*states.borrow(), VisualState::Fallback);

    loader.bind(key("imgA")).unwrap();
    assert_eq!(next_state(&mut loader).await, retry_pending(0, 3));
    assert_eq!(*states.borrow(), retry_pending(0, 3));

    assert_eq!(next_state(&mut loader).await, retry_pending(1, 3));
    assert_eq!(*states.borrow(), retry_pending(1, 3));

    assert_eq!(next_state(&mut loader).await, VisualState::Success);
    assert_eq!(*states.borrow(), VisualState::Success);
}

#[tokio::test(start_paused = true)]
async fn binding_no_resource_is_immediate_fallback() {
    let fetcher = ScriptedFetcher::new(Vec::new());
    let connectivity = StaticConnectivity::online();
    let mut loader = ImageLoader::new(fetcher.clone(), &connectivity, &config(3, 100));

    loader.bind_str("").unwrap();
    assert_eq!(next_state(&mut loader).await, VisualState::Fallback);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(fetcher.requests().is_empty());
}
