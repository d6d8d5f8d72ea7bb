// SPDX-License-Identifier: MPL-2.0
//! Async image load driver.
//!
//! [`ImageLoader`] runs a [`RetryController`] inside a Tokio task that owns
//! everything time-related: the retry timer, the in-flight fetch, and the
//! connectivity subscription. Commands go in over a channel and
//! [`LoaderEvent`]s come out, so the UI thread never blocks and all retry
//! state is mutated from a single task.
//!
//! Cancellation is structural: rebinding drops the in-flight fetch future
//! and disarms the timer, and dropping the [`ImageLoader`] handle stops the
//! task, so no stale callback can touch a discarded binding.

use crate::config::RetryConfig;
use crate::connectivity::ConnectivitySource;
use crate::controller::{Directive, RetryController};
use crate::domain::{LoadOutcome, LoadRequest, ResourceKey, VisualState};
use crate::error::{Error, LoadFailure, Result};
use crate::fetcher::ImageFetcher;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Commands sent to the loader task.
#[derive(Debug)]
enum LoaderCommand {
    /// (Re)bind the loader to a resource; `None` is the no-resource case.
    Bind(Option<ResourceKey>),

    /// Stop the loader task.
    Shutdown,
}

/// Events sent from the loader task to the rendering collaborator.
#[derive(Debug)]
pub enum LoaderEvent<I> {
    /// The presented state changed; render accordingly.
    State(VisualState),

    /// A fetch succeeded. Always followed by
    /// `State(`[`VisualState::Success`]`)`.
    ImageReady(I),
}

type FetchFuture<I> = Pin<Box<dyn Future<Output = std::result::Result<I, LoadFailure>> + Send>>;

/// Handle to a loader task driving retries for one resource at a time.
pub struct ImageLoader<I> {
    /// Channel for sending commands to the loader task.
    command_tx: mpsc::UnboundedSender<LoaderCommand>,

    /// Channel for receiving events from the loader task.
    event_rx: mpsc::UnboundedReceiver<LoaderEvent<I>>,

    /// Latest presented state, for watch subscriptions.
    state_rx: watch::Receiver<VisualState>,
}

impl<I: Send + 'static> ImageLoader<I> {
    /// Spawns a loader task around the given fetcher and connectivity
    /// source.
    ///
    /// Nothing is fetched until the first [`ImageLoader::bind`]. Must be
    /// called from within a Tokio runtime.
    pub fn new<F, C>(fetcher: F, connectivity: &C, config: &RetryConfig) -> Self
    where
        F: ImageFetcher<Image = I>,
        C: ConnectivitySource + ?Sized,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let controller = RetryController::new(config);
        let connectivity_rx = connectivity.subscribe();
        // Nothing is bound yet, so the presented state starts at fallback.
        let (state_tx, state_rx) = watch::channel(controller.visual_state());

        tokio::spawn(run(
            Arc::new(fetcher),
            controller,
            connectivity_rx,
            command_rx,
            event_tx,
            state_tx,
        ));

        Self {
            command_tx,
            event_rx,
            state_rx,
        }
    }

    /// (Re)binds the loader to a resource.
    ///
    /// Binding a different key resets the retry budget and cancels the
    /// previous binding's timer and in-flight fetch; rebinding the same key
    /// is a no-op apart from a refreshed state event.
    pub fn bind(&self, key: Option<ResourceKey>) -> Result<()> {
        self.command_tx
            .send(LoaderCommand::Bind(key))
            .map_err(|_| Error::LoaderGone)
    }

    /// Convenience wrapper binding a raw identifier; empty means no
    /// resource.
    pub fn bind_str(&self, raw: &str) -> Result<()> {
        self.bind(ResourceKey::new(raw))
    }

    /// Asks the loader task to stop. Dropping the handle has the same
    /// effect.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(LoaderCommand::Shutdown);
    }

    /// Receives the next event from the loader.
    ///
    /// Returns `None` once the loader task has stopped.
    pub async fn recv_event(&mut self) -> Option<LoaderEvent<I>> {
        self.event_rx.recv().await
    }

    /// Receives the next event from the loader without waiting.
    ///
    /// Returns `None` if no events are queued.
    pub fn try_recv_event(&mut self) -> Option<LoaderEvent<I>> {
        self.event_rx.try_recv().ok()
    }

    /// Returns a watch subscription tracking the presented state.
    ///
    /// Unlike the event stream, a watch receiver only exposes the latest
    /// value; use it when the rendering collaborator just re-renders the
    /// current state. The value is updated before the matching
    /// [`LoaderEvent::State`] is queued.
    #[must_use]
    pub fn visual_states(&self) -> watch::Receiver<VisualState> {
        self.state_rx.clone()
    }
}

/// Loader event loop. All retry state mutations happen here, one event at
/// a time.
async fn run<F: ImageFetcher>(
    fetcher: Arc<F>,
    mut controller: RetryController,
    mut connectivity_rx: watch::Receiver<bool>,
    mut command_rx: mpsc::UnboundedReceiver<LoaderCommand>,
    event_tx: mpsc::UnboundedSender<LoaderEvent<F::Image>>,
    state_tx: watch::Sender<VisualState>,
) {
    // Seed with the status at subscription time. Nothing is bound yet, so
    // this cannot dispatch.
    let connected = *connectivity_rx.borrow_and_update();
    let _ = controller.report_connectivity_change(connected);

    let mut retry_deadline: Option<Instant> = None;
    let mut in_flight: Option<FetchFuture<F::Image>> = None;
    let mut last_state = controller.visual_state();
    let mut connectivity_open = true;

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(LoaderCommand::Bind(key)) => {
                    let directive = controller.bind(key);
                    if !matches!(directive, Directive::None) {
                        // The previous binding's attempt is invalidated.
                        in_flight = None;
                    }
                    apply_directive(directive, &fetcher, &mut retry_deadline, &mut in_flight);
                    // A fresh binding is always presented, even when the
                    // state value happens to repeat.
                    last_state = controller.visual_state();
                    state_tx.send_replace(last_state);
                    if event_tx.send(LoaderEvent::State(last_state)).is_err() {
                        break;
                    }
                    continue;
                }
                Some(LoaderCommand::Shutdown) | None => break,
            },

            changed = connectivity_rx.changed(), if connectivity_open => match changed {
                Ok(()) => {
                    let connected = *connectivity_rx.borrow_and_update();
                    debug!(connected, "connectivity changed");
                    let directive = controller.report_connectivity_change(connected);
                    apply_directive(directive, &fetcher, &mut retry_deadline, &mut in_flight);
                }
                Err(_) => {
                    // Source dropped; keep the last known status.
                    warn!("connectivity source dropped");
                    connectivity_open = false;
                }
            },

            _ = async {
                match retry_deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            }, if retry_deadline.is_some() => {
                retry_deadline = None;
                let directive = controller.retry_elapsed();
                apply_directive(directive, &fetcher, &mut retry_deadline, &mut in_flight);
            },

            result = async {
                match in_flight.as_mut() {
                    Some(fetch) => fetch.as_mut().await,
                    None => std::future::pending().await,
                }
            }, if in_flight.is_some() => {
                in_flight = None;
                let directive = match result {
                    Ok(image) => {
                        if event_tx.send(LoaderEvent::ImageReady(image)).is_err() {
                            break;
                        }
                        controller.report_outcome(LoadOutcome::Success)
                    }
                    Err(failure) => {
                        debug!(%failure, "fetch attempt failed");
                        controller.report_outcome(LoadOutcome::Failure)
                    }
                };
                apply_directive(directive, &fetcher, &mut retry_deadline, &mut in_flight);
            },
        }

        let state = controller.visual_state();
        if state != last_state {
            last_state = state;
            state_tx.send_replace(state);
            if event_tx.send(LoaderEvent::State(state)).is_err() {
                break;
            }
        }
    }

    debug!("image loader task stopped");
}

fn apply_directive<F: ImageFetcher>(
    directive: Directive,
    fetcher: &Arc<F>,
    retry_deadline: &mut Option<Instant>,
    in_flight: &mut Option<FetchFuture<F::Image>>,
) {
    match directive {
        Directive::None => {}
        Directive::CancelRetry => *retry_deadline = None,
        Directive::ScheduleRetry(delay) => *retry_deadline = Some(Instant::now() + delay),
        Directive::Dispatch(request) => {
            // An immediate dispatch supersedes the armed timer.
            *retry_deadline = None;
            debug!(
                cache_key = %request.cache_key(),
                attempt = request.attempt(),
                "dispatching fetch"
            );
            *in_flight = Some(start_fetch(fetcher, request));
        }
    }
}

fn start_fetch<F: ImageFetcher>(fetcher: &Arc<F>, request: LoadRequest) -> FetchFuture<F::Image> {
    let fetcher = Arc::clone(fetcher);
    Box::pin(async move { fetcher.fetch(request).await })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::StaticConnectivity;

    struct FailingFetcher;

    impl ImageFetcher for FailingFetcher {
        type Image = String;

        fn fetch(
            &self,
            _request: LoadRequest,
        ) -> impl Future<Output = std::result::Result<String, LoadFailure>> + Send {
            async { Err(LoadFailure::new("always fails")) }
        }
    }

    #[tokio::test]
    async fn events_end_after_shutdown() {
        let connectivity = StaticConnectivity::online();
        let mut loader: ImageLoader<String> =
            ImageLoader::new(FailingFetcher, &connectivity, &RetryConfig::default());

        loader.shutdown();
        assert!(loader.recv_event().await.is_none());
    }

    #[tokio::test]
    async fn bind_none_presents_fallback_immediately() {
        let connectivity = StaticConnectivity::online();
        let mut loader: ImageLoader<String> =
            ImageLoader::new(FailingFetcher, &connectivity, &RetryConfig::default());

        loader.bind(None).expect("loader task should be running");
        match loader.recv_event().await {
            Some(LoaderEvent::State(state)) => assert_eq!(state, VisualState::Fallback),
            other => panic!("expected fallback state event, got {:?}", other),
        }
    }
}
