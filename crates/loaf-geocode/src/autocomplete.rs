//! Address autocomplete engine.
//!
//! One [`Autocomplete`] backs one address input. Keystrokes are debounced;
//! a settled query of at least `min_query_len` characters is looked up in
//! the instance's [`SuggestionCache`] or sent to the [`SuggestionProvider`].
//! Only the most recently issued request can update the suggestion list:
//! a new keystroke aborts any request still in flight.
//!
//! State machine:
//!
//! ```text
//! Idle/Suggesting --input--> Debouncing
//! Debouncing --elapsed, short query--> Idle (list cleared)
//! Debouncing --elapsed, cache hit--> Suggesting | Idle
//! Debouncing --elapsed, cache miss--> Querying
//! Querying --response--> Suggesting | Idle (empty or failed)
//! Querying --input--> Debouncing (request aborted)
//! Suggesting --pick--> Idle (record committed)
//! any --blur--> Idle (record committed)
//! ```

use std::sync::Arc;
use std::time::Duration;

use loaf_core::{AppConfig, LocationRecord};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::cache::SuggestionCache;
use crate::error::GeocodeError;
use crate::provider::SuggestionProvider;
use crate::types::GeocodeCandidate;

/// Tuning knobs for one autocomplete instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteSettings {
    pub debounce: Duration,
    /// Queries shorter than this (in characters, after trimming) are not sent.
    pub min_query_len: usize,
    pub result_limit: u32,
}

impl Default for AutocompleteSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            min_query_len: 5,
            result_limit: 5,
        }
    }
}

impl AutocompleteSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.autocomplete_debounce_ms),
            min_query_len: config.autocomplete_min_query_len,
            result_limit: config.autocomplete_result_limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutocompleteState {
    Idle,
    Debouncing,
    Querying,
    Suggesting,
}

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum AutocompleteEvent {
    /// The suggestion list changed. An empty list means the list is closed.
    Suggestions(Vec<GeocodeCandidate>),
    /// A location was committed by a pick or on blur. The input text should
    /// be replaced with `record.address` and the list closed.
    Committed(LocationRecord),
}

enum Command {
    Input(String),
    Seed(LocationRecord),
    Pick(usize, oneshot::Sender<Option<LocationRecord>>),
    Blur(oneshot::Sender<LocationRecord>),
}

/// Handle to a running autocomplete engine.
///
/// Dropping the handle stops the engine and aborts any request in flight.
pub struct Autocomplete {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<AutocompleteState>,
    task: JoinHandle<()>,
}

impl Autocomplete {
    /// Starts an engine on the current tokio runtime.
    ///
    /// Returns the handle and the receiver for [`AutocompleteEvent`]s.
    pub fn spawn<P: SuggestionProvider>(
        provider: Arc<P>,
        settings: AutocompleteSettings,
    ) -> (Self, mpsc::UnboundedReceiver<AutocompleteEvent>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AutocompleteState::Idle);

        let engine = Engine {
            provider,
            settings,
            cache: SuggestionCache::new(),
            text: String::new(),
            suggestions: Vec::new(),
            committed: None,
            deadline: None,
            inflight: None,
            next_ticket: 0,
            events: events_tx,
            state: state_tx,
        };
        let task = tokio::spawn(engine.run(commands_rx));

        (
            Self {
                commands: commands_tx,
                state: state_rx,
                task,
            },
            events_rx,
        )
    }

    /// Reports a keystroke: `text` is the full current input value.
    pub fn input(&self, text: impl Into<String>) {
        self.send(Command::Input(text.into()));
    }

    /// Prefills the input with an existing location without querying.
    pub fn seed(&self, record: LocationRecord) {
        self.send(Command::Seed(record));
    }

    /// Picks the suggestion at `index`. Returns `None` if there is no such
    /// suggestion or the engine has stopped.
    pub async fn pick(&self, index: usize) -> Option<LocationRecord> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Pick(index, tx));
        rx.await.ok().flatten()
    }

    /// Reports that the input lost focus and resolves the final location.
    ///
    /// Returns `None` only if the engine has stopped.
    pub async fn blur(&self) -> Option<LocationRecord> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Blur(tx));
        rx.await.ok()
    }

    #[must_use]
    pub fn state(&self) -> AutocompleteState {
        *self.state.borrow()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("autocomplete engine has stopped; dropping command");
        }
    }
}

impl Drop for Autocomplete {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct InFlight {
    ticket: u64,
    query: String,
    handle: JoinHandle<Result<Vec<GeocodeCandidate>, GeocodeError>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Engine<P> {
    provider: Arc<P>,
    settings: AutocompleteSettings,
    cache: SuggestionCache,
    text: String,
    suggestions: Vec<GeocodeCandidate>,
    committed: Option<LocationRecord>,
    deadline: Option<Instant>,
    inflight: Option<InFlight>,
    next_ticket: u64,
    events: mpsc::UnboundedSender<AutocompleteEvent>,
    state: watch::Sender<AutocompleteState>,
}

impl<P: SuggestionProvider> Engine<P> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            let deadline = self.deadline;
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.deadline = None;
                    self.on_debounce_elapsed();
                }
                (ticket, result) = wait_inflight(&mut self.inflight) => {
                    self.on_response(ticket, result);
                }
            }
        }
        tracing::debug!("autocomplete engine stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Input(text) => self.on_input(text),
            Command::Seed(record) => {
                self.cancel_pending();
                self.text.clone_from(&record.address);
                self.committed = Some(record);
                self.suggestions.clear();
                self.set_state(AutocompleteState::Idle);
            }
            Command::Pick(index, reply) => {
                let picked = self.pick(index);
                let _ = reply.send(picked);
            }
            Command::Blur(reply) => {
                let record = self.on_blur().await;
                let _ = reply.send(record);
            }
        }
    }

    fn on_input(&mut self, text: String) {
        self.text = text;
        self.committed = None;
        // Whatever is in flight is now for stale text.
        self.cancel_inflight();
        self.deadline = Some(Instant::now() + self.settings.debounce);
        self.set_state(AutocompleteState::Debouncing);
    }

    fn on_debounce_elapsed(&mut self) {
        let query = self.text.trim().to_string();

        if query.chars().count() < self.settings.min_query_len {
            self.show(Vec::new());
            return;
        }

        if let Some(hit) = self.cache.get(&query) {
            tracing::debug!(%query, "suggestion cache hit");
            let hit = hit.to_vec();
            self.show(hit);
            return;
        }

        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let provider = Arc::clone(&self.provider);
        let limit = self.settings.result_limit;
        let request_query = query.clone();
        let handle =
            tokio::spawn(async move { provider.suggest(&request_query, limit).await });

        tracing::debug!(%query, ticket, "issuing suggestion request");
        self.inflight = Some(InFlight {
            ticket,
            query,
            handle,
        });
        self.set_state(AutocompleteState::Querying);
    }

    fn on_response(&mut self, ticket: u64, result: Option<Vec<GeocodeCandidate>>) {
        let Some(inflight) = self.inflight.take() else {
            return;
        };
        if inflight.ticket != ticket {
            tracing::debug!(ticket, "discarding stale suggestion response");
            return;
        }

        if let Some(candidates) = result {
            self.cache.insert(inflight.query.clone(), candidates.clone());
            self.show(candidates);
        } else {
            self.show(Vec::new());
        }
    }

    fn pick(&mut self, index: usize) -> Option<LocationRecord> {
        let record = self.suggestions.get(index)?.to_location_record();
        self.commit(record.clone());
        Some(record)
    }

    async fn on_blur(&mut self) -> LocationRecord {
        self.cancel_pending();

        if let Some(record) = &self.committed {
            return record.clone();
        }

        let text = self.text.trim().to_string();
        if text.is_empty() {
            let record = LocationRecord::default();
            self.commit(record.clone());
            return record;
        }

        if let Some(record) = self.pick(0) {
            tracing::debug!(address = %record.address, "auto-picked top suggestion on blur");
            return record;
        }

        let best = match self.cache.get(&text) {
            Some(hit) => hit.first().cloned(),
            None => match self.provider.suggest(&text, 1).await {
                Ok(candidates) => candidates.into_iter().next(),
                Err(e) => {
                    tracing::warn!(error = %e, query = %text, "last-chance geocode failed");
                    None
                }
            },
        };

        let record = best.map_or_else(
            || LocationRecord::address_only(text),
            |candidate| candidate.to_location_record(),
        );
        self.commit(record.clone());
        record
    }

    fn commit(&mut self, record: LocationRecord) {
        self.cancel_pending();
        self.text.clone_from(&record.address);
        self.suggestions.clear();
        self.committed = Some(record.clone());
        self.emit(AutocompleteEvent::Committed(record));
        self.set_state(AutocompleteState::Idle);
    }

    fn show(&mut self, candidates: Vec<GeocodeCandidate>) {
        let state = if candidates.is_empty() {
            AutocompleteState::Idle
        } else {
            AutocompleteState::Suggesting
        };
        let changed = self.suggestions != candidates;
        self.suggestions = candidates;
        if changed {
            self.emit(AutocompleteEvent::Suggestions(self.suggestions.clone()));
        }
        self.set_state(state);
    }

    fn cancel_pending(&mut self) {
        self.deadline = None;
        self.cancel_inflight();
    }

    fn cancel_inflight(&mut self) {
        if let Some(inflight) = self.inflight.take() {
            tracing::debug!(ticket = inflight.ticket, query = %inflight.query, "aborting superseded request");
        }
    }

    fn emit(&self, event: AutocompleteEvent) {
        // The UI may have stopped listening; that is not an engine error.
        let _ = self.events.send(event);
    }

    fn set_state(&self, state: AutocompleteState) {
        self.state.send_replace(state);
    }
}

/// Resolves when the in-flight request finishes; pends forever if there is none.
///
/// Failed or panicked requests resolve to `None`.
async fn wait_inflight(inflight: &mut Option<InFlight>) -> (u64, Option<Vec<GeocodeCandidate>>) {
    let Some(inflight) = inflight else {
        return std::future::pending().await;
    };

    let ticket = inflight.ticket;
    let result = match (&mut inflight.handle).await {
        Ok(Ok(candidates)) => Some(candidates),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, query = %inflight.query, "suggestion request failed");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, query = %inflight.query, "suggestion task did not complete");
            None
        }
    };
    (ticket, result)
}

#[cfg(test)]
#[path = "autocomplete_test.rs"]
mod tests;
