/*
[INPUT]:  Message hashes from subscribers, resolutions and rejections from the router
[OUTPUT]: Re-awaitable watchers keyed by message hash
[POS]:    WebSocket layer - correlation registry, one per connection
[UPDATE]: When resolution semantics or failure propagation change
*/

use std::collections::HashMap;

use tokio::sync::{Mutex, watch};

use crate::cache::Update;
use crate::error::{Result, StreamError};

type Resolution = std::result::Result<Update, StreamError>;

/// Latest outcome behind one message hash; `generation` bumps on every push.
#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u64,
    value: Option<Resolution>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    entries: HashMap<String, watch::Sender<Slot>>,
    failure: Option<StreamError>,
}

/// Maps message hashes to pending outcomes.
///
/// Every attach to the same hash observes the same pushes. Resolving a hash
/// nobody attached to is a no-op. After [`Registry::fail_all`] the registry
/// refuses new attaches with the failure that closed it.
#[derive(Debug, Default)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `message_hash`; the flag is true when this call created the entry.
    pub async fn attach(&self, message_hash: &str) -> Result<(Watcher, bool)> {
        let mut inner = self.inner.lock().await;
        if let Some(failure) = &inner.failure {
            return Err(failure.clone());
        }
        if let Some(sender) = inner.entries.get(message_hash) {
            return Ok((Watcher::new(message_hash, sender.subscribe()), false));
        }
        let (sender, receiver) = watch::channel(Slot::default());
        inner.entries.insert(message_hash.to_string(), sender);
        Ok((Watcher::new(message_hash, receiver), true))
    }

    pub async fn contains(&self, message_hash: &str) -> bool {
        self.inner.lock().await.entries.contains_key(message_hash)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn is_failed(&self) -> bool {
        self.inner.lock().await.failure.is_some()
    }

    /// Push a value to every watcher of `message_hash`; false when nobody is registered.
    pub async fn resolve(&self, message_hash: &str, update: Update) -> bool {
        self.push(message_hash, Ok(update)).await
    }

    /// Push a failure and forget the entry so the next attach starts over
    pub async fn reject_and_remove(&self, message_hash: &str, error: StreamError) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.entries.remove(message_hash) {
            Some(sender) => {
                publish(&sender, Err(error));
                true
            }
            None => false,
        }
    }

    /// Drop the entry without notifying; watchers see the connection as closed.
    pub async fn remove(&self, message_hash: &str) -> bool {
        self.inner.lock().await.entries.remove(message_hash).is_some()
    }

    /// Reject every entry and close the registry for good
    pub async fn fail_all(&self, error: StreamError) -> usize {
        let mut inner = self.inner.lock().await;
        if inner.failure.is_none() {
            inner.failure = Some(error.clone());
        }
        let entries = std::mem::take(&mut inner.entries);
        let count = entries.len();
        for sender in entries.values() {
            publish(sender, Err(error.clone()));
        }
        count
    }

    async fn push(&self, message_hash: &str, resolution: Resolution) -> bool {
        let inner = self.inner.lock().await;
        match inner.entries.get(message_hash) {
            Some(sender) => {
                publish(sender, resolution);
                true
            }
            None => false,
        }
    }
}

fn publish(sender: &watch::Sender<Slot>, resolution: Resolution) {
    sender.send_modify(|slot| {
        slot.generation = slot.generation.wrapping_add(1);
        slot.value = Some(resolution);
    });
}

/// Handle on one registry entry; await [`Watcher::next`] repeatedly to follow a stream.
#[derive(Debug)]
pub struct Watcher {
    message_hash: String,
    receiver: watch::Receiver<Slot>,
}

impl Watcher {
    fn new(message_hash: &str, receiver: watch::Receiver<Slot>) -> Self {
        Self {
            message_hash: message_hash.to_string(),
            receiver,
        }
    }

    pub fn message_hash(&self) -> &str {
        &self.message_hash
    }

    /// Wait for the next push after the last one this watcher saw.
    ///
    /// Pushes that land while nobody is awaiting collapse into the newest one.
    pub async fn next(&mut self) -> Result<Update> {
        self.receiver
            .changed()
            .await
            .map_err(|_| StreamError::ConnectionClosed)?;
        let slot = self.receiver.borrow_and_update();
        slot.value.clone().unwrap_or(Err(StreamError::ConnectionClosed))
    }

    /// Last pushed outcome, if any, without waiting
    pub fn latest(&self) -> Option<Result<Update>> {
        self.receiver.borrow().value.clone()
    }

    /// Number of pushes seen on this entry so far
    pub fn generation(&self) -> u64 {
        self.receiver.borrow().generation
    }
}
