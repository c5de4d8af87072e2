//! The callback registry
//!
//! Maps `(channel, key)` to an ordered list of callbacks. Entries are
//! either persistent or one-shot; one-shot entries are removed after they
//! fire, and an entry registered under several keys at once (the RPC
//! pattern) is removed from all of them when any fires. The registry is an
//! instance owned by the connection, never a process-wide singleton, so
//! tests construct registries in isolation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::connection::{Connection, Dispatch, Error};
use crate::transport::Transport;

/// What a callback is registered under, next to its channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    /// A method discriminator, `(class_id, method_id)`
    Method((u16, u16)),

    /// Fires when the connection (channel 0) or a channel opens
    OnOpen,

    /// Fires when the connection (channel 0) or a channel closes
    OnClose,

    /// A channel's default receive hook: methods without a pending entry
    /// and fully assembled content land here
    Receive,
}

/// A registered callback. Invoked with the connection and the dispatched
/// event; an `Err` is logged and swallowed so one bad handler cannot take
/// down the connection.
pub type Callback<T> =
    Arc<Mutex<dyn FnMut(&mut Connection<T>, &Dispatch) -> Result<(), Error> + Send>>;

/// Wraps a closure into the shared callback shape the registry stores.
pub fn callback<T, F>(f: F) -> Callback<T>
where
    T: Transport,
    F: FnMut(&mut Connection<T>, &Dispatch) -> Result<(), Error> + Send + 'static,
{
    Arc::new(Mutex::new(f))
}

pub(crate) struct Entry<T: Transport> {
    pub(crate) callback: Callback<T>,
    pub(crate) one_shot: bool,
}

/// Registry of `(channel, key) -> ordered callbacks`.
pub struct CallbackRegistry<T: Transport> {
    entries: BTreeMap<(u16, Key), Vec<Entry<T>>>,
}

impl<T: Transport> Default for CallbackRegistry<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Transport> CallbackRegistry<T> {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a callback. Re-adding the same callback object (by identity)
    /// under the same key collapses to the existing entry.
    pub fn add(&mut self, channel: u16, key: Key, callback: Callback<T>, one_shot: bool) {
        let list = self.entries.entry((channel, key)).or_default();
        if list.iter().any(|e| Arc::ptr_eq(&e.callback, &callback)) {
            return;
        }
        list.push(Entry { callback, one_shot });
    }

    /// Removes all entries under `key` matching `callback` by identity.
    /// Absent entries are not an error.
    pub fn remove(&mut self, channel: u16, key: Key, callback: &Callback<T>) {
        if let Some(list) = self.entries.get_mut(&(channel, key)) {
            list.retain(|e| !Arc::ptr_eq(&e.callback, callback));
            if list.is_empty() {
                self.entries.remove(&(channel, key));
            }
        }
    }

    /// Whether any callback is registered under `(channel, key)`
    pub fn pending(&self, channel: u16, key: Key) -> bool {
        self.entries
            .get(&(channel, key))
            .map_or(false, |list| !list.is_empty())
    }

    /// Takes the entry list out of the map so the connection can invoke it
    /// without aliasing the registry. Entries added while the list is out
    /// land in a fresh list and only see future events.
    pub(crate) fn take(&mut self, channel: u16, key: Key) -> Vec<Entry<T>> {
        self.entries.remove(&(channel, key)).unwrap_or_default()
    }

    /// Puts surviving entries back, ahead of anything added during dispatch
    /// so registration order is preserved.
    pub(crate) fn restore(&mut self, channel: u16, key: Key, mut survivors: Vec<Entry<T>>) {
        if let Some(added) = self.entries.remove(&(channel, key)) {
            survivors.extend(added);
        }
        if !survivors.is_empty() {
            self.entries.insert((channel, key), survivors);
        }
    }

    /// Removes `callback` from every key of `channel`. This is how firing
    /// one reply of an RPC cancels its sibling registrations.
    pub(crate) fn remove_everywhere(&mut self, channel: u16, callback: &Callback<T>) {
        self.entries.retain(|(entry_channel, _), list| {
            if *entry_channel == channel {
                list.retain(|e| !Arc::ptr_eq(&e.callback, callback));
            }
            !list.is_empty()
        });
    }

    /// Drops every entry registered for `channel`
    pub(crate) fn drop_channel(&mut self, channel: u16) {
        self.entries.retain(|(entry_channel, _), _| *entry_channel != channel);
    }

    /// Takes every pending method-keyed entry across all channels; used to
    /// fail outstanding RPCs on teardown
    pub(crate) fn drain_pending(&mut self) -> Vec<Entry<T>> {
        let mut drained = Vec::new();
        self.entries.retain(|(_, key), list| {
            if matches!(key, Key::Method(_)) {
                drained.append(list);
                false
            } else {
                true
            }
        });
        drained
    }

    /// Takes every pending method-keyed entry of one channel; used to fail
    /// its outstanding RPCs when the server closes the channel
    pub(crate) fn drain_pending_for(&mut self, channel: u16) -> Vec<Entry<T>> {
        let mut drained = Vec::new();
        self.entries.retain(|(entry_channel, key), list| {
            if *entry_channel == channel && matches!(key, Key::Method(_)) {
                drained.append(list);
                false
            } else {
                true
            }
        });
        drained
    }

    /// Drops everything
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Transport> fmt::Debug for CallbackRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<_> = self
            .entries
            .iter()
            .map(|(key, list)| (key, list.len()))
            .collect();
        f.debug_struct("CallbackRegistry").field("keys", &keys).finish()
    }
}
