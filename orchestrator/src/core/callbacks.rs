//! Handle-based dispatch table for callbacks invoked from execution units

use std::collections::HashMap;

use shared::{ArtifactKey, CallbackHandle, CallbackReply};

type Callback<'a> = Box<dyn FnMut(ArtifactKey) + Send + 'a>;

/// Local closures reachable from units through a [`CallbackHandle`]
#[derive(Default)]
pub struct CallbackRegistry<'a> {
    next: u64,
    callbacks: HashMap<CallbackHandle, Callback<'a>>,
}

impl<'a> CallbackRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` and return the handle units use to reach it
    pub fn register<F>(&mut self, callback: F) -> CallbackHandle
    where
        F: FnMut(ArtifactKey) + Send + 'a,
    {
        self.next += 1;
        let handle = CallbackHandle(self.next);
        self.callbacks.insert(handle, Box::new(callback));
        handle
    }

    /// Run the callback behind `handle`
    pub fn dispatch(&mut self, handle: CallbackHandle, key: ArtifactKey) -> CallbackReply {
        match self.callbacks.get_mut(&handle) {
            Some(callback) => {
                callback(key);
                CallbackReply::Delivered
            }
            None => CallbackReply::UnknownHandle,
        }
    }

    pub fn release(&mut self, handle: CallbackHandle) -> bool {
        self.callbacks.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}
