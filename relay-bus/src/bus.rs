use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;

use crate::handle::{instance_salt, Handle};
use crate::result::{Mode, PublishResult};
use crate::signature::Signature;
use crate::sink::DiagnosticSink;

struct HandlerSlot {
    handle: Handle,
    once: bool,
    type_id: TypeId,
    signature: &'static str,
    // `None` while a re-entrant dispatch elsewhere is mid-call for this handler.
    callback: Option<Box<dyn Any>>,
}

#[derive(Default)]
struct KeyEntry {
    multicast: Vec<HandlerSlot>,
    unicast: Vec<HandlerSlot>,
}

impl KeyEntry {
    fn bucket(&self, mode: Mode) -> &Vec<HandlerSlot> {
        match mode {
            Mode::Multicast => &self.multicast,
            Mode::Unicast => &self.unicast,
        }
    }

    fn bucket_mut(&mut self, mode: Mode) -> &mut Vec<HandlerSlot> {
        match mode {
            Mode::Multicast => &mut self.multicast,
            Mode::Unicast => &mut self.unicast,
        }
    }
}

/// A type-erased, key-addressed multicast/unicast event bus.
///
/// Handlers are generic closures `FnMut(Args, &mut EventBus<K>)`; `Args` is
/// any tuple type implementing [`Signature`] (every tuple of arity 0..=9
/// does, blanket-implemented). A single key may carry handlers of differing
/// signatures simultaneously: `publish` matches each candidate's registered
/// signature against the published one and skips (counting as failed) any
/// that don't match, rather than refusing to register them up front.
///
/// Dispatch is re-entrant: a handler may call back into the same bus,
/// including publishing to the key it is itself being called from.
pub struct EventBus<K> {
    entries: HashMap<K, KeyEntry>,
    handle_keys: HashMap<Handle, K>,
    salt: u64,
    next_id: u64,
    sink: DiagnosticSink,
}

impl<K> Default for EventBus<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            handle_keys: HashMap::new(),
            salt: instance_salt(),
            next_id: 1,
            sink: DiagnosticSink::default(),
        }
    }
}

impl<K> EventBus<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a diagnostic sink, replacing the default stderr printer.
    pub fn set_diagnostic_sink(&mut self, sink: impl Fn(&str) + 'static) {
        self.sink = DiagnosticSink::new(sink);
    }

    fn fresh_handle(&mut self) -> Handle {
        let id = self.next_id;
        self.next_id += 1;
        Handle::new(self.salt, id)
    }

    /// Register a multicast handler for `key`. Delivery visits all
    /// multicast handlers for a key in registration order.
    pub fn subscribe<Args>(&mut self, key: K, once: bool, callback: impl FnMut(Args, &mut EventBus<K>) + 'static) -> Handle
    where
        Args: Signature,
    {
        let handle = self.fresh_handle();
        let slot = HandlerSlot {
            handle,
            once,
            type_id: TypeId::of::<Args>(),
            signature: Args::canonical(),
            callback: Some(Box::new(Box::new(callback) as Box<dyn FnMut(Args, &mut EventBus<K>)>)),
        };
        self.entries.entry(key.clone()).or_default().multicast.push(slot);
        self.handle_keys.insert(handle, key);
        handle
    }

    /// Register the unicast handler for `key`, evicting and dropping
    /// whatever unicast handler `key` previously had.
    pub fn subscribe_unicast<Args>(&mut self, key: K, once: bool, callback: impl FnMut(Args, &mut EventBus<K>) + 'static) -> Handle
    where
        Args: Signature,
    {
        let entry = self.entries.entry(key.clone()).or_default();
        for evicted in entry.unicast.drain(..) {
            self.handle_keys.remove(&evicted.handle);
        }
        let handle = self.fresh_handle();
        let slot = HandlerSlot {
            handle,
            once,
            type_id: TypeId::of::<Args>(),
            signature: Args::canonical(),
            callback: Some(Box::new(Box::new(callback) as Box<dyn FnMut(Args, &mut EventBus<K>)>)),
        };
        self.entries.get_mut(&key).unwrap().unicast.push(slot);
        self.handle_keys.insert(handle, key);
        handle
    }

    /// Unregister a handler by handle, from whichever bucket holds it.
    /// Returns whether a handler was actually removed.
    pub fn unsubscribe(&mut self, handle: Handle) -> bool {
        let Some(key) = self.handle_keys.remove(&handle) else {
            return false;
        };
        if let Some(entry) = self.entries.get_mut(&key) {
            let before = entry.multicast.len() + entry.unicast.len();
            entry.multicast.retain(|s| s.handle != handle);
            entry.unicast.retain(|s| s.handle != handle);
            return entry.multicast.len() + entry.unicast.len() != before;
        }
        false
    }

    /// How many handlers (of any signature) are registered for `key` in
    /// the given bucket.
    pub fn subscriber_count(&self, key: &K, mode: Mode) -> usize {
        self.entries.get(key).map(|e| e.bucket(mode).len()).unwrap_or(0)
    }

    fn take(&mut self, key: &K, mode: Mode, handle: Handle) -> Option<(Box<dyn Any>, bool)> {
        let entry = self.entries.get_mut(key)?;
        let slot = entry.bucket_mut(mode).iter_mut().find(|s| s.handle == handle)?;
        let cb = slot.callback.take()?;
        Some((cb, slot.once))
    }

    fn put_back(&mut self, key: &K, mode: Mode, handle: Handle, cb: Box<dyn Any>) {
        if let Some(entry) = self.entries.get_mut(key) {
            if let Some(slot) = entry.bucket_mut(mode).iter_mut().find(|s| s.handle == handle) {
                slot.callback = Some(cb);
            }
        }
    }

    fn drop_handler(&mut self, key: &K, mode: Mode, handle: Handle) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.bucket_mut(mode).retain(|s| s.handle != handle);
        }
        self.handle_keys.remove(&handle);
    }

    /// Publish `args` to `key`'s handlers in `mode`.
    ///
    /// Candidates are matched against `Args`'s signature; the first match
    /// receives `args` by value, later matches each receive a fresh
    /// `args.clone()`. Mismatched candidates count as failed but do not
    /// abort delivery to the rest.
    pub fn publish<Args>(&mut self, key: &K, mode: Mode, args: Args) -> PublishResult
    where
        Args: Signature + Clone,
    {
        let published_signature = Args::canonical();
        let Some(entry) = self.entries.get(key) else {
            self.sink.report(&format!("relay-bus: publish to unknown key (signature `{published_signature}`)"));
            return PublishResult {
                success: false,
                mode,
                total: 0,
                successful: 0,
                failed: 0,
                published_signature,
                failed_signatures: Vec::new(),
                expected_signatures: Vec::new(),
                diagnostic: Some("key not found".to_string()),
            };
        };
        let snapshot: Vec<(Handle, TypeId, &'static str)> = entry
            .bucket(mode)
            .iter()
            .filter(|s| s.callback.is_some())
            .map(|s| (s.handle, s.type_id, s.signature))
            .collect();

        let total = snapshot.len();
        let mut successful = 0usize;
        let mut failed = 0usize;
        let mut failed_signatures = Vec::new();
        let expected_signatures: Vec<&'static str> = snapshot.iter().map(|(_, _, sig)| *sig).collect();
        let target = TypeId::of::<Args>();
        // The first matching handler consumes `args` by value; every later match
        // receives a clone taken from this template, per the "first handler gets
        // the original, later handlers get clones" contract.
        let template = args.clone();
        let mut original = Some(args);

        for (handle, type_id, signature) in snapshot {
            if type_id != target {
                failed += 1;
                failed_signatures.push(signature);
                continue;
            }
            let Some((mut cb_any, once)) = self.take(key, mode, handle) else {
                continue; // removed, or mid-dispatch in an outer call
            };
            let call_args = original.take().unwrap_or_else(|| template.clone());
            let handler = cb_any
                .downcast_mut::<Box<dyn FnMut(Args, &mut EventBus<K>)>>()
                .expect("type_id matched, so the concrete closure type must match too");
            handler(call_args, self);
            successful += 1;
            if once {
                self.drop_handler(key, mode, handle);
            } else {
                self.put_back(key, mode, handle, cb_any);
            }
        }

        PublishResult {
            success: successful > 0,
            mode,
            total,
            successful,
            failed,
            published_signature,
            failed_signatures,
            expected_signatures,
            diagnostic: if successful == 0 { Some("no handler executed successfully".to_string()) } else { None },
        }
    }
}
