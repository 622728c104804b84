use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::Hash;

use relay_bus::Signature;

use crate::container::{insert_sorted, Container, HandlerLocation, HandlerSlot, Registry};
use crate::error::PipelineError;
use crate::handle::{instance_salt, Handle};
use crate::result::ActionResult;
use crate::sink::DiagnosticSink;

type VoidFn<Args, K> = Box<dyn FnMut(&Args, &mut ActionPipeline<K>) -> Result<(), String>>;
type ValidatorFn<Args, K> = Box<dyn FnMut(&Args, &mut ActionPipeline<K>) -> Result<bool, String>>;

#[derive(Clone, Copy)]
enum Stage {
    Trigger,
    Validator,
    ValidationListener,
    Processor,
    Completion,
}

fn location_for(stage: Stage, type_id: TypeId) -> HandlerLocation {
    match stage {
        Stage::Trigger => HandlerLocation::Trigger(type_id),
        Stage::Validator => HandlerLocation::Validator(type_id),
        Stage::ValidationListener => HandlerLocation::ValidationListener(type_id),
        Stage::Processor => HandlerLocation::Processor(type_id),
        Stage::Completion => HandlerLocation::Completion(type_id),
    }
}

fn location_type_id(location: HandlerLocation) -> Option<TypeId> {
    match location {
        HandlerLocation::Trigger(t)
        | HandlerLocation::Validator(t)
        | HandlerLocation::ValidationListener(t)
        | HandlerLocation::Processor(t)
        | HandlerLocation::Final(t)
        | HandlerLocation::Completion(t) => Some(t),
        HandlerLocation::Global => None,
    }
}

fn remove_from_bucket(bucket: &mut Vec<HandlerSlot>, handle: Handle) -> bool {
    let before = bucket.len();
    bucket.retain(|s| s.handle != handle);
    bucket.len() != before
}

fn remove_from_container(container: &mut Container, handle: Handle, location: HandlerLocation) -> bool {
    match location {
        HandlerLocation::Trigger(_) => remove_from_bucket(&mut container.triggers, handle),
        HandlerLocation::Validator(_) => remove_from_bucket(&mut container.validators, handle),
        HandlerLocation::ValidationListener(_) => remove_from_bucket(&mut container.validation_listeners, handle),
        HandlerLocation::Processor(_) => remove_from_bucket(&mut container.processors, handle),
        HandlerLocation::Completion(_) => remove_from_bucket(&mut container.completion_listeners, handle),
        HandlerLocation::Final(_) => {
            if container.final_processor.as_ref().map(|s| s.handle) == Some(handle) {
                container.final_processor = None;
                true
            } else {
                false
            }
        }
        HandlerLocation::Global => false,
    }
}

fn resolve_container<'a, Args, K>(
    registries: &'a mut HashMap<K, Registry>,
    key: &K,
    overload: bool,
) -> Result<&'a mut Container, PipelineError>
where
    Args: Signature,
    K: Eq + Hash + Clone,
{
    let type_id = TypeId::of::<Args>();
    let signature = Args::canonical();
    let arity = Args::ARITY;

    if !registries.contains_key(key) {
        let container = Container::new(type_id, arity, signature);
        let registry = if overload {
            Registry::Overloaded(vec![container])
        } else {
            Registry::Single(container)
        };
        registries.insert(key.clone(), registry);
    }

    // The `overload` flag is only consulted on this first registration,
    // which establishes the key's registry mode; later calls follow
    // whatever mode is already on file, regardless of their own flag.
    let registry = registries.get_mut(key).expect("just inserted above");
    match registry {
        Registry::Single(c) => {
            if c.type_id != type_id {
                return Err(PipelineError::SignatureMismatch {
                    registered: c.signature,
                    requested: signature,
                });
            }
            Ok(c)
        }
        Registry::Overloaded(containers) => {
            if let Some(idx) = containers.iter().position(|c| c.type_id == type_id) {
                Ok(&mut containers[idx])
            } else {
                containers.push(Container::new(type_id, arity, signature));
                let last = containers.len() - 1;
                Ok(&mut containers[last])
            }
        }
    }
}

struct GlobalSlot<K> {
    handle: Handle,
    priority: i32,
    callback: Option<Box<dyn FnMut(&K, &ActionResult, &mut ActionPipeline<K>)>>,
}

/// A six-stage validate/process/notify pipeline keyed by `K`, with
/// per-key overload support and re-entrant-safe dispatch.
pub struct ActionPipeline<K> {
    registries: HashMap<K, Registry>,
    handle_index: HashMap<Handle, (Option<K>, HandlerLocation)>,
    global_completion: Vec<GlobalSlot<K>>,
    salt: u64,
    next_id: u64,
    sink: DiagnosticSink,
}

impl<K> Default for ActionPipeline<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ActionPipeline<K> {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            registries: HashMap::new(),
            handle_index: HashMap::new(),
            global_completion: Vec::new(),
            salt: instance_salt(),
            next_id: 0,
            sink: DiagnosticSink::default(),
        }
    }

    /// Replace the diagnostic sink used to report unmatched executions.
    pub fn set_diagnostic_sink(&mut self, sink: DiagnosticSink) {
        self.sink = sink;
    }

    fn fresh_handle(&mut self) -> Handle {
        let handle = Handle::new(self.salt, self.next_id);
        self.next_id += 1;
        handle
    }
}

impl<K: Eq + Hash + Clone + 'static> ActionPipeline<K> {
    fn register_void<Args>(
        &mut self,
        key: K,
        overload: bool,
        priority: i32,
        description: String,
        stage: Stage,
        callback: VoidFn<Args, K>,
    ) -> Result<Handle, PipelineError>
    where
        Args: Signature,
    {
        let handle = self.fresh_handle();
        let type_id = TypeId::of::<Args>();
        let container = resolve_container::<Args, K>(&mut self.registries, &key, overload)?;
        let slot = HandlerSlot::new(handle, priority, description, Box::new(callback));
        let bucket = match stage {
            Stage::Trigger => &mut container.triggers,
            Stage::ValidationListener => &mut container.validation_listeners,
            Stage::Processor => &mut container.processors,
            Stage::Completion => &mut container.completion_listeners,
            Stage::Validator => unreachable!("validators are registered through add_validator"),
        };
        insert_sorted(bucket, slot);
        self.handle_index.insert(handle, (Some(key), location_for(stage, type_id)));
        Ok(handle)
    }

    /// Register a handler that runs at the very start of [`Self::execute`],
    /// for every invocation, with errors collected but never aborting.
    pub fn add_trigger_listener<Args>(
        &mut self,
        key: K,
        overload: bool,
        priority: i32,
        description: impl Into<String>,
        callback: impl FnMut(&Args, &mut Self) -> Result<(), String> + 'static,
    ) -> Result<Handle, PipelineError>
    where
        Args: Signature,
    {
        self.register_void(key, overload, priority, description.into(), Stage::Trigger, Box::new(callback))
    }

    /// Register a native validator: returning `Ok(false)` or `Err` aborts
    /// the remaining stages.
    pub fn add_validator<Args>(
        &mut self,
        key: K,
        overload: bool,
        priority: i32,
        description: impl Into<String>,
        callback: impl FnMut(&Args, &mut Self) -> Result<bool, String> + 'static,
    ) -> Result<Handle, PipelineError>
    where
        Args: Signature,
    {
        let handle = self.fresh_handle();
        let type_id = TypeId::of::<Args>();
        let description = description.into();
        let container = resolve_container::<Args, K>(&mut self.registries, &key, overload)?;
        let boxed: ValidatorFn<Args, K> = Box::new(callback);
        let slot = HandlerSlot::new(handle, priority, description, Box::new(boxed));
        insert_sorted(&mut container.validators, slot);
        self.handle_index
            .insert(handle, (Some(key), HandlerLocation::Validator(type_id)));
        Ok(handle)
    }

    /// Adapt a void-signature handler into a validator: it always runs, and
    /// always reports `Ok(true)` afterward, ignoring even its own error.
    pub fn add_void_validator<Args>(
        &mut self,
        key: K,
        overload: bool,
        priority: i32,
        description: impl Into<String>,
        mut callback: impl FnMut(&Args, &mut Self) -> Result<(), String> + 'static,
    ) -> Result<Handle, PipelineError>
    where
        Args: Signature,
    {
        self.add_validator(key, overload, priority, description, move |args, pipeline| {
            let _ = callback(args, pipeline);
            Ok(true)
        })
    }

    /// Register a handler that runs after validators pass, before
    /// processors; errors are collected but never abort.
    pub fn add_validation_listener<Args>(
        &mut self,
        key: K,
        overload: bool,
        priority: i32,
        description: impl Into<String>,
        callback: impl FnMut(&Args, &mut Self) -> Result<(), String> + 'static,
    ) -> Result<Handle, PipelineError>
    where
        Args: Signature,
    {
        self.register_void(
            key,
            overload,
            priority,
            description.into(),
            Stage::ValidationListener,
            Box::new(callback),
        )
    }

    /// Register a sequential processor. Processors run in priority order;
    /// the first `Err` aborts the remaining processors, the final
    /// processor, and the container's completion listeners.
    pub fn add_processor<Args>(
        &mut self,
        key: K,
        overload: bool,
        priority: i32,
        description: impl Into<String>,
        callback: impl FnMut(&Args, &mut Self) -> Result<(), String> + 'static,
    ) -> Result<Handle, PipelineError>
    where
        Args: Signature,
    {
        self.register_void(key, overload, priority, description.into(), Stage::Processor, Box::new(callback))
    }

    /// Set (replacing any previous) the container's final processor, which
    /// runs after every sequential processor succeeds.
    pub fn set_final_processor<Args>(
        &mut self,
        key: K,
        overload: bool,
        description: impl Into<String>,
        callback: impl FnMut(&Args, &mut Self) -> Result<(), String> + 'static,
    ) -> Result<Handle, PipelineError>
    where
        Args: Signature,
    {
        let handle = self.fresh_handle();
        let type_id = TypeId::of::<Args>();
        let boxed: VoidFn<Args, K> = Box::new(callback);
        let slot = HandlerSlot::new(handle, 0, description.into(), Box::new(boxed));
        let prev_handle = {
            let container = resolve_container::<Args, K>(&mut self.registries, &key, overload)?;
            let prev = container.final_processor.replace(slot).map(|s| s.handle);
            prev
        };
        if let Some(prev) = prev_handle {
            self.handle_index.remove(&prev);
        }
        self.handle_index
            .insert(handle, (Some(key), HandlerLocation::Final(type_id)));
        Ok(handle)
    }

    /// Register a completion listener scoped to this container; it only
    /// fires when the container's execution completes without aborting.
    pub fn add_completion_listener<Args>(
        &mut self,
        key: K,
        overload: bool,
        priority: i32,
        description: impl Into<String>,
        callback: impl FnMut(&Args, &mut Self) -> Result<(), String> + 'static,
    ) -> Result<Handle, PipelineError>
    where
        Args: Signature,
    {
        self.register_void(key, overload, priority, description.into(), Stage::Completion, Box::new(callback))
    }

    /// Register a pipeline-wide completion listener: it fires at the end
    /// of every [`Self::execute`] call, including unmatched keys and
    /// aborted executions.
    pub fn add_global_completion_listener(
        &mut self,
        priority: i32,
        callback: impl FnMut(&K, &ActionResult, &mut Self) + 'static,
    ) -> Handle {
        let handle = self.fresh_handle();
        self.global_completion.push(GlobalSlot {
            handle,
            priority,
            callback: Some(Box::new(callback)),
        });
        self.global_completion.sort_by_key(|s| s.priority);
        self.handle_index.insert(handle, (None, HandlerLocation::Global));
        handle
    }

    /// Remove a previously registered handler by its handle. Returns
    /// `false` if the handle is unknown.
    pub fn remove_handler(&mut self, handle: Handle) -> bool {
        let Some((key, location)) = self.handle_index.remove(&handle) else {
            return false;
        };
        let Some(key) = key else {
            let before = self.global_completion.len();
            self.global_completion.retain(|s| s.handle != handle);
            return self.global_completion.len() != before;
        };

        let removed = {
            match self.registries.get_mut(&key) {
                None => false,
                Some(Registry::Single(c)) => remove_from_container(c, handle, location),
                Some(Registry::Overloaded(containers)) => {
                    let type_id = location_type_id(location);
                    containers
                        .iter_mut()
                        .find(|c| Some(c.type_id) == type_id)
                        .map(|c| remove_from_container(c, handle, location))
                        .unwrap_or(false)
                }
            }
        };

        if let Some(registry) = self.registries.get_mut(&key) {
            let now_empty = match registry {
                Registry::Single(c) => c.handler_count() == 0,
                Registry::Overloaded(containers) => {
                    containers.retain(|c| c.handler_count() > 0);
                    containers.is_empty()
                }
            };
            if now_empty {
                self.registries.remove(&key);
            }
        }

        removed
    }

    fn snapshot_handles(&self, key: &K, type_id: TypeId, stage: Stage) -> Vec<Handle> {
        let Some(registry) = self.registries.get(key) else {
            return Vec::new();
        };
        let container = match registry {
            Registry::Single(c) => Some(c),
            Registry::Overloaded(containers) => containers.iter().find(|c| c.type_id == type_id),
        };
        let Some(container) = container else {
            return Vec::new();
        };
        let bucket = match stage {
            Stage::Trigger => &container.triggers,
            Stage::Validator => &container.validators,
            Stage::ValidationListener => &container.validation_listeners,
            Stage::Processor => &container.processors,
            Stage::Completion => &container.completion_listeners,
        };
        bucket.iter().map(|s| s.handle).collect()
    }

    fn snapshot_final_handle(&self, key: &K, type_id: TypeId) -> Option<Handle> {
        let registry = self.registries.get(key)?;
        let container = match registry {
            Registry::Single(c) => c,
            Registry::Overloaded(containers) => containers.iter().find(|c| c.type_id == type_id)?,
        };
        container.final_processor.as_ref().map(|s| s.handle)
    }

    fn take_callback(&mut self, key: &K, type_id: TypeId, stage: Stage, handle: Handle) -> Option<Box<dyn Any>> {
        let registry = self.registries.get_mut(key)?;
        let container = match registry {
            Registry::Single(c) => c,
            Registry::Overloaded(containers) => containers.iter_mut().find(|c| c.type_id == type_id)?,
        };
        let bucket = match stage {
            Stage::Trigger => &mut container.triggers,
            Stage::Validator => &mut container.validators,
            Stage::ValidationListener => &mut container.validation_listeners,
            Stage::Processor => &mut container.processors,
            Stage::Completion => &mut container.completion_listeners,
        };
        bucket.iter_mut().find(|s| s.handle == handle)?.callback.take()
    }

    fn put_back_callback(&mut self, key: &K, type_id: TypeId, stage: Stage, handle: Handle, cb: Box<dyn Any>) {
        let Some(registry) = self.registries.get_mut(key) else {
            return;
        };
        let container = match registry {
            Registry::Single(c) => Some(c),
            Registry::Overloaded(containers) => containers.iter_mut().find(|c| c.type_id == type_id),
        };
        let Some(container) = container else { return };
        let bucket = match stage {
            Stage::Trigger => &mut container.triggers,
            Stage::Validator => &mut container.validators,
            Stage::ValidationListener => &mut container.validation_listeners,
            Stage::Processor => &mut container.processors,
            Stage::Completion => &mut container.completion_listeners,
        };
        if let Some(slot) = bucket.iter_mut().find(|s| s.handle == handle) {
            slot.callback = Some(cb);
        }
    }

    fn take_final_callback(&mut self, key: &K, type_id: TypeId) -> Option<Box<dyn Any>> {
        let registry = self.registries.get_mut(key)?;
        let container = match registry {
            Registry::Single(c) => c,
            Registry::Overloaded(containers) => containers.iter_mut().find(|c| c.type_id == type_id)?,
        };
        container.final_processor.as_mut()?.callback.take()
    }

    fn put_back_final_callback(&mut self, key: &K, type_id: TypeId, cb: Box<dyn Any>) {
        let Some(registry) = self.registries.get_mut(key) else {
            return;
        };
        let container = match registry {
            Registry::Single(c) => Some(c),
            Registry::Overloaded(containers) => containers.iter_mut().find(|c| c.type_id == type_id),
        };
        if let Some(slot) = container.and_then(|c| c.final_processor.as_mut()) {
            slot.callback = Some(cb);
        }
    }

    fn take_global_callback(
        &mut self,
        handle: Handle,
    ) -> Option<Box<dyn FnMut(&K, &ActionResult, &mut ActionPipeline<K>)>> {
        self.global_completion
            .iter_mut()
            .find(|s| s.handle == handle)?
            .callback
            .take()
    }

    fn put_back_global_callback(
        &mut self,
        handle: Handle,
        cb: Box<dyn FnMut(&K, &ActionResult, &mut ActionPipeline<K>)>,
    ) {
        if let Some(slot) = self.global_completion.iter_mut().find(|s| s.handle == handle) {
            slot.callback = Some(cb);
        }
    }

    fn fire_global_completion(&mut self, key: &K, result: &ActionResult) {
        let handles: Vec<Handle> = self.global_completion.iter().map(|s| s.handle).collect();
        for handle in handles {
            let Some(mut cb) = self.take_global_callback(handle) else {
                continue;
            };
            cb(key, result, self);
            self.put_back_global_callback(handle, cb);
        }
    }

    /// Run the six-stage pipeline for `key` against `args`. Always returns
    /// a result (never panics on an unmatched key or signature), and always
    /// fires registered global completion listeners before returning.
    pub fn execute<Args>(&mut self, key: K, args: Args) -> ActionResult
    where
        Args: Signature,
    {
        let type_id = TypeId::of::<Args>();
        let signature = Args::canonical();
        let mut diagnostics = Vec::new();

        let matched = match self.registries.get(&key) {
            Some(Registry::Single(c)) => c.type_id == type_id,
            Some(Registry::Overloaded(containers)) => containers.iter().any(|c| c.type_id == type_id),
            None => false,
        };

        if !matched {
            let msg = format!("no handler registered for key matching signature `{signature}`");
            self.sink.report(&msg);
            let result = ActionResult {
                success: false,
                validation_passed: false,
                signature,
                total_processors: 0,
                executed_processors: 0,
                completion_listeners_fired: 0,
                error_message: Some(msg.clone()),
                diagnostics: vec![msg],
            };
            self.fire_global_completion(&key, &result);
            return result;
        }

        for handle in self.snapshot_handles(&key, type_id, Stage::Trigger) {
            let Some(mut cb) = self.take_callback(&key, type_id, Stage::Trigger, handle) else {
                continue;
            };
            if let Some(f) = cb.downcast_mut::<VoidFn<Args, K>>() {
                if let Err(e) = f(&args, self) {
                    diagnostics.push(format!("trigger listener error: {e}"));
                }
            }
            self.put_back_callback(&key, type_id, Stage::Trigger, handle, cb);
        }

        let mut validation_passed = true;
        let mut abort_message: Option<String> = None;
        for handle in self.snapshot_handles(&key, type_id, Stage::Validator) {
            let Some(mut cb) = self.take_callback(&key, type_id, Stage::Validator, handle) else {
                continue;
            };
            let outcome = match cb.downcast_mut::<ValidatorFn<Args, K>>() {
                Some(f) => Some(f(&args, self)),
                None => None,
            };
            self.put_back_callback(&key, type_id, Stage::Validator, handle, cb);
            match outcome {
                Some(Ok(true)) | None => {}
                Some(Ok(false)) => {
                    validation_passed = false;
                    abort_message = Some("validator rejected the action".to_string());
                    break;
                }
                Some(Err(e)) => {
                    validation_passed = false;
                    diagnostics.push(format!("validator error: {e}"));
                    abort_message = Some(e);
                    break;
                }
            }
        }

        if !validation_passed {
            let msg = abort_message.unwrap_or_else(|| "validation failed".to_string());
            if diagnostics.last().map(String::as_str) != Some(msg.as_str()) {
                diagnostics.push(msg.clone());
            }
            let result = ActionResult {
                success: false,
                validation_passed: false,
                signature,
                total_processors: 0,
                executed_processors: 0,
                completion_listeners_fired: 0,
                error_message: Some(msg),
                diagnostics,
            };
            self.fire_global_completion(&key, &result);
            return result;
        }

        for handle in self.snapshot_handles(&key, type_id, Stage::ValidationListener) {
            let Some(mut cb) = self.take_callback(&key, type_id, Stage::ValidationListener, handle) else {
                continue;
            };
            if let Some(f) = cb.downcast_mut::<VoidFn<Args, K>>() {
                if let Err(e) = f(&args, self) {
                    diagnostics.push(format!("validation listener error: {e}"));
                }
            }
            self.put_back_callback(&key, type_id, Stage::ValidationListener, handle, cb);
        }

        let processor_handles = self.snapshot_handles(&key, type_id, Stage::Processor);
        let final_handle = self.snapshot_final_handle(&key, type_id);
        let total_processors = processor_handles.len() + final_handle.is_some() as usize;
        let mut executed_processors = 0;
        let mut processor_error: Option<String> = None;

        for handle in processor_handles {
            let Some(mut cb) = self.take_callback(&key, type_id, Stage::Processor, handle) else {
                continue;
            };
            let outcome = match cb.downcast_mut::<VoidFn<Args, K>>() {
                Some(f) => Some(f(&args, self)),
                None => None,
            };
            self.put_back_callback(&key, type_id, Stage::Processor, handle, cb);
            match outcome {
                Some(Ok(())) => executed_processors += 1,
                Some(Err(e)) => {
                    diagnostics.push(format!("processor error: {e}"));
                    processor_error = Some(e);
                    break;
                }
                None => {}
            }
        }

        if processor_error.is_none() && final_handle.is_some() {
            if let Some(mut cb) = self.take_final_callback(&key, type_id) {
                let outcome = match cb.downcast_mut::<VoidFn<Args, K>>() {
                    Some(f) => Some(f(&args, self)),
                    None => None,
                };
                self.put_back_final_callback(&key, type_id, cb);
                match outcome {
                    Some(Ok(())) => executed_processors += 1,
                    Some(Err(e)) => {
                        diagnostics.push(format!("final processor error: {e}"));
                        processor_error = Some(e);
                    }
                    None => {}
                }
            }
        }

        let mut completion_listeners_fired = 0;
        if processor_error.is_none() {
            for handle in self.snapshot_handles(&key, type_id, Stage::Completion) {
                let Some(mut cb) = self.take_callback(&key, type_id, Stage::Completion, handle) else {
                    continue;
                };
                if let Some(f) = cb.downcast_mut::<VoidFn<Args, K>>() {
                    if let Err(e) = f(&args, self) {
                        diagnostics.push(format!("completion listener error: {e}"));
                    }
                    completion_listeners_fired += 1;
                }
                self.put_back_callback(&key, type_id, Stage::Completion, handle, cb);
            }
        }

        let result = ActionResult {
            success: processor_error.is_none(),
            validation_passed: true,
            signature,
            total_processors,
            executed_processors,
            completion_listeners_fired,
            error_message: processor_error,
            diagnostics,
        };
        self.fire_global_completion(&key, &result);
        result
    }
}
