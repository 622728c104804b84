use std::any::{Any, TypeId};

use crate::handle::Handle;

pub(crate) struct HandlerSlot {
    pub(crate) handle: Handle,
    pub(crate) priority: i32,
    #[allow(dead_code)] // carried for future introspection/printing
    pub(crate) description: String,
    // `None` while a re-entrant call elsewhere is mid-invocation for this handler.
    pub(crate) callback: Option<Box<dyn Any>>,
}

impl HandlerSlot {
    pub(crate) fn new(handle: Handle, priority: i32, description: String, callback: Box<dyn Any>) -> Self {
        Self {
            handle,
            priority,
            description,
            callback: Some(callback),
        }
    }
}

/// Insert `slot` into `bucket`, keeping it sorted by ascending priority; ties
/// keep insertion order, since [`Vec::sort_by_key`] is a stable sort.
pub(crate) fn insert_sorted(bucket: &mut Vec<HandlerSlot>, slot: HandlerSlot) {
    bucket.push(slot);
    bucket.sort_by_key(|s| s.priority);
}

/// Which stage (and, for overload mode, which container) a handle belongs
/// to, so [`crate::ActionPipeline::remove_handler`] can find it in O(1)
/// beyond a single container lookup rather than scanning every key.
#[derive(Clone, Copy)]
pub(crate) enum HandlerLocation {
    Trigger(TypeId),
    Validator(TypeId),
    ValidationListener(TypeId),
    Processor(TypeId),
    Final(TypeId),
    Completion(TypeId),
    Global,
}

/// The six handler populations for one (key, parameter-signature) pair.
pub(crate) struct Container {
    pub(crate) type_id: TypeId,
    pub(crate) arity: usize,
    pub(crate) signature: &'static str,
    pub(crate) triggers: Vec<HandlerSlot>,
    pub(crate) validators: Vec<HandlerSlot>,
    pub(crate) validation_listeners: Vec<HandlerSlot>,
    pub(crate) processors: Vec<HandlerSlot>,
    pub(crate) final_processor: Option<HandlerSlot>,
    pub(crate) completion_listeners: Vec<HandlerSlot>,
}

impl Container {
    pub(crate) fn new(type_id: TypeId, arity: usize, signature: &'static str) -> Self {
        Self {
            type_id,
            arity,
            signature,
            triggers: Vec::new(),
            validators: Vec::new(),
            validation_listeners: Vec::new(),
            processors: Vec::new(),
            final_processor: None,
            completion_listeners: Vec::new(),
        }
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.triggers.len()
            + self.validators.len()
            + self.validation_listeners.len()
            + self.processors.len()
            + self.final_processor.is_some() as usize
            + self.completion_listeners.len()
    }
}

/// The registration mode for a single key.
pub(crate) enum Registry {
    /// Exactly one container; later registrations with a different
    /// signature are rejected with [`crate::PipelineError::SignatureMismatch`].
    Single(Container),
    /// One container per distinct (arity, signature) pair.
    Overloaded(Vec<Container>),
}
