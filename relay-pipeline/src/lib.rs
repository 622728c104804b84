#![deny(rust_2018_compatibility)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs)]
//! A six-stage validate/process/notify action pipeline: TriggerListeners,
//! Validators, ValidationListeners, SequentialProcessors, a FinalProcessor,
//! and CompletionListeners, plus pipeline-wide global completion listeners.
//!
//! Keys may be registered in non-overload mode (one parameter signature per
//! key, any mismatch is a hard registration error) or overload mode (one
//! container per distinct signature). Re-entrant calls to [`ActionPipeline::execute`]
//! from within a handler are supported via the same take/put-back dispatch
//! discipline used by `relay-state` and `relay-bus`.

mod container;
mod error;
mod handle;
mod pipeline;
mod result;
mod sink;

pub use error::PipelineError;
pub use handle::Handle;
pub use pipeline::ActionPipeline;
pub use result::ActionResult;
pub use sink::DiagnosticSink;
pub use relay_bus::Signature;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn sequential_processors_run_in_priority_order() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o1 = order.clone();
        pipeline
            .add_processor::<(i32,)>("inc", false, 10, "second", move |_, _| {
                o1.borrow_mut().push("second");
                Ok(())
            })
            .unwrap();
        let o2 = order.clone();
        pipeline
            .add_processor::<(i32,)>("inc", false, 0, "first", move |_, _| {
                o2.borrow_mut().push("first");
                Ok(())
            })
            .unwrap();

        let result = pipeline.execute("inc", (1,));
        assert!(result.success);
        assert_eq!(result.total_processors, 2);
        assert_eq!(result.executed_processors, 2);
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn validator_rejection_skips_processors_and_container_completion() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        let processor_ran = Rc::new(RefCell::new(false));
        let completion_ran = Rc::new(RefCell::new(false));

        pipeline
            .add_validator::<(i32,)>("set", false, 0, "must be positive", |args: &(i32,), _| {
                Ok(args.0 > 0)
            })
            .unwrap();

        let p = processor_ran.clone();
        pipeline
            .add_processor::<(i32,)>("set", false, 0, "apply", move |_, _| {
                *p.borrow_mut() = true;
                Ok(())
            })
            .unwrap();

        let c = completion_ran.clone();
        pipeline
            .add_completion_listener::<(i32,)>("set", false, 0, "notify", move |_, _| {
                *c.borrow_mut() = true;
                Ok(())
            })
            .unwrap();

        let result = pipeline.execute("set", (-1,));
        assert!(!result.success);
        assert!(!result.validation_passed);
        assert_eq!(result.executed_processors, 0);
        assert!(!*processor_ran.borrow());
        assert!(!*completion_ran.borrow());
    }

    #[test]
    fn void_validator_always_passes_even_on_its_own_error() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        pipeline
            .add_void_validator::<(i32,)>("set", false, 0, "audit", |_, _| Err("ignored".into()))
            .unwrap();
        pipeline
            .add_processor::<(i32,)>("set", false, 0, "apply", |_, _| Ok(()))
            .unwrap();

        let result = pipeline.execute("set", (1,));
        assert!(result.success);
        assert!(result.validation_passed);
    }

    #[test]
    fn processor_error_aborts_final_processor_and_completion_listeners() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        let final_ran = Rc::new(RefCell::new(false));
        let completion_ran = Rc::new(RefCell::new(false));

        pipeline
            .add_processor::<(i32,)>("set", false, 0, "fails", |_, _| Err("boom".to_string()))
            .unwrap();
        let f = final_ran.clone();
        pipeline
            .set_final_processor::<(i32,)>("set", false, "final", move |_, _| {
                *f.borrow_mut() = true;
                Ok(())
            })
            .unwrap();
        let c = completion_ran.clone();
        pipeline
            .add_completion_listener::<(i32,)>("set", false, 0, "notify", move |_, _| {
                *c.borrow_mut() = true;
                Ok(())
            })
            .unwrap();

        let result = pipeline.execute("set", (1,));
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("boom"));
        assert!(!*final_ran.borrow());
        assert!(!*completion_ran.borrow());
    }

    #[test]
    fn overload_mode_routes_by_parameter_signature() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        let int_ran = Rc::new(RefCell::new(false));
        let string_ran = Rc::new(RefCell::new(false));

        let i = int_ran.clone();
        pipeline
            .add_processor::<(i32,)>("value", true, 0, "int handler", move |_, _| {
                *i.borrow_mut() = true;
                Ok(())
            })
            .unwrap();
        let s = string_ran.clone();
        pipeline
            .add_processor::<(String,)>("value", true, 0, "string handler", move |_, _| {
                *s.borrow_mut() = true;
                Ok(())
            })
            .unwrap();

        let int_result = pipeline.execute("value", (7,));
        assert!(int_result.success);
        assert!(*int_ran.borrow());
        assert!(!*string_ran.borrow());

        let string_result = pipeline.execute("value", ("hi".to_string(),));
        assert!(string_result.success);
        assert!(*string_ran.borrow());

        // No handler registered for an f32 signature: execution fails cleanly.
        let float_result = pipeline.execute("value", (1.0f32,));
        assert!(!float_result.success);
    }

    #[test]
    fn non_overload_mode_rejects_a_second_signature() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        pipeline
            .add_processor::<(i32,)>("value", false, 0, "int handler", |_, _| Ok(()))
            .unwrap();

        let err = pipeline
            .add_processor::<(String,)>("value", false, 0, "string handler", |_, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::SignatureMismatch { .. }));
    }

    #[test]
    fn global_completion_listener_fires_even_on_unknown_key() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        pipeline.add_global_completion_listener(0, move |key, result, _| {
            s.borrow_mut().push((*key, result.success));
        });

        let result = pipeline.execute("never-registered", (1i32,));
        assert!(!result.success);
        assert_eq!(*seen.borrow(), vec![("never-registered", false)]);
    }

    #[test]
    fn global_completion_listener_fires_on_successful_execution_too() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        pipeline
            .add_processor::<(i32,)>("set", false, 0, "apply", |_, _| Ok(()))
            .unwrap();
        let fired = Rc::new(RefCell::new(0));
        let f = fired.clone();
        pipeline.add_global_completion_listener(0, move |_, _, _| {
            *f.borrow_mut() += 1;
        });

        pipeline.execute("set", (1,));
        pipeline.execute("set", (2,));
        assert_eq!(*fired.borrow(), 2);
    }

    #[test]
    fn removing_a_handler_prunes_empty_overloaded_containers() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        let handle = pipeline
            .add_processor::<(i32,)>("value", true, 0, "only handler", |_, _| Ok(()))
            .unwrap();
        assert!(pipeline.remove_handler(handle));

        let result = pipeline.execute("value", (1,));
        assert!(!result.success);
    }

    #[test]
    fn reentrant_execute_from_within_a_processor_is_observed() {
        let mut pipeline: ActionPipeline<&str> = ActionPipeline::new();
        let inner_ran = Rc::new(RefCell::new(false));
        let i = inner_ran.clone();
        pipeline
            .add_processor::<(i32,)>("inner", false, 0, "target", move |_, _| {
                *i.borrow_mut() = true;
                Ok(())
            })
            .unwrap();

        pipeline
            .add_processor::<(i32,)>("outer", false, 0, "delegates", |args, pipeline| {
                pipeline.execute("inner", *args);
                Ok(())
            })
            .unwrap();

        let result = pipeline.execute("outer", (5,));
        assert!(result.success);
        assert!(*inner_ran.borrow());
    }
}
