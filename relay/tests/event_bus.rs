use std::cell::RefCell;
use std::rc::Rc;

use relay::bus::{EventBus, Mode};

#[test]
fn multicast_fans_out_to_every_subscriber_through_the_facade() {
    let mut bus: EventBus<&'static str> = EventBus::new();
    let totals = Rc::new(RefCell::new(Vec::new()));
    for id in 0..3 {
        let totals = totals.clone();
        bus.subscribe::<(i32,)>("tick", false, move |args: (i32,), _| {
            totals.borrow_mut().push((id, args.0));
        });
    }

    let result = bus.publish(&"tick", Mode::Multicast, (7,));
    assert!(result.success);
    assert_eq!(result.successful, 3);
    assert_eq!(totals.borrow().len(), 3);
}

#[test]
fn unicast_subscription_replaces_any_previous_handler() {
    let mut bus: EventBus<&'static str> = EventBus::new();
    let first_called = Rc::new(RefCell::new(false));
    let second_called = Rc::new(RefCell::new(false));

    let f = first_called.clone();
    bus.subscribe_unicast::<(i32,)>("set", false, move |_, _| {
        *f.borrow_mut() = true;
    });
    let s = second_called.clone();
    bus.subscribe_unicast::<(i32,)>("set", false, move |_, _| {
        *s.borrow_mut() = true;
    });

    let result = bus.publish(&"set", Mode::Unicast, (1,));
    assert_eq!(result.successful, 1);
    assert!(!*first_called.borrow());
    assert!(*second_called.borrow());
}
