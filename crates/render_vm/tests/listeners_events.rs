use dom::Document;
use render_test_support::StreamBuilder;
use render_vm::{DomEvent, RenderError, RenderVm};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

fn button_doc() -> Document {
    Document::from_markup(r#"<div id="app"><button id="go" class="cta">Go</button></div>"#)
}

fn register_click(vm: &mut RenderVm, doc: &mut Document) {
    let stream = StreamBuilder::new()
        .select_mount_point("#app", "div")
        .move_to_first_child()
        .set_element("button")
        .set_event_listener("0.1", "click", false, false)
        .remove_other_event_listeners("0.1")
        .move_to_parent()
        .end()
        .finish();
    vm.apply(doc, &stream).unwrap();
}

#[test]
fn envelope_carries_registration_and_summary() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    register_click(&mut vm, &mut doc);

    let payloads: Rc<RefCell<Vec<Vec<u8>>>> = Rc::default();
    let sink = Rc::clone(&payloads);
    vm.set_event_handler(move |scope| {
        // The length prefix must frame exactly the JSON payload.
        let envelope = scope.envelope();
        let len = u32::from_be_bytes(envelope[..4].try_into().unwrap()) as usize;
        assert_eq!(len, scope.payload().len());
        sink.borrow_mut().push(scope.payload().to_vec());
    });

    let button = doc.query("#go").unwrap();
    let event = DomEvent::new("click")
        .with_field("clientX", 14)
        .with_field("shiftKey", true)
        .with_field("path", serde_json::json!({"nested": true}));
    let outcome = vm.dispatch_event(&doc, button, &event).unwrap();
    assert_eq!(outcome.delivered, 1);
    assert!(!outcome.default_prevented);

    let payloads = payloads.borrow();
    let envelope: Value = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(envelope["position_id"], "0.1");
    assert_eq!(envelope["event_type"], "click");
    assert_eq!(envelope["capture"], false);
    assert_eq!(envelope["passive"], false);

    let summary = &envelope["event_summary"];
    assert_eq!(summary["type"], "click");
    assert_eq!(summary["clientX"], 14);
    assert_eq!(summary["shiftKey"], true);
    // Structured fields are dropped from the projection.
    assert!(summary.get("path").is_none());
    assert_eq!(summary["target"]["tagName"], "BUTTON");
    assert_eq!(summary["target"]["id"], "go");
    assert_eq!(summary["target"]["class"], "cta");
}

#[test]
fn no_active_event_outside_dispatch() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    register_click(&mut vm, &mut doc);

    assert!(vm.active_event().is_none());
    assert_eq!(vm.active_event_target(), None);
    assert_eq!(vm.active_event_current_target(), None);
    // Proxies are no-ops with no active event.
    vm.active_event_prevent_default();
    vm.active_event_stop_propagation();
}

#[test]
fn prevent_default_is_reported_in_the_outcome() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    register_click(&mut vm, &mut doc);
    vm.set_event_handler(|mut scope| scope.prevent_default());

    let button = doc.query("#go").unwrap();
    let outcome = vm
        .dispatch_event(&doc, button, &DomEvent::new("click"))
        .unwrap();
    assert!(outcome.default_prevented);
}

#[test]
fn capture_listeners_run_before_bubble_listeners() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    let stream = StreamBuilder::new()
        .select_mount_point("#app", "div")
        .set_event_listener("0", "click", true, false)
        .set_event_listener("0", "click", false, false)
        .move_to_first_child()
        .set_element("button")
        .set_event_listener("0.1", "click", false, false)
        .move_to_parent()
        .end()
        .finish();
    vm.apply(&mut doc, &stream).unwrap();

    let order: Rc<RefCell<Vec<(String, bool)>>> = Rc::default();
    let sink = Rc::clone(&order);
    vm.set_event_handler(move |scope| {
        let envelope: Value = serde_json::from_slice(scope.payload()).unwrap();
        sink.borrow_mut().push((
            envelope["position_id"].as_str().unwrap().to_string(),
            envelope["capture"].as_bool().unwrap(),
        ));
    });

    let button = doc.query("button").unwrap();
    let outcome = vm
        .dispatch_event(&doc, button, &DomEvent::new("click"))
        .unwrap();
    assert_eq!(outcome.delivered, 3);
    assert_eq!(
        *order.borrow(),
        vec![
            ("0".to_string(), true),
            ("0.1".to_string(), false),
            ("0".to_string(), false),
        ]
    );
}

#[test]
fn stop_propagation_halts_the_walk() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    let stream = StreamBuilder::new()
        .select_mount_point("#app", "div")
        .set_event_listener("0", "click", false, false)
        .move_to_first_child()
        .set_element("button")
        .set_event_listener("0.1", "click", false, false)
        .move_to_parent()
        .end()
        .finish();
    vm.apply(&mut doc, &stream).unwrap();

    let delivered: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = Rc::clone(&delivered);
    vm.set_event_handler(move |mut scope| {
        let envelope: Value = serde_json::from_slice(scope.payload()).unwrap();
        let position = envelope["position_id"].as_str().unwrap().to_string();
        if position == "0.1" {
            scope.stop_propagation();
        }
        sink.borrow_mut().push(position);
    });

    let button = doc.query("button").unwrap();
    let outcome = vm
        .dispatch_event(&doc, button, &DomEvent::new("click"))
        .unwrap();
    assert_eq!(outcome.delivered, 1);
    assert_eq!(*delivered.borrow(), vec!["0.1".to_string()]);
}

#[test]
fn listener_sweep_removes_only_unrefreshed_keys() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    let first = StreamBuilder::new()
        .select_mount_point("#app", "div")
        .move_to_first_child()
        .set_element("button")
        .set_event_listener("0.1", "click", false, false)
        .set_event_listener("0.1", "focus", false, false)
        .remove_other_event_listeners("0.1")
        .move_to_parent()
        .end()
        .finish();
    vm.apply(&mut doc, &first).unwrap();
    assert_eq!(vm.registered_listener_count(), 2);

    // Next pass re-asserts only the click listener.
    let second = StreamBuilder::new()
        .select_mount_point("#app", "div")
        .move_to_first_child()
        .set_element("button")
        .set_event_listener("0.1", "click", false, false)
        .remove_other_event_listeners("0.1")
        .move_to_parent()
        .end()
        .finish();
    vm.apply(&mut doc, &second).unwrap();
    assert_eq!(vm.registered_listener_count(), 1);
    assert!(vm.has_listener("0.1", "click", false, false));
    assert!(!vm.has_listener("0.1", "focus", false, false));

    let button = doc.query("button").unwrap();
    let clicks = vm
        .dispatch_event(&doc, button, &DomEvent::new("click"))
        .unwrap();
    assert_eq!(clicks.delivered, 1);
    let focuses = vm
        .dispatch_event(&doc, button, &DomEvent::new("focus"))
        .unwrap();
    assert_eq!(focuses.delivered, 0);
}

#[test]
fn reregistration_is_idempotent() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    register_click(&mut vm, &mut doc);
    register_click(&mut vm, &mut doc);
    register_click(&mut vm, &mut doc);
    assert_eq!(vm.registered_listener_count(), 1);

    let button = doc.query("button").unwrap();
    let outcome = vm
        .dispatch_event(&doc, button, &DomEvent::new("click"))
        .unwrap();
    assert_eq!(outcome.delivered, 1);
}

#[test]
fn listeners_capture_and_passive_flags_are_distinct_keys() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    let stream = StreamBuilder::new()
        .select_mount_point("#app", "div")
        .move_to_first_child()
        .set_element("button")
        .set_event_listener("0.1", "click", false, false)
        .set_event_listener("0.1", "click", true, false)
        .set_event_listener("0.1", "click", false, true)
        .move_to_parent()
        .end()
        .finish();
    vm.apply(&mut doc, &stream).unwrap();
    assert_eq!(vm.registered_listener_count(), 3);
}

#[test]
fn node_replacement_without_reregistration_detaches_silently() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    register_click(&mut vm, &mut doc);

    // Replace the button with an anchor without touching listeners.
    let stream = StreamBuilder::new()
        .select_mount_point("#app", "div")
        .move_to_first_child()
        .set_element("a")
        .move_to_parent()
        .end()
        .finish();
    vm.apply(&mut doc, &stream).unwrap();

    // The registry entry survives, but nothing is attached to the new node:
    // the event no longer reaches the host.
    assert!(vm.has_listener("0.1", "click", false, false));
    let anchor = doc.query("a").unwrap();
    let outcome = vm
        .dispatch_event(&doc, anchor, &DomEvent::new("click"))
        .unwrap();
    assert_eq!(outcome.delivered, 0);
}

#[test]
fn oversized_envelope_is_dropped_not_truncated() {
    let mut doc = button_doc();
    let mut vm = RenderVm::new();
    register_click(&mut vm, &mut doc);

    let fired = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&fired);
    vm.set_event_handler(move |_scope| *sink.borrow_mut() += 1);

    let button = doc.query("#go").unwrap();
    let event = DomEvent::new("click").with_field("payload", "x".repeat(17_000));
    let err = vm.dispatch_event(&doc, button, &event).unwrap_err();
    assert!(matches!(err, RenderError::EnvelopeOverflow { .. }));
    assert_eq!(*fired.borrow(), 0);
}

#[test]
fn dispatch_on_unknown_node_is_stale() {
    let doc = button_doc();
    let mut vm = RenderVm::new();
    let err = vm
        .dispatch_event(&doc, dom::Id(9999), &DomEvent::new("click"))
        .unwrap_err();
    assert!(matches!(err, RenderError::StaleCursor { .. }));
}
