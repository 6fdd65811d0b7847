#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary bytes must never panic the interpreter: they either apply or
// fail with a RenderError.
fuzz_target!(|data: &[u8]| {
    let mut doc = dom::Document::from_markup(r#"<html><head></head><body><div id="app"></div></body></html>"#);
    let mut vm = render_vm::RenderVm::new();
    vm.set_callback_handler(|_, _| {});
    let _ = vm.apply(&mut doc, data);
});
