//! Demo host: drives the rendering VM end to end over an in-memory page.
//!
//! Encodes a small virtual tree through the fixed-buffer instruction writer
//! (forcing buffer splits), applies the buffers to a document, prints the
//! converged tree, then dispatches a click to show the event envelope path.

use mimalloc::MiMalloc;
use render_vm::{DomEvent, RenderVm};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() {
    let mut doc = dom::Document::from_markup(
        r#"<html><head></head><body><div id="app"></div></body></html>"#,
    );
    let mut vm = RenderVm::new();

    vm.set_callback_handler(|id, node| {
        println!("callback {id} fired (node: {node:?})");
    });
    vm.set_event_handler(|scope| {
        let payload = String::from_utf8_lossy(scope.payload()).into_owned();
        println!("event envelope ({} bytes): {payload}", scope.envelope().len());
    });

    // A deliberately small buffer so the stream splits mid-render.
    let mut buffers: Vec<Vec<u8>> = Vec::new();
    let mut writer = wire::InstructionWriter::new(64, |buf: &[u8]| {
        buffers.push(buf.to_vec());
        Ok(())
    });

    writer.write_select_mount_point("#app", "div").unwrap();
    writer.write_move_to_first_child().unwrap();
    writer.write_set_element("h1").unwrap();
    writer.write_move_to_first_child().unwrap();
    writer.write_set_text("domsync demo").unwrap();
    writer.write_move_to_parent().unwrap();
    writer.write_move_to_next_sibling().unwrap();
    writer.write_set_element("button").unwrap();
    writer.write_set_attr("id", "go").unwrap();
    writer.write_remove_other_attrs().unwrap();
    writer
        .write_set_event_listener("0.1", "click", false, false)
        .unwrap();
    writer.write_move_to_first_child().unwrap();
    writer.write_set_text("Go").unwrap();
    writer.write_move_to_parent().unwrap();
    writer.write_move_to_parent().unwrap();
    writer.write_callback_with_current_node(1).unwrap();
    writer.flush().unwrap();
    drop(writer);

    println!("applying {} instruction buffer(s)", buffers.len());
    for buffer in &buffers {
        if let Err(e) = vm.apply(&mut doc, buffer) {
            eprintln!("render failed: {e}");
            return;
        }
    }

    println!("\nconverged tree:");
    println!("{}", dom::snapshot::render(&doc));

    let button = doc.query("#go").expect("demo button exists");
    let event = DomEvent::new("click")
        .with_field("clientX", 12)
        .with_field("clientY", 34);
    println!("\ndispatching click on #go:");
    match vm.dispatch_event(&doc, button, &event) {
        Ok(outcome) => println!(
            "delivered to {} listener(s), default prevented: {}",
            outcome.delivered, outcome.default_prevented
        ),
        Err(e) => eprintln!("dispatch failed: {e}"),
    }
}
