//! Buffer-resumption coverage: a stream split at any instruction boundary
//! and fed through separate `apply` calls must converge to the same tree as
//! the unsplit stream.

use dom::{Document, snapshot};
use render_test_support::{StreamBuilder, assert_lines_eq};
use render_vm::RenderVm;

fn fixture() -> Document {
    Document::from_markup(r#"<html><head></head><body><div id="app"><p>stale</p></div></body></html>"#)
}

fn scenario() -> StreamBuilder {
    StreamBuilder::new()
        .select_mount_point("#app", "div")
        .set_attr("class", "root")
        .remove_other_attrs()
        .move_to_first_child()
        .set_element("header")
        .set_attr("id", "top")
        .set_event_listener("0.0", "click", false, false)
        .remove_other_event_listeners("0.0")
        .move_to_first_child()
        .set_text("title")
        .move_to_parent()
        .move_to_next_sibling()
        .set_element("ul")
        .move_to_first_child()
        .set_element("li")
        .move_to_next_sibling()
        .set_element("li")
        .move_to_first_child()
        .set_comment("placeholder")
        .move_to_parent()
        .move_to_parent()
        .move_to_parent()
        .end()
}

fn converge_whole() -> Vec<String> {
    let mut doc = fixture();
    let mut vm = RenderVm::new();
    vm.apply(&mut doc, &scenario().finish()).unwrap();
    snapshot::snapshot_lines(&doc)
}

#[test]
fn whole_stream_builds_the_expected_tree() {
    let lines = converge_whole();
    let expected = Document::from_markup(
        r#"<html><head></head><body><div class="root"><header id="top">title</header><ul><li></li><li><!--placeholder--></li></ul></div></body></html>"#,
    );
    assert_lines_eq(
        &snapshot::snapshot_lines(&expected),
        &lines,
        "single-buffer application",
    );
}

#[test]
fn every_two_way_split_matches_the_unsplit_result() {
    let expected = converge_whole();
    let builder = scenario();

    for (i, (first, second)) in builder.two_way_splits().into_iter().enumerate() {
        let mut doc = fixture();
        let mut vm = RenderVm::new();
        vm.apply(&mut doc, &first)
            .unwrap_or_else(|e| panic!("split {i}, first half: {e}"));
        vm.apply(&mut doc, &second)
            .unwrap_or_else(|e| panic!("split {i}, second half: {e}"));
        assert_lines_eq(
            &expected,
            &snapshot::snapshot_lines(&doc),
            &format!("split at boundary {i}"),
        );
    }
}

#[test]
fn one_buffer_per_instruction_still_converges() {
    let expected = converge_whole();
    let builder = scenario();

    let mut doc = fixture();
    let mut vm = RenderVm::new();
    for (i, buffer) in builder.per_instruction_buffers().into_iter().enumerate() {
        vm.apply(&mut doc, &buffer)
            .unwrap_or_else(|e| panic!("instruction buffer {i}: {e}"));
    }
    assert_lines_eq(&expected, &snapshot::snapshot_lines(&doc), "per-instruction feed");
}

#[test]
fn markers_survive_a_split_between_set_and_sweep() {
    // The attribute marker set must carry across the buffer boundary or the
    // sweep would remove everything just set.
    let mut doc = fixture();
    let mut vm = RenderVm::new();

    let first = StreamBuilder::new()
        .select_mount_point("#app", "div")
        .set_attr("data-kept", "1")
        .finish();
    let second = StreamBuilder::new().remove_other_attrs().end().finish();
    vm.apply(&mut doc, &first).unwrap();
    vm.apply(&mut doc, &second).unwrap();

    let app = vm.mount_point().unwrap();
    let attrs = doc.get(app).unwrap().attributes().unwrap();
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs[0].name, "data-kept");
}
