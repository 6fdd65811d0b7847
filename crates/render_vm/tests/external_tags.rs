use core_types::ExternalTagKind;
use dom::Document;
use render_test_support::StreamBuilder;
use render_vm::RenderVm;

fn page() -> Document {
    Document::from_markup(r#"<html><head></head><body><div id="app"></div></body></html>"#)
}

#[test]
fn inline_tag_is_created_in_head_and_owned() {
    let mut doc = page();
    let mut vm = RenderVm::new();
    let stream = StreamBuilder::new()
        .set_external_tag(ExternalTagKind::Inline, ".a{color:red}", &[("media", "all")])
        .end()
        .finish();
    vm.apply(&mut doc, &stream).unwrap();

    let style = doc.query("style").unwrap();
    assert!(vm.owns_external_tag(style));
    assert_eq!(doc.deep_text(style), ".a{color:red}");
    assert_eq!(doc.get(style).unwrap().attr("media"), Some("all"));
    let head = doc.query("head").unwrap();
    assert_eq!(doc.parent_of(style), Some(head));
}

#[test]
fn matching_key_reuses_the_existing_tag() {
    let mut doc = page();
    let mut vm = RenderVm::new();
    let pass = || {
        StreamBuilder::new()
            .set_external_tag(ExternalTagKind::Inline, ".a{}", &[])
            .remove_other_external_tags(ExternalTagKind::Inline)
            .end()
            .finish()
    };

    vm.apply(&mut doc, &pass()).unwrap();
    let first = doc.query("style").unwrap();
    vm.apply(&mut doc, &pass()).unwrap();
    let second = doc.query("style").unwrap();

    assert_eq!(first, second);
    assert_eq!(doc.elements_named("style").len(), 1);
}

#[test]
fn sweep_removes_owned_tags_not_reasserted() {
    let mut doc = page();
    let mut vm = RenderVm::new();
    let first = StreamBuilder::new()
        .set_external_tag(ExternalTagKind::Inline, ".old{}", &[])
        .remove_other_external_tags(ExternalTagKind::Inline)
        .end()
        .finish();
    vm.apply(&mut doc, &first).unwrap();
    assert_eq!(doc.elements_named("style").len(), 1);

    let second = StreamBuilder::new()
        .set_external_tag(ExternalTagKind::Inline, ".new{}", &[])
        .remove_other_external_tags(ExternalTagKind::Inline)
        .end()
        .finish();
    vm.apply(&mut doc, &second).unwrap();

    let styles = doc.elements_named("style");
    assert_eq!(styles.len(), 1);
    assert_eq!(doc.deep_text(styles[0]), ".new{}");
}

#[test]
fn unowned_tags_are_never_swept() {
    let mut doc = Document::from_markup(
        r#"<html><head><style>user{}</style></head><body><div id="app"></div></body></html>"#,
    );
    let mut vm = RenderVm::new();
    let user_style = doc.query("style").unwrap();

    let stream = StreamBuilder::new()
        .set_external_tag(ExternalTagKind::Inline, ".vm{}", &[])
        .remove_other_external_tags(ExternalTagKind::Inline)
        .end()
        .finish();
    vm.apply(&mut doc, &stream).unwrap();

    // Pass two asserts nothing at all; the user's tag still survives.
    let sweep_only = StreamBuilder::new()
        .remove_other_external_tags(ExternalTagKind::Inline)
        .end()
        .finish();
    vm.apply(&mut doc, &sweep_only).unwrap();

    assert!(doc.get(user_style).is_some());
    assert!(!vm.owns_external_tag(user_style));
    assert_eq!(doc.elements_named("style").len(), 1);
}

#[test]
fn wanted_set_resets_each_cycle() {
    let mut doc = page();
    let mut vm = RenderVm::new();
    let assert_and_sweep = StreamBuilder::new()
        .set_external_tag(ExternalTagKind::Inline, ".a{}", &[])
        .remove_other_external_tags(ExternalTagKind::Inline)
        .end()
        .finish();
    vm.apply(&mut doc, &assert_and_sweep).unwrap();
    assert_eq!(doc.elements_named("style").len(), 1);

    // A cycle that never re-asserts the tag removes it.
    let sweep_only = StreamBuilder::new()
        .remove_other_external_tags(ExternalTagKind::Inline)
        .end()
        .finish();
    vm.apply(&mut doc, &sweep_only).unwrap();
    assert!(doc.elements_named("style").is_empty());
}

#[test]
fn linked_tags_key_on_href() {
    let mut doc = page();
    let mut vm = RenderVm::new();
    let pass = |href: &str| {
        StreamBuilder::new()
            .set_external_tag(
                ExternalTagKind::Linked,
                "",
                &[("rel", "stylesheet"), ("href", href)],
            )
            .remove_other_external_tags(ExternalTagKind::Linked)
            .end()
            .finish()
    };

    vm.apply(&mut doc, &pass("/a.css")).unwrap();
    let first = doc.query("link").unwrap();
    assert_eq!(doc.get(first).unwrap().attr("href"), Some("/a.css"));

    // Same href: reused. Different href: replaced by the sweep.
    vm.apply(&mut doc, &pass("/a.css")).unwrap();
    assert_eq!(doc.query("link"), Some(first));

    vm.apply(&mut doc, &pass("/b.css")).unwrap();
    let links = doc.elements_named("link");
    assert_eq!(links.len(), 1);
    assert_eq!(doc.get(links[0]).unwrap().attr("href"), Some("/b.css"));
}

#[test]
fn empty_key_is_a_no_op() {
    let mut doc = page();
    let mut vm = RenderVm::new();
    let stream = StreamBuilder::new()
        .set_external_tag(ExternalTagKind::Inline, "", &[])
        .set_external_tag(ExternalTagKind::Linked, "", &[("rel", "stylesheet")])
        .end()
        .finish();
    vm.apply(&mut doc, &stream).unwrap();

    assert!(doc.elements_named("style").is_empty());
    assert!(doc.elements_named("link").is_empty());
}

#[test]
fn inline_and_linked_registries_are_independent() {
    let mut doc = page();
    let mut vm = RenderVm::new();
    let stream = StreamBuilder::new()
        .set_external_tag(ExternalTagKind::Inline, ".a{}", &[])
        .set_external_tag(
            ExternalTagKind::Linked,
            "",
            &[("rel", "stylesheet"), ("href", "/a.css")],
        )
        .remove_other_external_tags(ExternalTagKind::Inline)
        .end()
        .finish();
    vm.apply(&mut doc, &stream).unwrap();

    // Sweeping inline tags must not disturb the linked tag.
    assert_eq!(doc.elements_named("style").len(), 1);
    assert_eq!(doc.elements_named("link").len(), 1);
}
