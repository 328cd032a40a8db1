use std::sync::Arc;

use vizij_motion_set_core::{
    Config, InMemoryMotionLoader, Motion, MotionSet, MotionSetContext, MotionSetError,
};

fn ctx() -> Arc<MotionSetContext> {
    MotionSetContext::new(Config::default())
}

#[test]
fn create_with_parent_links_both_directions() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let a = MotionSet::create(&ctx, "A", Some(&root));
    let b = MotionSet::create(&ctx, "B", Some(&root));

    assert_eq!(root.num_child_sets(), 2);
    assert!(Arc::ptr_eq(&root.child_set(0).unwrap(), &a));
    assert!(Arc::ptr_eq(&root.child_set(1).unwrap(), &b));
    assert!(Arc::ptr_eq(&a.parent_set().unwrap(), &root));
    assert!(root.parent_set().is_none());

    let err = root.child_set(2).unwrap_err();
    assert_eq!(err, MotionSetError::IndexOutOfBounds { index: 2, len: 2 });
}

#[test]
fn recursive_search_only_descends() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let child = MotionSet::create(&ctx, "Child", Some(&root));
    let jump = ctx.create_entry("anim/jump.motion", "jump", None).unwrap();
    child.add_motion_entry(jump.clone()).unwrap();

    let found = root
        .recursive_find_motion_entry_by_string_id("jump")
        .expect("descendant entry");
    assert!(Arc::ptr_eq(&found, &jump));
    assert!(root.find_motion_entry_by_string_id("jump").is_none());

    let jump_alt = ctx
        .create_entry("anim/jump_alt.motion", "jump_alt", None)
        .unwrap();
    root.add_motion_entry(jump_alt).unwrap();
    assert!(child
        .recursive_find_motion_entry_by_string_id("jump_alt")
        .is_none());
}

#[test]
fn own_entry_shadows_descendant_with_same_id() {
    let ctx = ctx();
    let a = MotionSet::create(&ctx, "A", None);
    let b = MotionSet::create(&ctx, "B", Some(&a));
    let a_jump = ctx.create_entry("anim/jump.motion", "jump", None).unwrap();
    let b_jump = ctx.create_entry("anim/jump_alt.motion", "jump", None).unwrap();
    a.add_motion_entry(a_jump.clone()).unwrap();
    b.add_motion_entry(b_jump.clone()).unwrap();

    let found = a.recursive_find_motion_entry_by_string_id("jump").unwrap();
    assert!(Arc::ptr_eq(&found, &a_jump));
    let found = b.find_motion_entry_by_string_id("jump").unwrap();
    assert!(Arc::ptr_eq(&found, &b_jump));
    let found = b.recursive_find_motion_entry_by_string_id("jump").unwrap();
    assert!(Arc::ptr_eq(&found, &b_jump));
}

#[test]
fn nearest_set_wins_in_pre_order() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let a = MotionSet::create(&ctx, "A", Some(&root));
    let a1 = MotionSet::create(&ctx, "A1", Some(&a));
    let b = MotionSet::create(&ctx, "B", Some(&root));

    let deep = ctx.create_entry("deep.motion", "wave", None).unwrap();
    let shallow = ctx.create_entry("shallow.motion", "wave", None).unwrap();
    a1.add_motion_entry(deep.clone()).unwrap();
    b.add_motion_entry(shallow).unwrap();

    // A's subtree is visited completely before B.
    let found = root.recursive_find_motion_entry_by_string_id("wave").unwrap();
    assert!(Arc::ptr_eq(&found, &deep));

    let own = ctx.create_entry("own.motion", "wave", None).unwrap();
    root.add_motion_entry(own.clone()).unwrap();
    let found = root.recursive_find_motion_entry_by_string_id("wave").unwrap();
    assert!(Arc::ptr_eq(&found, &own));
}

#[test]
fn recursive_motion_search_loads_through_owning_set() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let child = MotionSet::create(&ctx, "Child", Some(&root));
    let root_loader = Arc::new(InMemoryMotionLoader::new());
    let child_loader = Arc::new(InMemoryMotionLoader::new().with_id("jump", Motion::new("jump", 900)));
    root.set_callback(root_loader.clone());
    child.set_callback(child_loader.clone());
    child
        .add_motion_entry(ctx.create_entry("jump.motion", "jump", None).unwrap())
        .unwrap();

    assert!(root.recursive_find_motion_by_string_id("jump", false).is_none());
    assert_eq!(child_loader.load_count(), 0);

    let motion = root
        .recursive_find_motion_by_string_id("jump", true)
        .expect("loaded on demand");
    assert_eq!(motion.name, "jump");
    assert_eq!(child_loader.load_count(), 1);
    assert_eq!(root_loader.load_count(), 0);

    let again = root.recursive_find_motion_by_string_id("jump", false).unwrap();
    assert!(Arc::ptr_eq(&motion, &again));
}

#[test]
fn remove_child_detaches_without_clearing_parent_link() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let a = MotionSet::create(&ctx, "A", Some(&root));
    let b = MotionSet::create(&ctx, "B", Some(&root));

    root.remove_child_set_by_id(a.id());
    assert_eq!(root.num_child_sets(), 1);
    assert!(Arc::ptr_eq(&root.child_set(0).unwrap(), &b));
    assert!(Arc::ptr_eq(&a.parent_set().unwrap(), &root));

    // Unknown ids are ignored.
    root.remove_child_set_by_id(a.id());
    assert_eq!(root.num_child_sets(), 1);

    a.clear_parent_set();
    assert!(a.parent_set().is_none());
}

#[test]
fn reparenting_moves_the_child() {
    let ctx = ctx();
    let first = MotionSet::create(&ctx, "First", None);
    let second = MotionSet::create(&ctx, "Second", None);
    let child = MotionSet::create(&ctx, "Child", Some(&first));

    second.add_child_set(&child).unwrap();
    assert_eq!(first.num_child_sets(), 0);
    assert_eq!(second.num_child_sets(), 1);
    assert!(Arc::ptr_eq(&child.parent_set().unwrap(), &second));

    // Adding again is a no-op.
    second.add_child_set(&child).unwrap();
    assert_eq!(second.num_child_sets(), 1);
}

#[test]
fn cycles_are_rejected() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let mid = MotionSet::create(&ctx, "Mid", Some(&root));
    let leaf = MotionSet::create(&ctx, "Leaf", Some(&mid));

    assert!(matches!(
        leaf.add_child_set(&root),
        Err(MotionSetError::CycleDetected { .. })
    ));
    assert!(matches!(
        root.add_child_set(&root),
        Err(MotionSetError::CycleDetected { .. })
    ));
    assert_eq!(leaf.num_child_sets(), 0);
    assert!(root.parent_set().is_none());
}

#[test]
fn root_and_subtree_queries() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let a = MotionSet::create(&ctx, "A", Some(&root));
    let a1 = MotionSet::create(&ctx, "A1", Some(&a));
    let b = MotionSet::create(&ctx, "B", Some(&root));

    assert!(Arc::ptr_eq(&a1.find_root_motion_set(), &root));
    assert!(Arc::ptr_eq(&root.find_root_motion_set(), &root));

    let names: Vec<String> = root
        .recursive_get_motion_sets(None)
        .iter()
        .map(|s| s.name())
        .collect();
    assert_eq!(names, vec!["Root", "A", "A1", "B"]);

    let found = root.recursive_find_motion_set_by_name("B", false).unwrap();
    assert!(Arc::ptr_eq(&found, &b));
    assert!(root.recursive_find_motion_set_by_name("b", false).is_none());
    assert!(a.recursive_find_motion_set_by_name("B", false).is_none());
}

#[cfg(feature = "development")]
#[test]
fn runtime_ownership_filters() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let runtime = MotionSet::create(&ctx, "Runtime", Some(&root));
    let _tool = MotionSet::create(&ctx, "Tool", Some(&root));
    runtime.set_owned_by_runtime(true);

    let owned = root.recursive_get_motion_sets(Some(true));
    assert_eq!(owned.len(), 1);
    assert!(Arc::ptr_eq(&owned[0], &runtime));
    assert_eq!(root.recursive_get_motion_sets(Some(false)).len(), 2);

    assert!(root.recursive_find_motion_set_by_name("Runtime", false).is_none());
    assert!(root.recursive_find_motion_set_by_name("Runtime", true).is_some());
}

#[test]
fn destroy_detaches_and_unregisters() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let child = MotionSet::create(&ctx, "Child", Some(&root));
    let grandchild = MotionSet::create(&ctx, "Grandchild", Some(&child));
    child
        .add_motion_entry(ctx.create_entry("a.motion", "a", None).unwrap())
        .unwrap();
    assert_eq!(ctx.registry().len(), 3);

    child.destroy();
    assert_eq!(root.num_child_sets(), 0);
    assert!(child.parent_set().is_none());
    assert_eq!(child.num_motion_entries(), 0);
    assert!(!ctx.registry().contains(&child));
    // Children are not destroyed along with their parent.
    assert_eq!(child.num_child_sets(), 1);
    assert!(ctx.registry().contains(&grandchild));
}

#[test]
fn registry_tracks_live_sets() {
    let ctx = ctx();
    let root = MotionSet::create(&ctx, "Root", None);
    let child = MotionSet::create(&ctx, "Child", Some(&root));
    let loose = MotionSet::create(&ctx, "Loose", None);
    assert_ne!(root.id(), child.id());

    assert_eq!(ctx.registry().len(), 3);
    assert!(Arc::ptr_eq(&ctx.registry().find_by_id(child.id()).unwrap(), &child));
    assert!(Arc::ptr_eq(&ctx.registry().find_by_name("Loose").unwrap(), &loose));
    let roots: Vec<String> = ctx.registry().root_sets().iter().map(|s| s.name()).collect();
    assert_eq!(roots, vec!["Root", "Loose"]);

    drop(loose);
    assert_eq!(ctx.registry().len(), 2);
    assert!(ctx.registry().find_by_name("Loose").is_none());

    // The tree keeps the child alive after the caller's handle goes away.
    drop(child);
    assert_eq!(ctx.registry().len(), 2);
    drop(root);
    assert!(ctx.registry().is_empty());
}

#[test]
fn disabled_auto_unregister_keeps_registration_until_drop() {
    let ctx = ctx();
    let set = MotionSet::create(&ctx, "Manual", None);
    set.set_auto_unregister(false);
    set.destroy();
    assert!(ctx.registry().contains(&set));

    assert!(ctx.registry().unregister(&set));
    assert!(!ctx.registry().contains(&set));
}

#[test]
fn sets_from_another_context_cannot_be_linked() {
    let ctx_a = ctx();
    let ctx_b = ctx();
    let root = MotionSet::create(&ctx_a, "Root", None);
    let stranger = MotionSet::create(&ctx_b, "Stranger", None);

    assert!(matches!(
        root.add_child_set(&stranger),
        Err(MotionSetError::ForeignContext { .. })
    ));
    assert_eq!(root.num_child_sets(), 0);
    assert!(stranger.parent_set().is_none());
}
