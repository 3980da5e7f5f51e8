//! Property tests for the menu tree invariants.

#![cfg(not(feature = "espidf"))]

use proptest::prelude::*;

use bsqtimer::adapters::nvs::NvsAdapter;
use bsqtimer::config::SystemConfig;
use bsqtimer::error::MenuError;
use bsqtimer::menu::{MenuNode, MenuStore, NodeKind, TimerMode};

fn fresh() -> (MenuStore, NvsAdapter) {
    let mut storage = NvsAdapter::new();
    let store = MenuStore::load(&mut storage, &SystemConfig::default());
    (store, storage)
}

/// Sibling names are unique in every folder, recursively.
fn siblings_unique(node: &MenuNode) -> bool {
    match node.children() {
        None => true,
        Some(children) => {
            let mut names: Vec<&str> = children.iter().map(MenuNode::name).collect();
            names.sort_unstable();
            names.windows(2).all(|w| w[0] != w[1]) && children.iter().all(siblings_unique)
        }
    }
}

proptest! {
    /// Resolution must never panic, whatever the path looks like.
    #[test]
    fn resolve_tolerates_arbitrary_paths(path in ".{0,64}") {
        let (store, _storage) = fresh();
        let _ = store.resolve(&path);
    }

    /// A successfully added node is resolvable at its canonical path, and
    /// the tree still round-trips through its wire form.
    #[test]
    fn added_nodes_resolve_and_roundtrip(
        name in "[A-Za-z0-9 _.-]{1,24}",
        seconds in 1u32..=86_400,
    ) {
        let (mut store, mut storage) = fresh();
        prop_assume!(!name.trim().is_empty());
        prop_assume!(store.resolve(&format!("/{name}")).is_err());

        store.add_child(
            &mut storage, "/", &name, NodeKind::Timer, TimerMode::Fixed, Some(seconds),
        ).unwrap();

        let path = format!("/{name}");
        match store.resolve(&path).unwrap() {
            MenuNode::Timer { fixed, .. } => prop_assert_eq!(*fixed, Some(seconds)),
            MenuNode::Folder { .. } => prop_assert!(false, "expected timer"),
        }

        let back: MenuNode = serde_json::from_str(&store.snapshot_json()).unwrap();
        prop_assert_eq!(&back, store.root());
    }

    /// Delete is the inverse of add: the serialised tree is restored
    /// byte for byte.
    #[test]
    fn delete_undoes_add(name in "[A-Za-z0-9 _.-]{1,24}") {
        let (mut store, mut storage) = fresh();
        prop_assume!(!name.trim().is_empty());
        prop_assume!(store.resolve(&format!("/{name}")).is_err());
        let before = store.snapshot_json();

        store.add_child(
            &mut storage, "/", &name, NodeKind::Folder, TimerMode::Fixed, None,
        ).unwrap();
        store.delete_child(&mut storage, "/", &name).unwrap();

        prop_assert_eq!(store.snapshot_json(), before);
    }

    /// Random op sequences keep sibling names unique and keep storage in
    /// sync with memory.
    #[test]
    fn random_ops_preserve_invariants(
        ops in proptest::collection::vec(
            (0u8..3, "[a-z]{1,6}", "[a-z]{1,6}"),
            1..32,
        )
    ) {
        let (mut store, mut storage) = fresh();

        for (op, parent_name, child_name) in ops {
            let parent = format!("/{parent_name}");
            let result = match op {
                0 => store.add_child(
                    &mut storage, "/", &parent_name,
                    NodeKind::Folder, TimerMode::Fixed, None,
                ),
                1 => store.add_child(
                    &mut storage, &parent, &child_name,
                    NodeKind::Timer, TimerMode::Variable, None,
                ),
                _ => store.delete_child(&mut storage, &parent, &child_name),
            };
            // Failures are allowed (duplicates, missing parents); what
            // matters is that they are the documented errors, not panics.
            if let Err(e) = result {
                prop_assert!(matches!(
                    e,
                    MenuError::NotFound
                        | MenuError::AlreadyExists
                        | MenuError::InvalidArgument(_)
                ));
            }

            prop_assert!(siblings_unique(store.root()));
        }

        // Memory and storage agree at the end of the run.
        let reloaded = MenuStore::load(&mut storage, &SystemConfig::default());
        prop_assert_eq!(reloaded.root(), store.root());
    }
}
