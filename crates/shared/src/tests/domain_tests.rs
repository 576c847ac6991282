use super::*;

fn record(id: &str, parent: Option<&str>, sequence: i64) -> MenuRecord {
    MenuRecord {
        record_id: MenuId::from(id),
        name: id.to_uppercase(),
        sequence,
        hidden: Visibility::Shown,
        icon: String::new(),
        router: format!("/{id}"),
        parent_id: parent.map(MenuId::from),
        actions: Vec::new(),
        created_at: None,
    }
}

#[test]
fn visibility_travels_as_integer_flag() {
    assert_eq!(serde_json::to_string(&Visibility::Hidden).expect("ser"), "1");
    let shown: Visibility = serde_json::from_str("0").expect("de");
    assert_eq!(shown, Visibility::Shown);
    assert!(serde_json::from_str::<Visibility>("7").is_err());
}

#[test]
fn empty_draft_key_is_not_usable() {
    let draft = ActionDraft {
        key: Some(ActionKey::from("")),
        code: "add".into(),
        name: "新規".into(),
    };
    assert!(draft.usable_key().is_none());
}

#[test]
fn patch_only_touches_given_fields() {
    let row = ActionRow::new("k", "edit", "編集");
    let patched = ActionPatch::name("X").apply_to(&row);
    assert_eq!(patched, ActionRow::new("k", "edit", "X"));
}

#[test]
fn builds_tree_ordered_by_sequence_desc() {
    let records = vec![
        record("sys", None, 10),
        record("menu", Some("sys"), 1),
        record("user", Some("sys"), 5),
        record("home", None, 20),
    ];
    let tree = build_menu_tree(&records);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].record_id.as_str(), "home");
    assert_eq!(tree[1].record_id.as_str(), "sys");
    let kids: Vec<_> = tree[1].children.iter().map(|c| c.record_id.as_str()).collect();
    assert_eq!(kids, vec!["user", "menu"]);
}

#[test]
fn orphans_become_roots_and_cycles_are_dropped() {
    let records = vec![
        record("orphan", Some("missing"), 1),
        record("a", Some("b"), 1),
        record("b", Some("a"), 1),
    ];
    let tree = build_menu_tree(&records);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].record_id.as_str(), "orphan");
}

#[test]
fn subtree_ids_include_descendants_only() {
    let records = vec![
        record("sys", None, 1),
        record("menu", Some("sys"), 1),
        record("leaf", Some("menu"), 1),
        record("other", None, 1),
    ];
    let tree = build_menu_tree(&records);
    let ids = subtree_ids(&tree, &MenuId::from("menu"));
    assert!(ids.contains(&MenuId::from("menu")));
    assert!(ids.contains(&MenuId::from("leaf")));
    assert!(!ids.contains(&MenuId::from("sys")));
    assert_eq!(ids.len(), 2);
}
