use super::*;

fn node(id: &str, children: Vec<MenuTreeNode>) -> MenuTreeNode {
    MenuTreeNode {
        record_id: MenuId::from(id),
        name: id.to_uppercase(),
        sequence: 0,
        parent_id: None,
        children,
    }
}

fn sample_tree() -> Vec<MenuTreeNode> {
    vec![
        node("sys", vec![node("menus", vec![node("deep", Vec::new())]), node("users", Vec::new())]),
        node("reports", Vec::new()),
    ]
}

fn visible(rows: &[TreeRow]) -> Vec<(Option<&str>, usize)> {
    rows.iter()
        .map(|row| (row.record_id.as_ref().map(MenuId::as_str), row.depth))
        .collect()
}

#[test]
fn collapsed_tree_shows_root_and_top_level_only() {
    let rows = flatten_tree(&sample_tree(), &[], None);
    assert_eq!(
        visible(&rows),
        vec![(None, 0), (Some("sys"), 1), (Some("reports"), 1)]
    );
    assert!(rows[0].selected);
    assert!(rows[1].has_children);
    assert!(!rows[1].expanded);
}

#[test]
fn expanded_nodes_list_children_depth_first_in_order() {
    let expanded = vec![MenuId::from("sys"), MenuId::from("menus")];
    let rows = flatten_tree(&sample_tree(), &expanded, None);
    assert_eq!(
        visible(&rows),
        vec![
            (None, 0),
            (Some("sys"), 1),
            (Some("menus"), 2),
            (Some("deep"), 3),
            (Some("users"), 2),
            (Some("reports"), 1),
        ]
    );
}

#[test]
fn children_of_collapsed_parents_stay_hidden() {
    // "menus" is expanded but its parent is not.
    let expanded = vec![MenuId::from("menus")];
    let rows = flatten_tree(&sample_tree(), &expanded, None);
    assert_eq!(rows.len(), 3);
}

#[test]
fn selected_node_is_marked() {
    let selected = MenuId::from("reports");
    let rows = flatten_tree(&sample_tree(), &[], Some(&selected));
    assert!(!rows[0].selected);
    assert!(rows[2].selected);
}

#[test]
fn empty_tree_still_has_the_root_row() {
    let rows = flatten_tree(&[], &[], None);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, ROOT_LABEL);
    assert!(!rows[0].has_children);
}

#[test]
fn toggle_adds_and_removes_keys() {
    let a = MenuId::from("a");
    let b = MenuId::from("b");
    let once = toggle_expanded(&[a.clone()], &b);
    assert_eq!(once, vec![a.clone(), b.clone()]);
    let twice = toggle_expanded(&once, &a);
    assert_eq!(twice, vec![b]);
}
