use super::*;
use shared::error::ErrorCode;

fn submission(name: &str, parent_id: Option<&MenuId>, sequence: i64) -> MenuSubmission {
    MenuSubmission {
        name: name.to_string(),
        sequence,
        hidden: Visibility::Shown,
        icon: "setting".to_string(),
        router: format!("/{}", name.to_lowercase()),
        parent_id: parent_id.cloned(),
        actions: Vec::new(),
    }
}

fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.downcast_ref::<ApiException>().map(|e| e.code)
}

fn query(search: MenuSearch, current: u32, page_size: u32) -> MenuQuery {
    MenuQuery {
        search,
        current,
        page_size,
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("menus.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn stores_menu_with_actions_in_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut sub = submission("System", None, 10);
    sub.actions = vec![
        ActionRow::new("add", "add", "新規"),
        ActionRow::new("k-2", "export", "出力"),
    ];

    let created = storage.create_menu(&sub).await.expect("create");
    assert_eq!(created.name, "System");
    assert_eq!(created.actions, sub.actions);
    assert!(created.created_at.is_some());

    let loaded = storage
        .get_menu(&created.record_id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn update_replaces_fields_and_actions() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut sub = submission("Users", None, 1);
    sub.actions = vec![ActionRow::new("add", "add", "新規")];
    let created = storage.create_menu(&sub).await.expect("create");

    let mut changed = submission("Accounts", None, 7);
    changed.hidden = Visibility::Hidden;
    changed.actions = vec![ActionRow::new("query", "query", "検索")];
    let updated = storage
        .update_menu(&created.record_id, &changed)
        .await
        .expect("update");

    assert_eq!(updated.record_id, created.record_id);
    assert_eq!(updated.name, "Accounts");
    assert_eq!(updated.sequence, 7);
    assert!(updated.hidden.is_hidden());
    assert_eq!(updated.actions, changed.actions);
}

#[tokio::test]
async fn query_filters_by_name_visibility_and_parent() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let sys = storage
        .create_menu(&submission("System", None, 1))
        .await
        .expect("sys");
    storage
        .create_menu(&submission("Menu admin", Some(&sys.record_id), 2))
        .await
        .expect("menu");
    let mut hidden = submission("User admin", Some(&sys.record_id), 1);
    hidden.hidden = Visibility::Hidden;
    storage.create_menu(&hidden).await.expect("user");
    storage
        .create_menu(&submission("Reports", None, 5))
        .await
        .expect("reports");

    let by_parent = storage
        .query_menus(&query(MenuSearch::with_parent(Some(sys.record_id.clone())), 1, 10))
        .await
        .expect("query");
    let names: Vec<_> = by_parent.list.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Menu admin", "User admin"]);
    assert_eq!(by_parent.pagination.total, 2);

    let by_name = storage
        .query_menus(&query(
            MenuSearch {
                name: "admin".into(),
                hidden: HiddenFilter::Only(Visibility::Hidden),
                parent_id: None,
            },
            1,
            10,
        ))
        .await
        .expect("query");
    assert_eq!(by_name.list.len(), 1);
    assert_eq!(by_name.list[0].name, "User admin");
}

async fn names_matching(storage: &Storage, needle: &str) -> Vec<String> {
    let search = MenuSearch {
        name: needle.to_string(),
        hidden: HiddenFilter::All,
        parent_id: None,
    };
    let page = storage.query_menus(&query(search, 1, 10)).await.expect("query");
    page.list.into_iter().map(|m| m.name).collect()
}

#[tokio::test]
async fn name_filter_matches_wildcard_characters_literally() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for (seq, name) in ["user_admin", "userXadmin", "100% done", "100 items", r"a\b", "ab"]
        .into_iter()
        .enumerate()
    {
        storage
            .create_menu(&submission(name, None, seq as i64))
            .await
            .expect("create");
    }

    assert_eq!(names_matching(&storage, "user_admin").await, vec!["user_admin"]);
    assert_eq!(names_matching(&storage, "100%").await, vec!["100% done"]);
    assert_eq!(names_matching(&storage, r"a\b").await, vec![r"a\b"]);
    assert_eq!(names_matching(&storage, "admin").await.len(), 2);
}

#[test]
fn in_memory_pool_never_recycles_its_connection() {
    let memory = pool_options("sqlite::memory:");
    assert_eq!(memory.get_max_connections(), 1);
    assert_eq!(memory.get_idle_timeout(), None);
    assert_eq!(memory.get_max_lifetime(), None);

    let file = pool_options("sqlite://./data/menus.db");
    assert_eq!(file.get_max_connections(), 5);
}

#[tokio::test]
async fn query_paginates_with_total() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for seq in 0..5 {
        storage
            .create_menu(&submission(&format!("Menu {seq}"), None, seq))
            .await
            .expect("create");
    }

    let page = storage
        .query_menus(&query(MenuSearch::default(), 2, 2))
        .await
        .expect("query");
    assert_eq!(page.pagination.total, 5);
    assert_eq!(page.pagination.current, 2);
    let names: Vec<_> = page.list.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Menu 2", "Menu 1"]);
}

#[tokio::test]
async fn delete_is_refused_while_children_exist() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let parent = storage
        .create_menu(&submission("Parent", None, 1))
        .await
        .expect("parent");
    let child = storage
        .create_menu(&submission("Child", Some(&parent.record_id), 1))
        .await
        .expect("child");

    let err = storage
        .delete_menu(&parent.record_id)
        .await
        .expect_err("has children");
    assert_eq!(error_code(&err), Some(ErrorCode::Conflict));

    storage.delete_menu(&child.record_id).await.expect("child");
    storage.delete_menu(&parent.record_id).await.expect("parent");
    assert!(storage
        .get_menu(&parent.record_id)
        .await
        .expect("get")
        .is_none());
}

#[tokio::test]
async fn update_refuses_moving_menu_below_its_descendant() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let root = storage
        .create_menu(&submission("Root", None, 1))
        .await
        .expect("root");
    let child = storage
        .create_menu(&submission("Child", Some(&root.record_id), 1))
        .await
        .expect("child");

    let err = storage
        .update_menu(&root.record_id, &submission("Root", Some(&child.record_id), 1))
        .await
        .expect_err("cycle");
    assert_eq!(error_code(&err), Some(ErrorCode::Validation));

    let err = storage
        .update_menu(&root.record_id, &submission("Root", Some(&root.record_id), 1))
        .await
        .expect_err("self parent");
    assert_eq!(error_code(&err), Some(ErrorCode::Validation));
}

#[tokio::test]
async fn rejects_blank_names_and_unknown_parents() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let err = storage
        .create_menu(&submission("   ", None, 1))
        .await
        .expect_err("blank");
    assert_eq!(error_code(&err), Some(ErrorCode::Validation));

    let err = storage
        .create_menu(&submission("Orphan", Some(&MenuId::from("nope")), 1))
        .await
        .expect_err("unknown parent");
    assert_eq!(error_code(&err), Some(ErrorCode::NotFound));
}

#[tokio::test]
async fn tree_nests_children_under_parents() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let sys = storage
        .create_menu(&submission("System", None, 1))
        .await
        .expect("sys");
    storage
        .create_menu(&submission("Menus", Some(&sys.record_id), 1))
        .await
        .expect("menus");

    let tree = storage.menu_tree().await.expect("tree");
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].name, "System");
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].name, "Menus");
}
