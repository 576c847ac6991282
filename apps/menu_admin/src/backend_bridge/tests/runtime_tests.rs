use crossbeam_channel::bounded;
use shared::{
    domain::{MenuId, Visibility},
    protocol::{FormRequest, MenuSubmission, StoreIntent},
};

use super::*;
use crate::controller::events::UiErrorCategory;

fn run_commands(commands: Vec<BackendCommand>) -> Vec<UiEvent> {
    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);
    let handle = start_backend_bridge(
        BackendConfig {
            database_url: "sqlite::memory:".to_string(),
            page_size: 10,
        },
        cmd_rx,
        ui_tx,
    );
    for cmd in commands {
        cmd_tx.send(cmd).expect("queue command");
    }
    drop(cmd_tx);
    handle.join().expect("backend thread");
    ui_rx.try_iter().collect()
}

#[test]
fn commands_are_applied_in_order_and_snapshots_forwarded() {
    let events = run_commands(vec![
        BackendCommand::Store(StoreIntent::LoadForm(FormRequest::Add)),
        BackendCommand::Store(StoreIntent::Submit(MenuSubmission {
            name: "Reports".to_string(),
            hidden: Visibility::Shown,
            ..MenuSubmission::default()
        })),
        BackendCommand::HealthCheck,
    ]);

    let snapshots: Vec<&shared::protocol::MenuStoreState> = events
        .iter()
        .filter_map(|event| match event {
            UiEvent::StoreUpdated(state) => Some(state.as_ref()),
            _ => None,
        })
        .collect();
    assert_eq!(snapshots.len(), 2);
    assert!(snapshots[0].form.visible);
    assert!(!snapshots[1].form.visible);
    assert_eq!(snapshots[1].data.list.len(), 1);
    assert_eq!(snapshots[1].tree_data[0].name, "Reports");

    assert!(events
        .iter()
        .any(|event| matches!(event, UiEvent::Info(message) if message == "Database reachable")));
}

#[test]
fn store_failures_become_ui_errors() {
    let events = run_commands(vec![BackendCommand::Store(StoreIntent::Delete {
        record_id: MenuId::from("missing"),
    })]);

    let errors: Vec<&UiError> = events
        .iter()
        .filter_map(|event| match event {
            UiEvent::Error(err) => Some(err),
            _ => None,
        })
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].context(), UiErrorContext::Delete);
    assert_eq!(errors[0].category(), UiErrorCategory::Validation);
    // The store still publishes its state after a failure.
    assert!(events
        .iter()
        .any(|event| matches!(event, UiEvent::StoreUpdated(_))));
}

#[test]
fn ui_events_report_whether_they_were_queued() {
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1);
    assert!(send_ui_event(&ui_tx, UiEvent::Info("first".to_string())));
    assert!(!send_ui_event(&ui_tx, UiEvent::Info("second".to_string())));

    let queued: Vec<_> = ui_rx.try_iter().collect();
    assert!(matches!(queued.as_slice(), [UiEvent::Info(text)] if text == "first"));

    drop(ui_rx);
    assert!(!send_ui_event(&ui_tx, UiEvent::Info("third".to_string())));
}
