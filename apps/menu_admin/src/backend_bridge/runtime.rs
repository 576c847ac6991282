//! Backend worker: owns the storage and the menu store on its own tokio
//! runtime and applies queued commands strictly in arrival order.

use std::{sync::Arc, thread};

use client_core::{MenuStore, StoreEvent, StoreHandle};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use storage::Storage;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub database_url: String,
    pub page_size: u32,
}

pub fn start_backend_bridge(
    config: BackendConfig,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        send_ui_event(&ui_tx, UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                send_ui_event(&ui_tx, UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let storage = match Storage::new(&config.database_url).await {
                Ok(storage) => storage,
                Err(err) => {
                    send_ui_event(&ui_tx, UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: could not open database: {err:#}"),
                    )));
                    tracing::error!(database_url = %config.database_url, "failed to open database: {err:#}");
                    return;
                }
            };

            let store = MenuStore::with_page_size(Arc::new(storage.clone()), config.page_size);
            let mut store_events = store.subscribe_events();
            tracing::info!(database_url = %config.database_url, "backend worker ready");
            send_ui_event(&ui_tx, UiEvent::Info("Backend worker ready".to_string()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Store(intent) => {
                        let kind = intent.kind();
                        // Failures are broadcast by the store as well.
                        if let Err(err) = store.dispatch(intent).await {
                            tracing::debug!(intent = kind, "store intent failed: {err:#}");
                        }
                        forward_store_events(&mut store_events, &ui_tx);
                    }
                    BackendCommand::HealthCheck => match storage.health_check().await {
                        Ok(()) => {
                            send_ui_event(&ui_tx, UiEvent::Info("Database reachable".to_string()));
                        }
                        Err(err) => {
                            send_ui_event(&ui_tx, UiEvent::Error(UiError::from_message(
                                UiErrorContext::General,
                                format!("database health check failed: {err:#}"),
                            )));
                        }
                    },
                }
            }
            tracing::info!("ui command queue closed; backend worker stopping");
        });
    })
}

/// Queues `event` for the UI thread. Returns false when it was dropped.
fn send_ui_event(ui_tx: &Sender<UiEvent>, event: UiEvent) -> bool {
    match ui_tx.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::warn!("ui event queue full; event dropped");
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::debug!("ui event receiver dropped");
            false
        }
    }
}

/// Moves every store event emitted so far onto the UI queue.
fn forward_store_events(store_events: &mut broadcast::Receiver<StoreEvent>, ui_tx: &Sender<UiEvent>) {
    loop {
        let event = match store_events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "ui bridge lagged behind store events");
                continue;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return,
        };
        let ui_event = match event {
            StoreEvent::StateChanged(state) => UiEvent::StoreUpdated(state),
            StoreEvent::IntentFailed {
                intent,
                code,
                message,
            } => UiEvent::Error(UiError::from_store_failure(intent, code, message)),
        };
        send_ui_event(ui_tx, ui_event);
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
