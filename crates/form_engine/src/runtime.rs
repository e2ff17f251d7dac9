/*!
Async driver for a [`FormSession`].

`FormRuntime::run` is a single Tokio task that owns the session and
processes one event at a time:

- commands from any number of [`FormHandle`]s (edits, submit, reset, reload)
- internal events (config fetched, debounce timer fired, submit finished)

After each event the runtime publishes a fresh [`FormView`] through a
`watch` channel, then answers the command that caused it. Because only the
runtime task touches the session, no locking is needed.

Network calls run in their own tasks and report back through the internal
channel. Autosave calls are fire-and-forget: their outcome is only logged.

Teardown happens on `FormHandle::shutdown` or once every handle is gone. It
cancels the pending debounce timer and every in-flight call; late results
find the runtime gone and are dropped.
*/

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{FormError, ServiceError};
use crate::field::FieldDescriptor;
use crate::scheduler::{Debouncer, TaskId, TaskScheduler};
use crate::service::{FormService, SubmitReceipt};
use crate::session::{Effect, FormSession, LoadGeneration};
use crate::settings::EngineSettings;
use crate::submission::Ticket;
use crate::value::FieldValue;
use crate::view::FormView;

type Reply = oneshot::Sender<Result<(), FormError>>;

#[derive(Debug)]
enum Request {
    SetValue { name: String, value: FieldValue },
    Submit,
    Reset,
    Reload,
}

#[derive(Debug)]
enum FormCommand {
    Request { request: Request, reply: Reply },
    Shutdown,
}

#[derive(Debug)]
enum InternalEvent {
    ConfigLoaded {
        generation: LoadGeneration,
        result: Result<Vec<FieldDescriptor>, ServiceError>,
    },
    /// Sent by the debounce timer `timer`; stale once that timer is no
    /// longer the armed one.
    AutosaveDue { timer: TaskId },
    SubmitFinished {
        ticket: Ticket,
        result: Result<SubmitReceipt, ServiceError>,
    },
}

/// Cloneable front door to a running [`FormRuntime`].
#[derive(Debug, Clone)]
pub struct FormHandle {
    commands: mpsc::UnboundedSender<FormCommand>,
    view: watch::Receiver<FormView>,
}

impl FormHandle {
    pub async fn set_value(
        &self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Result<(), FormError> {
        self.request(Request::SetValue {
            name: name.into(),
            value: value.into(),
        })
        .await
    }

    pub async fn submit(&self) -> Result<(), FormError> {
        self.request(Request::Submit).await
    }

    pub async fn reset(&self) -> Result<(), FormError> {
        self.request(Request::Reset).await
    }

    /// Fetch the descriptor list again and start over with a fresh form.
    pub async fn reload(&self) -> Result<(), FormError> {
        self.request(Request::Reload).await
    }

    /// Ask the runtime to tear down. Returns immediately.
    pub fn shutdown(&self) {
        let _ = self.commands.send(FormCommand::Shutdown);
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Latest published view.
    pub fn view(&self) -> FormView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FormView> {
        self.view.clone()
    }

    /// Wait until the published view satisfies `predicate`.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&FormView) -> bool,
    ) -> Result<FormView, FormError> {
        let mut rx = self.view.clone();
        loop {
            {
                let view = rx.borrow_and_update();
                if predicate(&view) {
                    return Ok(view.clone());
                }
            }
            rx.changed().await.map_err(|_| FormError::ChannelClosed)?;
        }
    }

    async fn request(&self, request: Request) -> Result<(), FormError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(FormCommand::Request { request, reply })
            .map_err(|_| FormError::ChannelClosed)?;
        rx.await.map_err(|_| FormError::ChannelClosed)?
    }
}

pub struct FormRuntime {
    session: FormSession,
    service: Arc<dyn FormService>,
    commands: mpsc::UnboundedReceiver<FormCommand>,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    internal_rx: mpsc::UnboundedReceiver<InternalEvent>,
    view_tx: watch::Sender<FormView>,
    shutdown: CancellationToken,
    autosave: Debouncer,
    armed_autosave: Option<TaskId>,
}

impl FormRuntime {
    pub fn new(service: Arc<dyn FormService>, settings: EngineSettings) -> (Self, FormHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let session = FormSession::new(settings);
        let (view_tx, view_rx) = watch::channel(session.view());

        let shutdown = CancellationToken::new();
        let scheduler = TaskScheduler::with_parent(&shutdown);
        let autosave = Debouncer::new(scheduler, session.settings().autosave_debounce());

        let runtime = Self {
            session,
            service,
            commands: cmd_rx,
            internal_tx,
            internal_rx,
            view_tx,
            shutdown,
            autosave,
            armed_autosave: None,
        };
        let handle = FormHandle {
            commands: cmd_tx,
            view: view_rx,
        };
        (runtime, handle)
    }

    /// Create a runtime and spawn its loop on the current Tokio runtime.
    pub fn spawn(
        service: Arc<dyn FormService>,
        settings: EngineSettings,
    ) -> (FormHandle, JoinHandle<()>) {
        let (runtime, handle) = Self::new(service, settings);
        let join = tokio::spawn(runtime.run());
        (handle, join)
    }

    /// Token cancelled when the runtime tears down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(mut self) {
        info!("form runtime started");
        let effects = self.session.begin_load();
        self.execute(effects);
        self.publish();

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                command = self.commands.recv() => {
                    let (request, reply) = match command {
                        None | Some(FormCommand::Shutdown) => break,
                        Some(FormCommand::Request { request, reply }) => (request, reply),
                    };
                    let result = self.handle_request(request);
                    self.publish();
                    let _ = reply.send(result);
                }
                Some(event) = self.internal_rx.recv() => {
                    self.handle_internal(event);
                    self.publish();
                }
            }
        }

        self.teardown();
    }

    fn handle_request(&mut self, request: Request) -> Result<(), FormError> {
        let outcome = match request {
            Request::SetValue { name, value } => self.session.set_value(&name, value),
            Request::Submit => self.session.submit(),
            Request::Reset => Ok(self.session.reset()),
            Request::Reload => Ok(self.session.begin_load()),
        };

        match outcome {
            Ok(effects) => {
                self.execute(effects);
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "request rejected");
                Err(err)
            }
        }
    }

    fn handle_internal(&mut self, event: InternalEvent) {
        let effects = match event {
            InternalEvent::ConfigLoaded { generation, result } => {
                self.session.apply_config(generation, result)
            }
            InternalEvent::AutosaveDue { timer } => {
                // A timer can fire after a reset or a newer edit replaced it;
                // its event is already queued by then.
                if self.armed_autosave != Some(timer) {
                    debug!(timer, "stale autosave timer ignored");
                    return;
                }
                self.armed_autosave = None;
                self.session.autosave_due()
            }
            InternalEvent::SubmitFinished { ticket, result } => {
                self.session.on_submit_result(ticket, result);
                Vec::new()
            }
        };
        self.execute(effects);
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchConfig { generation } => {
                    let service = self.service.clone();
                    self.spawn_call(async move {
                        let result = service.fetch_field_config().await;
                        Some(InternalEvent::ConfigLoaded { generation, result })
                    });
                }
                Effect::ScheduleAutosave => {
                    let tx = self.internal_tx.clone();
                    let id = self.autosave.arm_with(|timer| async move {
                        let _ = tx.send(InternalEvent::AutosaveDue { timer });
                    });
                    self.armed_autosave = Some(id);
                    debug!(timer = id, "autosave scheduled");
                }
                Effect::CancelAutosave => {
                    self.armed_autosave = None;
                    if self.autosave.cancel() {
                        debug!("pending autosave cancelled");
                    }
                }
                Effect::Autosave(values) => {
                    let service = self.service.clone();
                    self.spawn_call(async move {
                        let fields = values.len();
                        match service.autosave(values).await {
                            Ok(_) => debug!(fields, "autosave stored"),
                            Err(err) => warn!(error = %err, "autosave failed"),
                        }
                        None
                    });
                }
                Effect::Submit { ticket, values } => {
                    let service = self.service.clone();
                    self.spawn_call(async move {
                        let result = service.submit_form(values).await;
                        Some(InternalEvent::SubmitFinished { ticket, result })
                    });
                }
            }
        }
    }

    /// Run a collaborator call off the loop; its result (if any) re-enters
    /// as an internal event. Aborted on teardown.
    fn spawn_call<F>(&self, call: F)
    where
        F: Future<Output = Option<InternalEvent>> + Send + 'static,
    {
        let tx = self.internal_tx.clone();
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                event = call => {
                    if let Some(event) = event {
                        let _ = tx.send(event);
                    }
                }
            }
        });
    }

    fn publish(&self) {
        self.view_tx.send_replace(self.session.view());
    }

    fn teardown(&mut self) {
        info!("form runtime shutting down");
        self.armed_autosave = None;
        self.autosave.cancel();
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::memory::InMemoryFormService;

    #[tokio::test]
    async fn handle_reports_closed_runtime() {
        let service = Arc::new(InMemoryFormService::demo());
        let (handle, join) = FormRuntime::spawn(service, EngineSettings::default());
        handle.shutdown();
        join.await.unwrap();
        assert!(handle.is_closed());
        assert_eq!(handle.submit().await, Err(FormError::ChannelClosed));
    }

    #[tokio::test]
    async fn dropping_every_handle_stops_the_runtime() {
        let service = Arc::new(InMemoryFormService::demo());
        let (handle, join) = FormRuntime::spawn(service, EngineSettings::default());
        drop(handle);
        join.await.unwrap();
    }
}
