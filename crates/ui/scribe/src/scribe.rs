use std::sync::Arc;

use color_eyre::Result;
use form_engine::{FormError, FormHandle, FormRuntime, FormService};
use ratatui::prelude::Rect;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    action::Action,
    components::{
        Component,
        form::{FormPanel, status_for},
    },
    config::Config,
    tui::{Event, EventResponse, Tui},
};

pub struct App {
    config: Config,
    handle: FormHandle,
    runtime: Option<JoinHandle<()>>,
    panel: FormPanel,
    should_quit: bool,
}

impl App {
    /// Spawn the form runtime on `service`. Must be called inside a tokio runtime.
    pub fn new(config: Config, service: Arc<dyn FormService>) -> Self {
        let (handle, runtime) = FormRuntime::spawn(service, config.engine.clone());
        let mut panel = FormPanel::new();
        panel.set_view(handle.view());
        Self {
            config,
            handle,
            runtime: Some(runtime),
            panel,
            should_quit: false,
        }
    }

    pub fn handle(&self) -> &FormHandle {
        &self.handle
    }

    pub fn panel(&self) -> &FormPanel {
        &self.panel
    }

    pub async fn run(&mut self) -> Result<()> {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
        let mut view_rx = self.handle.subscribe();

        let mut tui = Tui::new()?
            .tick_rate(self.config.tick_rate)
            .frame_rate(self.config.frame_rate);
        tui.enter()?;
        self.panel.init()?;

        loop {
            tokio::select! {
                event = tui.next() => {
                    let Some(event) = event else { break };
                    self.handle_event(event, &action_tx)?;
                }
                changed = view_rx.changed() => {
                    if changed.is_err() {
                        warn!("form runtime stopped");
                        self.should_quit = true;
                    } else {
                        let view = view_rx.borrow_and_update().clone();
                        self.panel.set_view(view);
                        action_tx.send(Action::Render).ok();
                    }
                }
            }

            while let Ok(action) = action_rx.try_recv() {
                if !matches!(action, Action::Tick | Action::Render) {
                    debug!("{action}");
                }
                match &action {
                    Action::Quit => self.should_quit = true,
                    Action::Render => self.draw(&mut tui)?,
                    Action::Resize(w, h) => {
                        tui.resize(Rect::new(0, 0, *w, *h))?;
                        self.draw(&mut tui)?;
                    }
                    Action::Error(message) => error!("{message}"),
                    _ => {
                        if let Some(follow_up) = self.perform(&action).await {
                            action_tx.send(follow_up).ok();
                        }
                    }
                }
                if let Some(next) = self.panel.update(action)? {
                    action_tx.send(next).ok();
                }
            }

            if self.should_quit {
                tui.stop();
                break;
            }
        }
        tui.exit()?;
        self.shutdown().await;
        Ok(())
    }

    fn handle_event(
        &mut self,
        event: Event,
        action_tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<()> {
        match self.panel.handle_events(event.clone())? {
            Some(EventResponse::Stop(action)) => {
                action_tx.send(action).ok();
                return Ok(());
            }
            Some(EventResponse::Continue(action)) => {
                action_tx.send(action).ok();
            }
            None => {}
        }
        let action = match event {
            Event::Quit => Action::Quit,
            Event::Tick => Action::Tick,
            Event::Render => Action::Render,
            Event::Resize(x, y) => Action::Resize(x, y),
            Event::Error => Action::Error("terminal event error".into()),
            _ => return Ok(()),
        };
        action_tx.send(action).ok();
        Ok(())
    }

    /// Forward a form action to the runtime. A rejection comes back as an
    /// [`Action::Error`] for the status line.
    pub async fn perform(&self, action: &Action) -> Option<Action> {
        let result: Result<(), FormError> = match action {
            Action::SetValue { name, value } => {
                self.handle.set_value(name.clone(), value.clone()).await
            }
            Action::Submit => self.handle.submit().await,
            Action::Reset => self.handle.reset().await,
            Action::Reload => self.handle.reload().await,
            _ => Ok(()),
        };
        match result {
            Ok(()) => None,
            Err(err) => {
                info!(%action, "form rejected action: {err}");
                Some(Action::Error(status_for(&err)))
            }
        }
    }

    fn draw(&mut self, tui: &mut Tui) -> Result<()> {
        tui.draw(|f| {
            let area = f.area();
            if let Err(err) = self.panel.draw(f, area) {
                error!("Failed to draw: {err:?}");
            }
        })?;
        Ok(())
    }

    /// Tear the form runtime down and wait for it to finish.
    pub async fn shutdown(&mut self) {
        self.handle.shutdown();
        if let Some(runtime) = self.runtime.take() {
            if let Err(err) = runtime.await {
                error!("form runtime task failed: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_engine::service::memory::InMemoryFormService;
    use form_engine::{FieldValue, SessionPhase, SubmissionState};
    use pretty_assertions::assert_eq;

    async fn ready_app(service: Arc<InMemoryFormService>) -> App {
        let app = App::new(Config::default(), service);
        app.handle()
            .wait_for(|v| v.phase != SessionPhase::Loading)
            .await
            .unwrap();
        app
    }

    #[tokio::test(start_paused = true)]
    async fn set_value_reaches_the_runtime() {
        let app = ready_app(Arc::new(InMemoryFormService::demo())).await;
        let follow_up = app
            .perform(&Action::SetValue {
                name: "name_8066616423".into(),
                value: FieldValue::text("Ada"),
            })
            .await;
        assert_eq!(follow_up, None);
        assert_eq!(
            app.handle().view().values.get("name_8066616423"),
            Some(&FieldValue::text("Ada"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_submit_becomes_status_error() {
        let app = ready_app(Arc::new(InMemoryFormService::demo())).await;
        let follow_up = app.perform(&Action::Submit).await;
        assert_eq!(
            follow_up,
            Some(Action::Error("Please fix 2 fields before submitting".into()))
        );
        assert_eq!(app.handle().view().submission, SubmissionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_runtime() {
        let mut app = ready_app(Arc::new(InMemoryFormService::demo())).await;
        app.shutdown().await;
        assert_eq!(
            app.perform(&Action::Reset).await,
            Some(Action::Error("form runtime has shut down".into()))
        );
    }
}
