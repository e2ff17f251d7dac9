//! Interactive form panel.
//!
//! The panel never owns form state: it mirrors the latest [`FormView`]
//! published by the runtime and turns key presses into [`Action`]s. Local
//! state is limited to focus, scroll position and the in-progress text
//! edit.

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use form_engine::{FieldKind, FieldValue, FieldView, FormError, FormView, SessionPhase};
use ratatui::layout::Rect;
use tui_input::{Input, backend::crossterm::EventHandler};

use crate::{
    action::Action,
    components::Component,
    tui::{EventResponse, Frame},
};

mod render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }
}

/// Status line text for a rejected form operation.
pub fn status_for(err: &FormError) -> String {
    match err {
        FormError::ValidationFailed { count: 1 } => "Please fix 1 field before submitting".into(),
        FormError::ValidationFailed { count } => {
            format!("Please fix {count} fields before submitting")
        }
        FormError::NotReady => "The form has not loaded yet".into(),
        other => other.to_string(),
    }
}

#[derive(Default)]
pub struct FormPanel {
    view: FormView,
    focused: usize,
    scroll: usize,
    editing: bool,
    input: Input,
    status: Option<Status>,
}

impl FormPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &FormView {
        &self.view
    }

    /// Replace the mirrored view. Focus follows the field it was on when
    /// the field set changes; an edit of a field that disappeared is dropped.
    pub fn set_view(&mut self, view: FormView) {
        let focused_name = self.focused_field().map(|f| f.spec.name.clone());
        self.view = view;

        if let Some(name) = focused_name {
            if let Some(idx) = self.view.fields.iter().position(|f| f.spec.name == name) {
                self.focused = idx;
            } else if self.editing {
                self.cancel_editing();
            }
        }
        self.focused = self.focused.min(self.view.fields.len().saturating_sub(1));
        self.scroll = self.scroll.min(self.focused);
    }

    pub fn focused_index(&self) -> usize {
        self.focused
    }

    pub fn focused_field(&self) -> Option<&FieldView> {
        self.view.fields.get(self.focused)
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn input_value(&self) -> &str {
        self.input.value()
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    pub(super) fn scroll(&self) -> usize {
        self.scroll
    }

    /// Rows a field occupies when rendered, spacer included.
    pub(super) fn field_height(field: &FieldView) -> usize {
        let mut rows = 2;
        if field.spec.description.is_some() {
            rows += 1;
        }
        if field.error.is_some() {
            rows += 1;
        }
        if !field.spec.kind.is_supported() {
            rows += 1;
        }
        rows
    }

    /// Scroll so the focused field fits into `height` rows.
    pub(super) fn ensure_visible(&mut self, height: u16) {
        if self.focused < self.scroll {
            self.scroll = self.focused;
            return;
        }
        let budget = height as usize;
        while self.scroll < self.focused {
            let used: usize = self.view.fields[self.scroll..=self.focused]
                .iter()
                .map(Self::field_height)
                .sum();
            if used <= budget {
                break;
            }
            self.scroll += 1;
        }
    }

    fn focus_next(&mut self) {
        let count = self.view.fields.len();
        if count == 0 {
            return;
        }
        self.focused = (self.focused + 1) % count;
    }

    fn focus_prev(&mut self) {
        let count = self.view.fields.len();
        if count == 0 {
            return;
        }
        self.focused = if self.focused == 0 {
            count - 1
        } else {
            self.focused - 1
        };
    }

    fn start_editing(&mut self) {
        let Some(field) = self.focused_field() else {
            return;
        };
        let existing = field.value.as_ref().map(|v| v.to_string()).unwrap_or_default();
        self.input = Input::default().with_value(existing);
        self.editing = true;
    }

    fn cancel_editing(&mut self) {
        self.editing = false;
        self.input = Input::default();
    }

    fn commit_editing(&mut self) -> Option<Action> {
        let name = self.focused_field().map(|f| f.spec.name.clone());
        let value = self.input.value().to_string();
        self.cancel_editing();
        name.map(|name| Action::SetValue {
            name,
            value: FieldValue::Text(value),
        })
    }

    /// Value one step from the current selection, wrapping around.
    fn cycle_option(
        current: Option<&FieldValue>,
        options: &[String],
        forward: bool,
    ) -> Option<String> {
        if options.is_empty() {
            return None;
        }
        let len = options.len();
        let position = current
            .and_then(|v| v.as_str())
            .and_then(|s| options.iter().position(|o| o == s));
        let next = match (position, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(idx), true) => (idx + 1) % len,
            (Some(idx), false) => (idx + len - 1) % len,
        };
        Some(options[next].clone())
    }

    /// Checkbox toggle or select cycle for the focused field.
    fn change_choice(&self, forward: bool) -> Option<Action> {
        let field = self.focused_field()?;
        let value = match &field.spec.kind {
            FieldKind::Checkbox => {
                let checked = field.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false);
                FieldValue::Bool(!checked)
            }
            FieldKind::Select { options } => {
                FieldValue::Text(Self::cycle_option(field.value.as_ref(), options, forward)?)
            }
            _ => return None,
        };
        Some(Action::SetValue {
            name: field.spec.name.clone(),
            value,
        })
    }

    fn handle_editing_key(&mut self, key: KeyEvent) -> EventResponse<Action> {
        match key.code {
            KeyCode::Enter => match self.commit_editing() {
                Some(action) => EventResponse::Stop(action),
                None => EventResponse::Stop(Action::Update),
            },
            KeyCode::Esc => {
                self.cancel_editing();
                EventResponse::Stop(Action::Update)
            }
            _ => {
                self.input.handle_event(&crossterm::event::Event::Key(key));
                EventResponse::Stop(Action::Update)
            }
        }
    }
}

impl Component for FormPanel {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<EventResponse<Action>>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            let action = match key.code {
                KeyCode::Char('c') => Action::Quit,
                KeyCode::Char('s') => Action::Submit,
                KeyCode::Char('r') => Action::Reset,
                KeyCode::Char('l') => Action::Reload,
                _ => return Ok(None),
            };
            self.cancel_editing();
            return Ok(Some(EventResponse::Stop(action)));
        }

        if self.editing {
            return Ok(Some(self.handle_editing_key(key)));
        }

        if let SessionPhase::LoadFailed(_) = self.view.phase {
            return Ok(match key.code {
                KeyCode::Char('r') | KeyCode::Enter => Some(EventResponse::Stop(Action::Reload)),
                KeyCode::Char('q') | KeyCode::Esc => Some(EventResponse::Stop(Action::Quit)),
                _ => None,
            });
        }

        let response = match key.code {
            KeyCode::Char('q') => EventResponse::Stop(Action::Quit),
            KeyCode::Up | KeyCode::BackTab => {
                self.focus_prev();
                EventResponse::Stop(Action::Update)
            }
            KeyCode::Down | KeyCode::Tab => {
                self.focus_next();
                EventResponse::Stop(Action::Update)
            }
            KeyCode::Home => {
                self.focused = 0;
                EventResponse::Stop(Action::Update)
            }
            KeyCode::End => {
                self.focused = self.view.fields.len().saturating_sub(1);
                EventResponse::Stop(Action::Update)
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') => {
                match self.change_choice(!matches!(key.code, KeyCode::Left)) {
                    Some(action) => EventResponse::Stop(action),
                    None => return Ok(None),
                }
            }
            KeyCode::Enter => {
                let target = self
                    .focused_field()
                    .map(|f| (f.spec.kind.is_textual(), f.spec.disabled, f.spec.label.clone()));
                match target {
                    Some((_, true, label)) => {
                        self.set_status(Status::error(format!("{label} is disabled")));
                        EventResponse::Stop(Action::Update)
                    }
                    Some((true, false, _)) => {
                        self.start_editing();
                        EventResponse::Stop(Action::Update)
                    }
                    _ => EventResponse::Stop(Action::Submit),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(response))
    }

    fn handle_paste(&mut self, text: String) -> Result<Option<EventResponse<Action>>> {
        if !self.editing {
            return Ok(None);
        }
        let value = format!("{}{}", self.input.value(), text.replace(['\r', '\n'], " "));
        self.input = Input::default().with_value(value);
        Ok(Some(EventResponse::Stop(Action::Update)))
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::Error(message) => self.set_status(Status::error(message)),
            Action::Submit | Action::SetValue { .. } => self.status = None,
            Action::Reset => self.set_status(Status::info("Form reset")),
            Action::Reload => self.set_status(Status::info("Reloading form...")),
            _ => return Ok(None),
        }
        Ok(Some(Action::Render))
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        render::render_form(self, f, area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_engine::FieldSpec;
    use pretty_assertions::assert_eq;

    fn row(name: &str, kind: FieldKind, value: Option<FieldValue>) -> FieldView {
        FieldView {
            spec: FieldSpec {
                name: name.into(),
                label: name.to_uppercase(),
                kind,
                required: false,
                placeholder: None,
                disabled: false,
                description: None,
            },
            value,
            error: None,
        }
    }

    fn ready(fields: Vec<FieldView>) -> FormView {
        FormView {
            phase: SessionPhase::Ready,
            fields,
            submit_label: "Submit".into(),
            submit_enabled: true,
            ..FormView::default()
        }
    }

    fn panel(fields: Vec<FieldView>) -> FormPanel {
        let mut panel = FormPanel::new();
        panel.set_view(ready(fields));
        panel
    }

    fn press(panel: &mut FormPanel, code: KeyCode) -> Option<Action> {
        panel
            .handle_key_events(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
            .map(|r| match r {
                EventResponse::Stop(a) | EventResponse::Continue(a) => a,
            })
    }

    #[test]
    fn text_edit_commits_set_value() {
        let mut panel = panel(vec![row("name", FieldKind::TextInput, Some("Al".into()))]);

        assert_eq!(press(&mut panel, KeyCode::Enter), Some(Action::Update));
        assert!(panel.is_editing());
        assert_eq!(panel.input_value(), "Al");

        press(&mut panel, KeyCode::Char('i'));
        assert_eq!(
            press(&mut panel, KeyCode::Enter),
            Some(Action::SetValue {
                name: "name".into(),
                value: FieldValue::text("Ali"),
            })
        );
        assert!(!panel.is_editing());
    }

    #[test]
    fn escape_discards_the_edit() {
        let mut panel = panel(vec![row("name", FieldKind::TextInput, None)]);
        press(&mut panel, KeyCode::Enter);
        press(&mut panel, KeyCode::Char('x'));
        assert_eq!(press(&mut panel, KeyCode::Esc), Some(Action::Update));
        assert!(!panel.is_editing());
    }

    #[test]
    fn space_toggles_checkbox() {
        let mut panel = panel(vec![row("terms", FieldKind::Checkbox, Some(false.into()))]);
        assert_eq!(
            press(&mut panel, KeyCode::Char(' ')),
            Some(Action::SetValue {
                name: "terms".into(),
                value: FieldValue::Bool(true),
            })
        );
    }

    #[test]
    fn select_cycles_through_options_in_both_directions() {
        let options = vec!["email".to_string(), "phone".to_string()];
        let select = FieldKind::Select { options };
        let mut panel = panel(vec![row("contact_method", select, Some("".into()))]);

        assert_eq!(
            press(&mut panel, KeyCode::Right),
            Some(Action::SetValue {
                name: "contact_method".into(),
                value: FieldValue::text("email"),
            })
        );
        assert_eq!(
            press(&mut panel, KeyCode::Left),
            Some(Action::SetValue {
                name: "contact_method".into(),
                value: FieldValue::text("phone"),
            })
        );
    }

    #[test]
    fn enter_on_checkbox_submits() {
        let mut panel = panel(vec![row("terms", FieldKind::Checkbox, None)]);
        assert_eq!(press(&mut panel, KeyCode::Enter), Some(Action::Submit));
    }

    #[test]
    fn focus_wraps_and_follows_field_across_views() {
        let mut panel = panel(vec![
            row("a", FieldKind::TextInput, None),
            row("b", FieldKind::NumberInput, None),
        ]);
        press(&mut panel, KeyCode::Up);
        assert_eq!(panel.focused_index(), 1);

        panel.set_view(ready(vec![
            row("a", FieldKind::TextInput, None),
            row("contact_method", FieldKind::Select { options: vec![] }, None),
            row("b", FieldKind::NumberInput, None),
        ]));
        assert_eq!(panel.focused_field().map(|f| f.spec.name.as_str()), Some("b"));
    }

    #[test]
    fn edit_of_vanished_field_is_dropped() {
        let mut panel = panel(vec![
            row("a", FieldKind::TextInput, None),
            row("b", FieldKind::TextInput, None),
        ]);
        press(&mut panel, KeyCode::Down);
        press(&mut panel, KeyCode::Enter);
        assert!(panel.is_editing());

        panel.set_view(ready(vec![row("a", FieldKind::TextInput, None)]));
        assert_eq!(panel.focused_index(), 0);
        assert!(!panel.is_editing());
    }

    #[test]
    fn load_failure_offers_reload() {
        let mut panel = FormPanel::new();
        panel.set_view(FormView {
            phase: SessionPhase::LoadFailed("unexpected status: 503".into()),
            ..FormView::default()
        });
        assert_eq!(press(&mut panel, KeyCode::Char('r')), Some(Action::Reload));
    }

    #[test]
    fn ctrl_shortcuts_map_to_form_actions() {
        let mut panel = panel(vec![row("a", FieldKind::TextInput, None)]);
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        let action = |r: Option<EventResponse<Action>>| match r {
            Some(EventResponse::Stop(a)) => Some(a),
            _ => None,
        };
        assert_eq!(action(panel.handle_key_events(ctrl('s')).unwrap()), Some(Action::Submit));
        assert_eq!(action(panel.handle_key_events(ctrl('r')).unwrap()), Some(Action::Reset));
        assert_eq!(action(panel.handle_key_events(ctrl('l')).unwrap()), Some(Action::Reload));
    }

    #[test]
    fn scroll_keeps_focused_field_in_view() {
        let fields = (0..6)
            .map(|i| row(&format!("f{i}"), FieldKind::TextInput, None))
            .collect();
        let mut panel = panel(fields);
        panel.focused = 5;
        panel.ensure_visible(6);
        assert_eq!(panel.scroll(), 3);
        panel.focused = 1;
        panel.ensure_visible(6);
        assert_eq!(panel.scroll(), 1);
    }

    #[test]
    fn validation_status_is_pluralised() {
        assert_eq!(
            status_for(&FormError::ValidationFailed { count: 2 }),
            "Please fix 2 fields before submitting"
        );
        assert_eq!(
            status_for(&FormError::ValidationFailed { count: 1 }),
            "Please fix 1 field before submitting"
        );
    }
}
