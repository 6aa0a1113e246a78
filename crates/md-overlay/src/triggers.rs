//! Declarative triggers and built-in capabilities
//!
//! Document-level delegated click handlers for trigger elements
//! (`data-md-dialog="{target: '#id'}"`), dialog actions and scrims, plus
//! the `"dialog"` capability.

use md_core::options::get_str;
use md_core::{parse_options, Collection, Event, Value};

use crate::dialog::{DialogState, ACTION_ATTRIBUTE, SCRIM_SELECTOR};
use crate::Runtime;

impl Runtime {
    pub(crate) fn install_triggers(&mut self) {
        let document = self.document.root();
        let trigger = self.config.trigger_selector();
        let action = format!("[{}]", ACTION_ATTRIBUTE);

        let registrations = [
            self.events.on(
                &mut self.document,
                document,
                "click.md-overlay",
                Some(trigger.as_str()),
                |rt: &mut Runtime, event: &mut Event| rt.handle_trigger(event),
            ),
            self.events.on(
                &mut self.document,
                document,
                "click.md-overlay",
                Some(action.as_str()),
                |rt: &mut Runtime, event: &mut Event| rt.handle_action(event),
            ),
            self.events.on(
                &mut self.document,
                document,
                "click.md-overlay",
                Some(SCRIM_SELECTOR),
                |rt: &mut Runtime, event: &mut Event| rt.handle_scrim(event),
            ),
        ];
        if registrations.iter().any(Option::is_none) {
            tracing::warn!("trigger attribute '{}' does not form a valid selector", self.config.trigger_attribute);
        }
    }

    fn handle_trigger(&mut self, event: &mut Event) {
        let trigger = event.current_target;
        let raw = self
            .document
            .get_attr(trigger, &self.config.trigger_attribute)
            .unwrap_or_default()
            .to_string();
        let options = parse_options(&raw);
        let Some(selector) = get_str(&options, "target") else {
            tracing::debug!("trigger {} has no target", trigger);
            return;
        };
        let Some(target) = Collection::resolve(&self.document, selector).first() else {
            tracing::debug!("trigger {} target '{}' matched nothing", trigger, selector);
            return;
        };

        if self.document.tag_name(trigger) == Some("a") {
            event.prevent_default();
        }
        self.open_with_options(target, &options);
    }

    fn handle_action(&mut self, event: &mut Event) {
        let action = event.current_target;
        let Some(dialog) = self.dialog_for(action) else {
            return;
        };
        let value = self
            .document
            .get_attr(action, ACTION_ATTRIBUTE)
            .filter(|v| !v.is_empty())
            .map(String::from);
        self.close_dialog(dialog, value);
    }

    fn handle_scrim(&mut self, event: &mut Event) {
        let scrim = event.current_target;
        let Some(dialog) = self.dialog_for(scrim) else {
            return;
        };
        let notice = self.emit(dialog, "overlay-click", true, Value::Null);
        if notice.is_default_prevented() {
            return;
        }
        let enabled = self
            .controller(dialog)
            .is_some_and(|c| c.props.get_bool("closeOnOverlayClick"));
        if enabled && self.overlays.is_top(dialog) {
            self.close_dialog(dialog, None);
        }
    }

    pub(crate) fn register_capabilities(&mut self) {
        self.capabilities.register(
            "dialog",
            |rt: &mut Runtime, collection: &Collection, args: &[Value]| {
                let action = args.first().and_then(Value::as_str).unwrap_or("open");
                let return_value = args.get(1).and_then(Value::as_str).map(String::from);
                let mut changed = 0;
                for node in collection.iter() {
                    let done = match action {
                        "open" => rt.open_dialog(node),
                        "close" => rt.close_dialog(node, return_value.clone()),
                        "toggle" => match rt.dialog_state(node) {
                            Some(DialogState::Opening | DialogState::Active) => {
                                rt.close_dialog(node, return_value.clone())
                            }
                            _ => rt.open_dialog(node),
                        },
                        other => {
                            tracing::warn!("unknown dialog action '{}'", other);
                            false
                        }
                    };
                    if done {
                        changed += 1;
                    }
                }
                Value::from(changed)
            },
        );
    }
}
