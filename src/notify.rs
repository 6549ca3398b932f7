//! Notification router for host-pushed events.
//!
//! Consumes message envelopes and modal requests from the event bridge
//! and renders exactly one UI reaction per event: a transient message, a
//! dismissable notification, or a modal dialog. A malformed envelope is
//! dropped with a router-level error message of its own; the router never
//! lets an error escape to its caller.

use std::sync::atomic::{AtomicU64, Ordering};

use cursive::{
    Cursive,
    view::{Nameable, Resizable, View},
    views::{Dialog, TextView},
};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    bridge::{EventBridge, Subscription},
    error::ConfigError,
};

/// Channel carrying the modal-open request for the data loader.
pub const CHANNEL_LOAD_DATA: &str = "loadData";
/// Channel carrying notification envelopes.
pub const CHANNEL_MESSAGE_DIALOGS: &str = "messageDialogs";
/// Channel carrying transient message envelopes.
pub const CHANNEL_GLOBAL_MSG: &str = "globalMsg";

/// Default display time for the transient message variant, in seconds.
pub const DEFAULT_MESSAGE_SECS: f64 = 1.5;
/// Default display time for the notification variant, in seconds.
pub const DEFAULT_NOTIFICATION_SECS: f64 = 3.0;

/// Default modal width in terminal cells.
pub const DEFAULT_MODAL_WIDTH: usize = 500;

/// Severity of a message envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Operation completed.
    Success,
    /// Operation failed.
    Error,
    /// Something needs attention but did not fail.
    Warning,
    /// Neutral information.
    Info,
}

impl MessageKind {
    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            MessageKind::Success => "Success",
            MessageKind::Error => "Error",
            MessageKind::Warning => "Warning",
            MessageKind::Info => "Info",
        }
    }
}

/// Which UI reaction an envelope renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageVariant {
    /// Transient, self-dismissing message.
    Message,
    /// Notification with a dismiss button.
    Notification,
}

impl MessageVariant {
    /// Display time used when the envelope carries no duration.
    pub fn default_secs(self) -> f64 {
        match self {
            MessageVariant::Message => DEFAULT_MESSAGE_SECS,
            MessageVariant::Notification => DEFAULT_NOTIFICATION_SECS,
        }
    }
}

/// Typed payload pushed through the message channels.
///
/// Field names follow the host's wire format; `type`/`msg`/`time` are
/// accepted as aliases for compatibility with the older message channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Severity, selects the rendered style.
    #[serde(rename = "dialogType", alias = "type")]
    pub kind: MessageKind,
    /// Display content; stringified when not already text.
    #[serde(alias = "msg")]
    pub content: Value,
    /// Display time override in seconds; zero or negative means default.
    #[serde(
        rename = "duration",
        alias = "time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_secs: Option<f64>,
    /// Optional title for the notification variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl MessageEnvelope {
    /// Build a plain-text envelope.
    pub fn text(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: Value::String(content.into()),
            duration_secs: None,
            title: None,
        }
    }

    /// Shape-check and decode a raw event payload.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MalformedEnvelope`] when the payload does
    /// not match the envelope shape.
    pub fn parse(payload: &Value) -> Result<Self, ConfigError> {
        serde_json::from_value(payload.clone()).map_err(|e| ConfigError::MalformedEnvelope {
            reason: e.to_string(),
        })
    }

    /// Variant this envelope renders as: a title selects the
    /// dismissable notification, an untitled envelope stays a transient
    /// message.
    pub fn variant(&self) -> MessageVariant {
        if self.title.is_some() {
            MessageVariant::Notification
        } else {
            MessageVariant::Message
        }
    }

    /// Display time for the given variant, falling back to the variant
    /// default when unset or not positive.
    pub fn resolved_secs(&self, variant: MessageVariant) -> f64 {
        match self.duration_secs {
            Some(secs) if secs > 0.0 => secs,
            _ => variant.default_secs(),
        }
    }

    /// Content as display text. Structured content is stringified; a
    /// serialization failure renders a marker instead of panicking.
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
        }
    }
}

/// Request to open a named modal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalRequest {
    /// Dialog title.
    pub title: String,
    /// Dialog width in cells.
    #[serde(default = "default_modal_width")]
    pub width: usize,
    /// Whether a footer with a close button is shown.
    #[serde(default, rename = "isFooter")]
    pub show_footer: bool,
}

fn default_modal_width() -> usize {
    DEFAULT_MODAL_WIDTH
}

impl ModalRequest {
    /// The data-loader modal opened by the `loadData` channel.
    pub fn load_data() -> Self {
        Self {
            title: "Load data".to_string(),
            width: DEFAULT_MODAL_WIDTH,
            show_footer: false,
        }
    }
}

static LAYER_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_layer_name(prefix: &str) -> String {
    format!("{prefix}:{}", LAYER_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// Show a transient message layer that dismisses itself after the
/// envelope's resolved duration.
pub fn show_message(siv: &mut Cursive, envelope: &MessageEnvelope) {
    let name = next_layer_name("msg");
    let text = format!("[{}] {}", envelope.kind.label(), envelope.content_text());
    siv.add_layer(Dialog::around(TextView::new(text)).with_name(&name));
    dismiss_after(siv, name, envelope.resolved_secs(MessageVariant::Message));
}

/// Show a notification with a dismiss button; it also auto-dismisses
/// after the envelope's resolved duration.
pub fn show_notification(siv: &mut Cursive, envelope: &MessageEnvelope) {
    let name = next_layer_name("notif");
    let title = envelope
        .title
        .clone()
        .unwrap_or_else(|| envelope.kind.label().to_string());
    siv.add_layer(
        Dialog::around(TextView::new(envelope.content_text()))
            .title(title)
            .dismiss_button("Close")
            .with_name(&name),
    );
    dismiss_after(siv, name, envelope.resolved_secs(MessageVariant::Notification));
}

/// Show a modal dialog with the supplied body.
pub fn show_modal<V: View>(siv: &mut Cursive, request: &ModalRequest, body: V) {
    let mut dialog = Dialog::around(body).title(request.title.as_str());
    if request.show_footer {
        dialog = dialog.dismiss_button("Close");
    }
    siv.add_layer(dialog.fixed_width(request.width));
}

fn dismiss_after(siv: &mut Cursive, name: String, secs: f64) {
    let sink = siv.cb_sink().clone();
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_secs_f64(secs));
        // The send fails only when the UI is already gone.
        let _ = sink.send(Box::new(move |s: &mut Cursive| {
            let screen = s.screen_mut();
            if let Some(pos) = screen.find_layer_from_name(&name) {
                screen.remove_layer(pos);
            }
        }));
    });
}

/// Bridge consumer that turns host events into UI reactions.
///
/// Holds the channel subscriptions for one UI activation; dropping the
/// router (or calling [`detach`](Self::detach)) tears them down so no
/// stale handler fires into a destroyed context.
pub struct NotificationRouter {
    subscriptions: Vec<Subscription>,
}

impl NotificationRouter {
    /// Subscribe the well-known channels on `bridge`, rendering through
    /// the UI thread behind `sink`.
    ///
    /// Both message channels route through the envelope's own variant
    /// selection; an untitled envelope renders as a transient message.
    pub fn attach(bridge: &EventBridge, sink: cursive::CbSink) -> Self {
        let dialog_sink = sink.clone();
        let messages = bridge.subscribe(CHANNEL_MESSAGE_DIALOGS, move |payload| {
            route_envelope(&dialog_sink, payload);
        });

        let msg_sink = sink.clone();
        let globals = bridge.subscribe(CHANNEL_GLOBAL_MSG, move |payload| {
            route_envelope(&msg_sink, payload);
        });

        // Payload is ignored by contract; the event only opens the modal.
        let load = bridge.subscribe(CHANNEL_LOAD_DATA, move |_payload| {
            let _ = sink.send(Box::new(|s: &mut Cursive| {
                show_modal(s, &ModalRequest::load_data(), crate::ui::load_data_view());
            }));
        });

        Self {
            subscriptions: vec![messages, globals, load],
        }
    }

    /// Tear down all channel subscriptions. Idempotent.
    pub fn detach(&mut self) {
        for sub in &mut self.subscriptions {
            sub.unsubscribe();
        }
    }
}

fn route_envelope(sink: &cursive::CbSink, payload: &Value) {
    let envelope = match MessageEnvelope::parse(payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("dropping event payload: {e}");
            // The router reports its own failures as an error message.
            let fallback = MessageEnvelope::text(MessageKind::Error, e.to_string());
            let _ = sink.send(Box::new(move |s: &mut Cursive| {
                show_message(s, &fallback);
            }));
            return;
        }
    };
    let _ = sink.send(Box::new(move |s: &mut Cursive| match envelope.variant() {
        MessageVariant::Message => show_message(s, &envelope),
        MessageVariant::Notification => show_notification(s, &envelope),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_duration_uses_variant_defaults() {
        let envelope =
            MessageEnvelope::parse(&json!({"dialogType": "error", "content": "x"})).unwrap();
        assert_eq!(envelope.kind, MessageKind::Error);
        assert_eq!(
            envelope.resolved_secs(MessageVariant::Message),
            DEFAULT_MESSAGE_SECS
        );
        assert_eq!(
            envelope.resolved_secs(MessageVariant::Notification),
            DEFAULT_NOTIFICATION_SECS
        );
    }

    // An untitled dialog event with no duration renders the transient
    // message variant with its 1.5 s default; a title upgrades the
    // envelope to the 3 s notification variant.
    #[test]
    fn variant_follows_title_presence() {
        let untitled =
            MessageEnvelope::parse(&json!({"dialogType": "error", "content": "x"})).unwrap();
        assert_eq!(untitled.variant(), MessageVariant::Message);
        assert_eq!(
            untitled.resolved_secs(untitled.variant()),
            DEFAULT_MESSAGE_SECS
        );

        let titled = MessageEnvelope::parse(
            &json!({"dialogType": "info", "content": "x", "title": "Heads up"}),
        )
        .unwrap();
        assert_eq!(titled.variant(), MessageVariant::Notification);
        assert_eq!(
            titled.resolved_secs(titled.variant()),
            DEFAULT_NOTIFICATION_SECS
        );
    }

    #[test]
    fn zero_duration_falls_back_to_default() {
        let envelope = MessageEnvelope::parse(
            &json!({"dialogType": "info", "content": "x", "duration": 0.0}),
        )
        .unwrap();
        assert_eq!(
            envelope.resolved_secs(MessageVariant::Message),
            DEFAULT_MESSAGE_SECS
        );

        let envelope = MessageEnvelope::parse(
            &json!({"dialogType": "info", "content": "x", "duration": 4.0}),
        )
        .unwrap();
        assert_eq!(envelope.resolved_secs(MessageVariant::Message), 4.0);
    }

    #[test]
    fn legacy_field_names_accepted() {
        let envelope =
            MessageEnvelope::parse(&json!({"type": "warning", "msg": "careful", "time": 2.0}))
                .unwrap();
        assert_eq!(envelope.kind, MessageKind::Warning);
        assert_eq!(envelope.content_text(), "careful");
        assert_eq!(envelope.resolved_secs(MessageVariant::Message), 2.0);
    }

    #[test]
    fn malformed_envelope_is_rejected() {
        let err = MessageEnvelope::parse(&json!({"dialogType": "fatal", "content": "x"}))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedEnvelope { .. }));

        let err = MessageEnvelope::parse(&json!("just a string")).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedEnvelope { .. }));
    }

    #[test]
    fn structured_content_is_stringified() {
        let envelope = MessageEnvelope::parse(
            &json!({"dialogType": "info", "content": {"code": 7, "detail": "x"}}),
        )
        .unwrap();
        let text = envelope.content_text();
        assert!(text.contains("\"code\":7"));
    }

    #[test]
    fn modal_request_defaults() {
        let request: ModalRequest = serde_json::from_value(json!({"title": "T"})).unwrap();
        assert_eq!(request.width, DEFAULT_MODAL_WIDTH);
        assert!(!request.show_footer);

        let load = ModalRequest::load_data();
        assert_eq!(load.width, DEFAULT_MODAL_WIDTH);
    }

    #[test]
    fn show_message_adds_a_layer() {
        let mut siv = Cursive::new();
        let before = siv.screen().len();
        show_message(
            &mut siv,
            &MessageEnvelope::text(MessageKind::Success, "saved"),
        );
        assert_eq!(siv.screen().len(), before + 1);
    }

    #[test]
    fn footer_flag_controls_modal_buttons() {
        let mut siv = Cursive::new();
        let mut request = ModalRequest::load_data();
        request.show_footer = true;
        show_modal(&mut siv, &request, TextView::new("body"));
        // One layer either way; the footer only adds a button.
        assert!(siv.screen().len() >= 1);
    }

    #[test]
    fn router_attach_and_detach() {
        let bridge = EventBridge::new();
        let siv = Cursive::new();
        let mut router = NotificationRouter::attach(&bridge, siv.cb_sink().clone());

        assert_eq!(bridge.handler_count(CHANNEL_MESSAGE_DIALOGS), 1);
        assert_eq!(bridge.handler_count(CHANNEL_GLOBAL_MSG), 1);
        assert_eq!(bridge.handler_count(CHANNEL_LOAD_DATA), 1);

        // A malformed payload never propagates an error to the caller.
        bridge.dispatch(CHANNEL_MESSAGE_DIALOGS, &json!({"nonsense": true}));

        router.detach();
        router.detach();
        assert_eq!(bridge.handler_count(CHANNEL_MESSAGE_DIALOGS), 0);
        assert_eq!(bridge.handler_count(CHANNEL_GLOBAL_MSG), 0);
        assert_eq!(bridge.handler_count(CHANNEL_LOAD_DATA), 0);
    }
}
