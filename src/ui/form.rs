//! Form container and save flow.
//!
//! The tree lives in the Cursive user data for the lifetime of the form
//! (teacher pattern: editors reach it through `siv.user_data`). Edits
//! mutate it in place; the save affordance follows the dirty flag.

use std::sync::Arc;

use cursive::{
    Cursive,
    view::{Nameable, Resizable, Scrollable, View},
    views::{
        Button, Checkbox, EditView, EnableableView, LinearLayout, RadioGroup, TextView,
    },
};
use log::{debug, warn};

use crate::{
    data::{node::ConfigNode, tree::ConfigTree},
    error::ConfigError,
    notify::{self, MessageEnvelope, MessageKind},
    store::SettingsStore,
    ui::editors,
};

/// Name of the status line reflecting the dirty flag.
pub const STATUS_VIEW: &str = "form:status";
/// Name of the save button; enabled only while the tree is dirty.
pub const SAVE_BUTTON: &str = "form:save";
const STATUS_DIRTY: &str = "unsaved changes - press 's' to save";
const STATUS_CLEAN: &str = " ";

/// Form state stored in the Cursive user data.
///
/// The tree is the single form state; there is no staging buffer.
pub struct FormData {
    /// The in-memory configuration tree.
    pub tree: ConfigTree,
    /// Persistence collaborator receiving the tree on save.
    pub store: Arc<dyn SettingsStore>,
    /// Single-outstanding-save guard; a second save request while one is
    /// in flight is rejected rather than queued.
    pub save_in_flight: bool,
}

/// Install the settings form: user data, key bindings, fullscreen layer.
pub fn open_form(siv: &mut Cursive, tree: ConfigTree, store: Arc<dyn SettingsStore>) {
    let view = form_view(&tree);
    siv.set_user_data(FormData {
        tree,
        store,
        save_in_flight: false,
    });
    siv.add_global_callback('s', handle_save);
    siv.add_global_callback('q', |s| s.quit());
    siv.add_fullscreen_layer(view);
}

/// Build the form view for a tree: one subtree per visible root, a
/// status line, and the save button. The save affordance follows the
/// dirty flag: the button starts disabled on a clean tree.
pub fn form_view(tree: &ConfigTree) -> impl View {
    let mut body = LinearLayout::vertical();
    for root in tree.roots() {
        if root.visible {
            body.add_child(editors::node_view(root));
        }
    }
    let mut save = EnableableView::new(Button::new("Save", handle_save));
    save.set_enabled(tree.is_dirty());
    LinearLayout::vertical()
        .child(
            TextView::new(if tree.is_dirty() {
                STATUS_DIRTY
            } else {
                STATUS_CLEAN
            })
            .with_name(STATUS_VIEW),
        )
        .child(body.scrollable())
        .child(save.with_name(SAVE_BUTTON))
}

/// Apply one edit coming from a field editor.
///
/// Writes through [`ConfigTree::set`] (all key matches), marks the tree
/// dirty, and surfaces the save affordance.
pub(crate) fn commit_edit(siv: &mut Cursive, key: &str, value: String) {
    let updated = match siv.user_data::<FormData>() {
        Some(data) => data.tree.set(key, &value),
        None => false,
    };
    if updated {
        debug!("updated `{key}`");
        siv.call_on_name(STATUS_VIEW, |status: &mut TextView| {
            status.set_content(STATUS_DIRTY);
        });
        siv.call_on_name(SAVE_BUTTON, |save: &mut EnableableView<Button>| {
            save.enable();
        });
    } else {
        warn!("edit for unknown key `{key}` ignored");
    }
}

enum SaveGate {
    Clean,
    Busy,
    Go(Vec<ConfigNode>, Arc<dyn SettingsStore>),
}

/// Serialize the tree and hand it to the persistence collaborator.
///
/// On success the dirty flag is cleared; on rejection it stays set so
/// the user can retry, and the failure is surfaced as an error message.
pub fn handle_save(siv: &mut Cursive) {
    let gate = match siv.user_data::<FormData>() {
        None => return,
        Some(data) if data.save_in_flight => SaveGate::Busy,
        Some(data) if !data.tree.is_dirty() => SaveGate::Clean,
        Some(data) => {
            data.save_in_flight = true;
            SaveGate::Go(data.tree.roots().to_vec(), data.store.clone())
        }
    };

    match gate {
        SaveGate::Clean => notify::show_message(
            siv,
            &MessageEnvelope::text(MessageKind::Info, "No changes to save"),
        ),
        SaveGate::Busy => notify::show_message(
            siv,
            &MessageEnvelope::text(MessageKind::Warning, "A save is already in progress"),
        ),
        SaveGate::Go(roots, store) => {
            let outcome = match store.save(&roots) {
                Ok(reply) if reply.is_success() => Ok(()),
                Ok(reply) => Err(ConfigError::PersistenceFailure {
                    code: reply.code,
                    msg: reply.msg,
                }),
                Err(e) => Err(ConfigError::PersistenceFailure {
                    code: -1,
                    msg: e.to_string(),
                }),
            };

            if let Some(data) = siv.user_data::<FormData>() {
                data.save_in_flight = false;
                if outcome.is_ok() {
                    data.tree.mark_saved();
                }
            }

            match outcome {
                Ok(()) => {
                    siv.call_on_name(STATUS_VIEW, |status: &mut TextView| {
                        status.set_content(STATUS_CLEAN);
                    });
                    siv.call_on_name(SAVE_BUTTON, |save: &mut EnableableView<Button>| {
                        save.disable();
                    });
                    notify::show_message(
                        siv,
                        &MessageEnvelope::text(MessageKind::Success, "Settings saved"),
                    );
                }
                Err(e) => notify::show_message(
                    siv,
                    &MessageEnvelope::text(MessageKind::Error, e.to_string()),
                ),
            }
        }
    }
}

/// Body of the data-loader modal opened by the `loadData` channel.
pub fn load_data_view() -> impl View {
    let mut mode: RadioGroup<String> = RadioGroup::new();

    let mut locked = EnableableView::new({
        let mut config = Checkbox::new();
        config.set_checked(true);
        config
    });
    locked.disable();

    let submit = Button::new("Submit", |siv| {
        siv.pop_layer();
        notify::show_message(
            siv,
            &MessageEnvelope::text(MessageKind::Info, "Data load started"),
        );
    });

    LinearLayout::vertical()
        .child(TextView::new("Load mode"))
        .child(
            LinearLayout::horizontal()
                .child(mode.button("default".to_string(), "Initialize defaults"))
                .child(mode.button("customize".to_string(), "Import history")),
        )
        .child(TextView::new("Data directory"))
        .child(
            EditView::new()
                .content("/dataPanel")
                .with_name("load:path")
                .min_width(30),
        )
        .child(TextView::new("Initial data sets"))
        .child(
            LinearLayout::horizontal()
                .child(locked)
                .child(TextView::new("Config "))
                .child(Checkbox::new().with_name("load:a"))
                .child(TextView::new("A-shares "))
                .child(Checkbox::new().with_name("load:h"))
                .child(TextView::new("HK "))
                .child(Checkbox::new().with_name("load:m"))
                .child(TextView::new("US ")),
        )
        .child(submit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::node::{FieldKind, FieldOption},
        store::SaveReply,
    };
    use std::sync::Mutex;

    struct StubStore {
        reply_code: i32,
        saved: Mutex<Vec<Vec<ConfigNode>>>,
    }

    impl StubStore {
        fn new(reply_code: i32) -> Arc<Self> {
            Arc::new(Self {
                reply_code,
                saved: Mutex::new(Vec::new()),
            })
        }
    }

    impl SettingsStore for StubStore {
        fn load(&self) -> anyhow::Result<Vec<ConfigNode>> {
            Ok(Vec::new())
        }

        fn save(&self, roots: &[ConfigNode]) -> anyhow::Result<SaveReply> {
            self.saved.lock().unwrap().push(roots.to_vec());
            Ok(SaveReply {
                code: self.reply_code,
                msg: if self.reply_code == 200 {
                    "ok".to_string()
                } else {
                    "backend rejected".to_string()
                },
            })
        }
    }

    fn sample_tree() -> ConfigTree {
        ConfigTree::new(vec![
            ConfigNode::leaf("a", "Toggle", FieldKind::Switch, "0"),
            ConfigNode::leaf("markets", "Markets", FieldKind::CheckboxGroup, "").with_options(
                vec![FieldOption::new("a", "A股"), FieldOption::new("h", "港股")],
            ),
        ])
    }

    fn form_session(store: Arc<StubStore>) -> Cursive {
        let mut siv = Cursive::new();
        open_form(&mut siv, sample_tree(), store);
        siv
    }

    #[test]
    fn commit_edit_marks_dirty_and_updates_value() {
        let mut siv = form_session(StubStore::new(200));
        commit_edit(&mut siv, "a", "1".to_string());

        let data = siv.user_data::<FormData>().unwrap();
        assert_eq!(data.tree.get("a").unwrap(), "1");
        assert!(data.tree.is_dirty());
    }

    #[test]
    fn commit_edit_for_unknown_key_changes_nothing() {
        let mut siv = form_session(StubStore::new(200));
        commit_edit(&mut siv, "missing", "x".to_string());
        assert!(!siv.user_data::<FormData>().unwrap().tree.is_dirty());
    }

    #[test]
    fn checkbox_selection_joins_option_keys() {
        let mut siv = form_session(StubStore::new(200));
        commit_edit(&mut siv, "markets", "a,h".to_string());
        assert_eq!(
            siv.user_data::<FormData>().unwrap().tree.get("markets").unwrap(),
            "a,h"
        );
    }

    #[test]
    fn successful_save_clears_dirty() {
        let store = StubStore::new(200);
        let mut siv = form_session(store.clone());
        commit_edit(&mut siv, "a", "1".to_string());

        handle_save(&mut siv);

        let data = siv.user_data::<FormData>().unwrap();
        assert!(!data.tree.is_dirty());
        assert!(!data.save_in_flight);
        assert_eq!(store.saved.lock().unwrap().len(), 1);
    }

    #[test]
    fn rejected_save_keeps_dirty_for_retry() {
        let store = StubStore::new(500);
        let mut siv = form_session(store.clone());
        commit_edit(&mut siv, "a", "1".to_string());

        handle_save(&mut siv);

        let data = siv.user_data::<FormData>().unwrap();
        assert!(data.tree.is_dirty());
        assert!(!data.save_in_flight);
    }

    fn save_button_enabled(siv: &mut Cursive) -> bool {
        siv.call_on_name(SAVE_BUTTON, |save: &mut EnableableView<Button>| {
            save.is_enabled()
        })
        .unwrap()
    }

    #[test]
    fn save_affordance_follows_dirty_flag() {
        let mut siv = form_session(StubStore::new(200));
        assert!(!save_button_enabled(&mut siv));

        commit_edit(&mut siv, "a", "1".to_string());
        assert!(save_button_enabled(&mut siv));

        handle_save(&mut siv);
        assert!(!save_button_enabled(&mut siv));
    }

    #[test]
    fn clean_tree_save_is_a_no_op() {
        let store = StubStore::new(200);
        let mut siv = form_session(store.clone());

        handle_save(&mut siv);
        assert!(store.saved.lock().unwrap().is_empty());
    }
}
