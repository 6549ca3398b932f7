//! Field-kind dispatcher.
//!
//! Maps each [`FieldKind`] to exactly one editable Cursive
//! representation and wires its change events back into the tree held in
//! the Cursive user data. Edits are optimistic and unbuffered: a change
//! callback writes straight into the tree, which *is* the form state.

use std::fs;

use cursive::{
    view::{Nameable, Resizable, View},
    views::{
        BoxedView, Button, Checkbox, DummyView, EditView, EnableableView, LinearLayout, Panel,
        RadioGroup, SelectView, TextView,
    },
};

use crate::{
    data::node::{ConfigNode, FieldKind, join_values},
    error::ConfigError,
    notify::{self, MessageEnvelope, MessageKind},
    ui::form::commit_edit,
};

/// Upload ceiling for locally loaded images.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Build the view for one node and its subtree.
///
/// Pure groups render a titled panel of their children and no own
/// control; hybrids render their own control with the children grouped
/// beneath it under the parent name. Invisible nodes render nothing.
pub fn node_view(node: &ConfigNode) -> Box<dyn View> {
    if !node.visible {
        return Box::new(DummyView);
    }
    if node.is_group() {
        return Box::new(Panel::new(children_view(node)).title(node.name.as_str()));
    }
    let row = control_row(node);
    if node.children.is_empty() {
        row
    } else {
        Box::new(
            LinearLayout::vertical()
                .child(row)
                .child(Panel::new(children_view(node)).title(node.name.as_str())),
        )
    }
}

fn children_view(node: &ConfigNode) -> LinearLayout {
    let mut layout = LinearLayout::vertical();
    for child in &node.children {
        if child.visible {
            layout.add_child(node_view(child));
        }
    }
    layout
}

fn control_row(node: &ConfigNode) -> Box<dyn View> {
    let control = match node.kind {
        FieldKind::ColorPicker => color_picker(node),
        FieldKind::Switch => switch(node),
        FieldKind::CheckboxGroup => checkbox_group(node),
        FieldKind::RadioGroup => radio_group(node),
        FieldKind::TextInput => text_input(node),
        FieldKind::SelectTags => select_tags(node),
        FieldKind::Image => image(node),
        FieldKind::None => Box::new(DummyView) as Box<dyn View>,
    };
    // Read-only nodes render the control inert: no mutation entry point
    // can fire through a disabled wrapper.
    let control: Box<dyn View> = if node.editable {
        control
    } else {
        let mut wrapped = EnableableView::new(BoxedView::new(control));
        wrapped.disable();
        Box::new(wrapped)
    };
    Box::new(
        LinearLayout::horizontal()
            .child(TextView::new(format!("{}: ", node.name)))
            .child(control),
    )
}

fn color_picker(node: &ConfigNode) -> Box<dyn View> {
    let key = node.key.clone();
    Box::new(
        EditView::new()
            .content(node.value.clone())
            .on_submit(move |siv, text| {
                if is_hex_color(text) {
                    commit_edit(siv, &key, text.to_string());
                } else {
                    notify::show_message(
                        siv,
                        &MessageEnvelope::text(
                            MessageKind::Error,
                            format!("`{text}` is not a #rrggbb color"),
                        ),
                    );
                }
            })
            .fixed_width(12),
    )
}

fn switch(node: &ConfigNode) -> Box<dyn View> {
    let key = node.key.clone();
    let mut toggle = Checkbox::new();
    toggle.set_checked(node.value == "1");
    Box::new(toggle.on_change(move |siv, checked| {
        commit_edit(siv, &key, if checked { "1" } else { "0" }.to_string());
    }))
}

fn option_name(node_key: &str, opt_key: &str) -> String {
    format!("opt:{node_key}:{opt_key}")
}

fn checkbox_group(node: &ConfigNode) -> Box<dyn View> {
    let selected = node.split_value();
    let opt_keys: Vec<String> = node.options.iter().map(|o| o.key.clone()).collect();
    let mut row = LinearLayout::horizontal();
    for opt in &node.options {
        let name = option_name(&node.key, &opt.key);
        let mut checkbox = Checkbox::new();
        checkbox.set_checked(selected.contains(&opt.key.as_str()));

        let key = node.key.clone();
        let opt_keys = opt_keys.clone();
        let checkbox = checkbox.on_change(move |siv, _checked| {
            // Recompute the joined value from every sibling checkbox.
            let picked: Vec<String> = opt_keys
                .iter()
                .filter(|k| {
                    siv.call_on_name(&option_name(&key, k), |c: &mut Checkbox| c.is_checked())
                        .unwrap_or(false)
                })
                .cloned()
                .collect();
            commit_edit(siv, &key, join_values(&picked));
        });
        row.add_child(checkbox.with_name(name));
        row.add_child(TextView::new(format!("{} ", opt.name)));
    }
    Box::new(row)
}

fn radio_group(node: &ConfigNode) -> Box<dyn View> {
    let key = node.key.clone();
    let mut group: RadioGroup<String> = RadioGroup::new().on_change(move |siv, value: &String| {
        commit_edit(siv, &key, value.clone());
    });
    let mut row = LinearLayout::horizontal();
    for opt in &node.options {
        let mut button = group.button(opt.key.clone(), opt.name.clone());
        if opt.key == node.value {
            button = button.selected();
        }
        row.add_child(button);
        row.add_child(DummyView);
    }
    Box::new(row)
}

fn text_input(node: &ConfigNode) -> Box<dyn View> {
    let key = node.key.clone();
    Box::new(
        EditView::new()
            .content(node.value.clone())
            .on_edit(move |siv, text, _cursor| {
                commit_edit(siv, &key, text.to_string());
            })
            .min_width(30),
    )
}

fn select_tags(node: &ConfigNode) -> Box<dyn View> {
    let edit_name = format!("tags:{}", node.key);
    let edit = {
        let key = node.key.clone();
        EditView::new()
            .content(node.value.clone())
            .on_edit(move |siv, text, _cursor| {
                commit_edit(siv, &key, text.to_string());
            })
            .with_name(edit_name.clone())
            .min_width(30)
    };

    let mut picker = SelectView::<String>::new().popup();
    picker.add_item("toggle…", String::new());
    for opt in &node.options {
        picker.add_item(opt.name.clone(), opt.key.clone());
    }
    let key = node.key.clone();
    let picker = picker.on_submit(move |siv, token: &String| {
        if token.is_empty() {
            return;
        }
        let current = siv
            .call_on_name(&edit_name, |e: &mut EditView| e.get_content().to_string())
            .unwrap_or_default();
        let mut tokens: Vec<String> = if current.is_empty() {
            Vec::new()
        } else {
            current.split(',').map(str::to_string).collect()
        };
        match tokens.iter().position(|t| t == token) {
            Some(pos) => {
                tokens.remove(pos);
            }
            None => tokens.push(token.clone()),
        }
        let joined = join_values(&tokens);
        siv.call_on_name(&edit_name, |e: &mut EditView| {
            let _ = e.set_content(joined.clone());
        });
        commit_edit(siv, &key, joined);
    });

    Box::new(LinearLayout::horizontal().child(edit).child(picker))
}

fn image(node: &ConfigNode) -> Box<dyn View> {
    let key = node.key.clone();
    let edit_name = format!("img:{}", node.key);
    let edit = EditView::new()
        .content(node.value.clone())
        .with_name(edit_name.clone())
        .min_width(30);
    let apply = Button::new("Apply", move |siv| {
        let input = siv
            .call_on_name(&edit_name, |e: &mut EditView| e.get_content().to_string())
            .unwrap_or_default();
        match accept_image_source(&input) {
            Ok(value) => commit_edit(siv, &key, value),
            // Rejected payloads commit nothing; the node value stays put.
            Err(e) => notify::show_message(
                siv,
                &MessageEnvelope::text(MessageKind::Error, e.to_string()),
            ),
        }
    });
    Box::new(
        LinearLayout::horizontal()
            .child(edit)
            .child(DummyView)
            .child(apply),
    )
}

/// Validate a `#rrggbb` hex color string.
pub fn is_hex_color(s: &str) -> bool {
    let Some(hex) = s.strip_prefix('#') else {
        return false;
    };
    hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Vet an image source before it may be committed.
///
/// Anything with a scheme passes through as a URL. A bare path is read
/// from disk and must stay under [`MAX_IMAGE_BYTES`]; oversized files
/// are rejected before any value change.
///
/// # Errors
///
/// Returns [`ConfigError::PayloadTooLarge`] for oversized files and
/// [`ConfigError::ImageRead`] when the file cannot be inspected.
pub fn accept_image_source(input: &str) -> Result<String, ConfigError> {
    if input.contains("://") {
        return Ok(input.to_string());
    }
    let meta = fs::metadata(input).map_err(|e| ConfigError::ImageRead {
        path: input.to_string(),
        source: e,
    })?;
    let size = meta.len();
    if size > MAX_IMAGE_BYTES {
        return Err(ConfigError::PayloadTooLarge {
            size,
            limit: MAX_IMAGE_BYTES,
        });
    }
    Ok(format!("file://{input}"))
}
