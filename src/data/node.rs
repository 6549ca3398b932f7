use serde::{Deserialize, Serialize};

/// Delimiter used by multi-valued kinds when encoding into `value`.
pub const VALUE_DELIMITER: char = ',';

/// One entry in the configuration tree.
///
/// A node is a *leaf* (a kind other than [`FieldKind::None`], no children),
/// a *group* (kind `None`, children only), or a *hybrid* (both an editable
/// value and nested settings). Children are exclusively owned by their one
/// parent; there is no parent back-reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigNode {
    /// Stable identity, unique among siblings. Not guaranteed unique
    /// across the whole tree.
    pub key: String,
    /// Display label.
    pub name: String,
    /// Current value, always text. Multi-valued kinds join with `,`.
    #[serde(default)]
    pub value: String,
    /// Editing strategy for this node.
    #[serde(default, rename = "showType")]
    pub kind: FieldKind,
    /// Whether editors may emit mutation callbacks for this node.
    #[serde(default = "default_true", rename = "modify")]
    pub editable: bool,
    /// Whether the form renders this node at all. Invisible nodes are
    /// still serialized.
    #[serde(default = "default_true", rename = "isShow")]
    pub visible: bool,
    /// Choices for choice-based kinds; empty for scalar kinds.
    #[serde(default, rename = "values")]
    pub options: Vec<FieldOption>,
    /// Nested settings. Insertion order is display order and is
    /// preserved through load/save round-trips.
    #[serde(default)]
    pub children: Vec<ConfigNode>,
}

fn default_true() -> bool {
    true
}

/// One selectable choice of a choice-based node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    /// Value committed when this option is selected.
    pub key: String,
    /// Display label.
    pub name: String,
}

impl FieldOption {
    /// Convenience constructor.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// Closed set of editing representations.
///
/// The wire names match the persisted configuration format; the longer
/// aliases are accepted on input for readability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Single color selection, hex string value (`#rrggbb`).
    #[serde(rename = "colorPicker")]
    ColorPicker,
    /// Boolean toggle, `"1"` / `"0"`.
    #[serde(rename = "switch")]
    Switch,
    /// Multi-select from options, comma-joined option keys.
    #[serde(rename = "checkboxs", alias = "checkboxGroup")]
    CheckboxGroup,
    /// Exclusive select from options, single option key.
    #[serde(rename = "rb", alias = "radioGroup")]
    RadioGroup,
    /// Free text.
    #[serde(rename = "input", alias = "textInput")]
    TextInput,
    /// Multi-select with free-form tag entry, comma-joined tokens.
    #[serde(rename = "selects", alias = "selectTags")]
    SelectTags,
    /// URL or locally loaded image, size-capped.
    #[serde(rename = "image")]
    Image,
    /// Pure grouping container, no own control.
    #[default]
    #[serde(rename = "", alias = "none")]
    None,
}

impl ConfigNode {
    /// Create a leaf node with the given kind and initial value.
    pub fn leaf(
        key: impl Into<String>,
        name: impl Into<String>,
        kind: FieldKind,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            value: value.into(),
            kind,
            editable: true,
            visible: true,
            options: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a pure grouping node.
    pub fn group(
        key: impl Into<String>,
        name: impl Into<String>,
        children: Vec<ConfigNode>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            value: String::new(),
            kind: FieldKind::None,
            editable: false,
            visible: true,
            options: Vec::new(),
            children,
        }
    }

    /// Attach options to a choice-based node.
    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    /// Mark the node read-only.
    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Whether this node renders an own control.
    pub fn has_control(&self) -> bool {
        self.kind != FieldKind::None
    }

    /// Whether this node is a pure grouping container.
    pub fn is_group(&self) -> bool {
        self.kind == FieldKind::None && !self.children.is_empty()
    }

    /// Split the comma-joined value of a multi-valued kind into tokens.
    ///
    /// An empty value yields no tokens rather than one empty token.
    pub fn split_value(&self) -> Vec<&str> {
        if self.value.is_empty() {
            return Vec::new();
        }
        self.value.split(VALUE_DELIMITER).collect()
    }
}

/// Join tokens into the comma-delimited `value` encoding.
pub fn join_values<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_field_names_round_trip() {
        let node = ConfigNode::leaf("theme", "Theme color", FieldKind::ColorPicker, "#ff0000");
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["showType"], "colorPicker");
        assert_eq!(json["modify"], true);
        assert_eq!(json["isShow"], true);
        // Both arrays are always carried, even when empty.
        assert_eq!(json["values"], serde_json::json!([]));
        assert_eq!(json["children"], serde_json::json!([]));

        let back: ConfigNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn kind_aliases_accepted_on_input() {
        let node: ConfigNode = serde_json::from_str(
            r#"{"key":"m","name":"Markets","showType":"checkboxGroup","value":"a"}"#,
        )
        .unwrap();
        assert_eq!(node.kind, FieldKind::CheckboxGroup);
        // Canonical output uses the wire name.
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["showType"], "checkboxs");
    }

    #[test]
    fn group_serializes_empty_kind() {
        let group = ConfigNode::group("ui", "Interface", vec![]);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["showType"], "");
    }

    #[test]
    fn split_and_join_values() {
        let mut node = ConfigNode::leaf("m", "Markets", FieldKind::CheckboxGroup, "a,h");
        assert_eq!(node.split_value(), vec!["a", "h"]);
        node.value.clear();
        assert!(node.split_value().is_empty());
        assert_eq!(join_values(&["a", "h"]), "a,h");
        assert_eq!(join_values::<&str>(&[]), "");
    }

    #[test]
    fn leaf_group_hybrid_classification() {
        let leaf = ConfigNode::leaf("s", "Switch", FieldKind::Switch, "0");
        assert!(leaf.has_control() && !leaf.is_group());

        let group = ConfigNode::group("g", "Group", vec![leaf.clone()]);
        assert!(group.is_group() && !group.has_control());

        let mut hybrid = ConfigNode::leaf("h", "Hybrid", FieldKind::Switch, "1");
        hybrid.children.push(leaf);
        assert!(hybrid.has_control() && !hybrid.is_group());
        assert!(!hybrid.children.is_empty());
    }
}
