//! UI components for the settings form.
//!
//! - [`editors`] - Field-kind dispatcher mapping each node kind to one
//!   editable Cursive representation
//! - [`form`] - Form container, user-data wiring, and the save flow

/// Per-kind editor views.
pub mod editors;

/// Form container and save flow.
pub mod form;

pub use form::{FormData, form_view, load_data_view, open_form};
