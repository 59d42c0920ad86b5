//! Data models for impex.
//!
//! This module contains the core data structures shared by the stores,
//! the backends and the transfer pipeline.

mod attribute;
mod cell;
mod template;

pub use attribute::{AttributeDescriptor, InputDescriptor, InputType, SelectOption};
pub use cell::{Cell, Row, text_row};
pub use template::{
    DISPLAY_NUMBER_WIDTH, NewTemplate, Template, TemplateId, TemplateKind, TemplateUpdate, UserId,
    ValidityState, sanitize_field,
};
