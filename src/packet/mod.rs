//! Packet geometry, element types, views and projections.
//!
//! A packet is a `(frames, height, width)` block of detector frames. This
//! module defines the value types every dataset is built from:
//!
//! - [`PacketTemplate`]: packet geometry and elementary-cell conversions
//! - [`ViewKind`] / [`SelectedViews`]: the four canonical views and a
//!   non-empty selection of them
//! - [`project`] / [`item_shape`]: the view reductions and their shapes
//! - [`Element`] / [`Dtype`]: scalar types a dataset can store

mod element;
mod projection;
mod template;
mod view;

pub use element::{Dtype, Element};
pub use projection::{item_shape, project};
pub use template::PacketTemplate;
pub use view::{SelectedViews, ViewKind};
