//! Photo records and their filter effects.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │ NewPhoto / owner
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            PhotoStore Trait             │
//! │   (owner-scoped create/list/delete)     │
//! └────────────────────┬────────────────────┘
//!                      ▼
//!            ┌───────────────────┐
//!            │ MemoryPhotoStore  │
//!            └───────────────────┘
//! ```

mod filter;
mod model;
mod store;

pub use filter::{FilterEffect, UnknownFilterEffect};
pub use model::{NewPhoto, Photo, PhotoId};
pub use store::{MemoryPhotoStore, PhotoStore};
