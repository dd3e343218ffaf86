//! Turning decoded pages into records.
//!
//! [`path`] resolves dot paths, [`fields`] reads a logical field through an
//! ordered list of fallback paths, [`coerce`] converts values leniently and
//! [`mappers`] builds one typed record per item.

pub mod coerce;
pub mod fields;
pub mod mappers;
pub mod path;

use thiserror::Error;

use crate::models::EntityKind;

pub use fields::Fallbacks;
pub use mappers::{default_key, extract_record};
pub use path::{extract_items, extract_path, lookup};

/// Errors from mapping a page's items.
///
/// Undecodable bodies never reach the mappers; they are reported by
/// [`PageResult::decode_error`](crate::http_client::PageResult::decode_error).
#[derive(Debug, Error)]
pub enum ExtractError {
    /// An item lacks a required field. The item is dropped.
    #[error("{entity} item is missing {field}")]
    SchemaMismatch { entity: EntityKind, field: String },
}

pub type ExtractResult<T> = Result<T, ExtractError>;
