use thiserror::Error;

use crate::binding::ScalarKind;
use crate::menu::{ItemId, PageId};

pub type Result<T, E = MenuError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MenuError {
    #[error("cannot read '{input}' as {kind}")]
    Parse { kind: ScalarKind, input: String },

    #[error("text of {len} characters exceeds the {capacity} character buffer")]
    TextTooLong { len: usize, capacity: usize },

    #[error("option {index} is out of range ({len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("no option named '{0}'")]
    UnknownOption(String),

    #[error("{option} option cannot be stored in a {binding} variable")]
    OptionKindMismatch {
        option: ScalarKind,
        binding: ScalarKind,
    },

    #[error("item is readonly")]
    ReadOnly,

    #[error("item has no editable variable")]
    NotEditable,

    #[error("item is not an option select")]
    NotSelect,

    #[error("unknown item {0:?}")]
    UnknownItem(ItemId),

    #[error("unknown page {0:?}")]
    UnknownPage(PageId),

    #[error("item {0:?} is already attached to a page")]
    AlreadyAttached(ItemId),

    #[error("page {0:?} already has a parent page")]
    ParentAlreadySet(PageId),
}
