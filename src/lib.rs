pub mod binding;
pub mod config;
pub mod error;
pub mod item;
pub mod menu;
pub mod options;

pub use binding::{Binding, ScalarKind, SelectTarget};
pub use config::MenuConfig;
pub use error::MenuError;
pub use item::{ItemKind, ItemType, MenuItem};
pub use menu::{Activation, ItemId, Menu, MenuPage, PageId};
pub use options::{OptionSet, OptionValue, SelectOption};
