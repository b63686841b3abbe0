use std::fmt;

use crate::binding::{Binding, ScalarKind, SelectTarget};
use crate::config::MenuConfig;
use crate::menu::{ItemId, PageId};
use crate::options::OptionSet;

/// Callback fired on save or button press.
pub type Action<'a> = Box<dyn FnMut() + 'a>;

/// Produces the text shown by a computed item.
pub type ComputedText<'a> = Box<dyn Fn() -> String + 'a>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    Value,
    Link,
    Back,
    Button,
    LinkedValue,
    Text,
}

/// Per-type payload of a menu item.
pub enum ItemKind<'a> {
    /// Editable variable; an option set turns it into a select.
    Value {
        binding: Binding<'a>,
        options: Option<&'a OptionSet>,
        on_save: Option<Action<'a>>,
    },
    /// Read-only value produced on demand.
    Computed(ComputedText<'a>),
    /// Variable shown in place, edited on the linked page.
    LinkedValue {
        binding: Binding<'a>,
        page: Option<PageId>,
    },
    Link(Option<PageId>),
    Back(PageId),
    Button(Action<'a>),
    Text,
}

impl ItemKind<'_> {
    pub fn item_type(&self) -> ItemType {
        match self {
            ItemKind::Value { .. } | ItemKind::Computed(_) => ItemType::Value,
            ItemKind::LinkedValue { .. } => ItemType::LinkedValue,
            ItemKind::Link(_) => ItemType::Link,
            ItemKind::Back(_) => ItemType::Back,
            ItemKind::Button(_) => ItemType::Button,
            ItemKind::Text => ItemType::Text,
        }
    }
}

/// A single menu entry.
///
/// Items are built detached and then handed to a [`crate::menu::Menu`], which
/// owns them and links them into a page. While detached, `hide`/`show` act on
/// the item directly; once attached, visibility goes through the menu so the
/// page can keep its counters in step.
pub struct MenuItem<'a> {
    title: Option<String>,
    kind: ItemKind<'a>,
    precision: Option<u8>,
    readonly: bool,
    hidden: bool,
    pub(crate) parent: Option<PageId>,
    pub(crate) next: Option<ItemId>,
}

impl<'a> MenuItem<'a> {
    fn with_kind(title: Option<String>, kind: ItemKind<'a>, readonly: bool) -> Self {
        Self {
            title,
            kind,
            precision: None,
            readonly,
            hidden: false,
            parent: None,
            next: None,
        }
    }

    fn value_item(
        title: Option<String>,
        binding: Binding<'a>,
        options: Option<&'a OptionSet>,
        on_save: Option<Action<'a>>,
        readonly: bool,
    ) -> Self {
        let kind = ItemKind::Value {
            binding,
            options,
            on_save,
        };
        Self::with_kind(title, kind, readonly)
    }

    /// Option select without a save callback.
    pub fn select(
        title: impl Into<String>,
        target: impl Into<SelectTarget<'a>>,
        options: &'a OptionSet,
        readonly: bool,
    ) -> Self {
        let binding = target.into().binding();
        Self::value_item(Some(title.into()), binding, Some(options), None, readonly)
    }

    /// Option select that fires `on_save` after each committed choice.
    pub fn select_with_save(
        title: impl Into<String>,
        target: impl Into<SelectTarget<'a>>,
        options: &'a OptionSet,
        on_save: impl FnMut() + 'a,
    ) -> Self {
        let binding = target.into().binding();
        let on_save: Action<'a> = Box::new(on_save);
        Self::value_item(Some(title.into()), binding, Some(options), Some(on_save), false)
    }

    pub fn value(title: impl Into<String>, binding: impl Into<Binding<'a>>, readonly: bool) -> Self {
        Self::value_item(Some(title.into()), binding.into(), None, None, readonly)
    }

    pub fn value_with_save(
        title: impl Into<String>,
        binding: impl Into<Binding<'a>>,
        on_save: impl FnMut() + 'a,
    ) -> Self {
        let on_save: Action<'a> = Box::new(on_save);
        Self::value_item(Some(title.into()), binding.into(), None, Some(on_save), false)
    }

    /// Value without a title, drawn across the full row.
    pub fn untitled_value(binding: impl Into<Binding<'a>>, readonly: bool) -> Self {
        Self::value_item(None, binding.into(), None, None, readonly)
    }

    /// Value that opens `page` for detailed editing. Never readonly on
    /// construction. Accepts a `PageId` or an `Option<PageId>`.
    pub fn linked_value(
        title: impl Into<String>,
        binding: impl Into<Binding<'a>>,
        page: impl Into<Option<PageId>>,
    ) -> Self {
        let kind = ItemKind::LinkedValue {
            binding: binding.into(),
            page: page.into(),
        };
        Self::with_kind(Some(title.into()), kind, false)
    }

    pub fn link(title: impl Into<String>, page: impl Into<Option<PageId>>, readonly: bool) -> Self {
        Self::with_kind(Some(title.into()), ItemKind::Link(page.into()), readonly)
    }

    /// Entry leading back to `parent`. Pages create these themselves.
    pub(crate) fn back(parent: PageId) -> Self {
        Self::with_kind(None, ItemKind::Back(parent), false)
    }

    pub fn button(title: impl Into<String>, action: impl FnMut() + 'a, readonly: bool) -> Self {
        Self::with_kind(Some(title.into()), ItemKind::Button(Box::new(action)), readonly)
    }

    pub fn computed(title: impl Into<String>, text: impl Fn() -> String + 'a) -> Self {
        Self::with_kind(Some(title.into()), ItemKind::Computed(Box::new(text)), true)
    }

    pub fn untitled_computed(text: impl Fn() -> String + 'a) -> Self {
        Self::with_kind(None, ItemKind::Computed(Box::new(text)), true)
    }

    pub fn text(title: impl Into<String>) -> Self {
        Self::with_kind(Some(title.into()), ItemKind::Text, true)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn clear_title(&mut self) {
        self.title = None;
    }

    pub fn item_type(&self) -> ItemType {
        self.kind.item_type()
    }

    pub fn kind(&self) -> &ItemKind<'a> {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut ItemKind<'a> {
        &mut self.kind
    }

    pub fn binding(&self) -> Option<Binding<'a>> {
        match &self.kind {
            ItemKind::Value { binding, .. } | ItemKind::LinkedValue { binding, .. } => {
                Some(*binding)
            }
            _ => None,
        }
    }

    /// Kind of the bound variable. A select keeps its variable's kind; check
    /// [`MenuItem::is_select`] to pick select-style editing.
    pub fn value_kind(&self) -> ScalarKind {
        match &self.kind {
            ItemKind::Computed(_) => ScalarKind::Callback,
            _ => self.binding().map_or(ScalarKind::None, |b| b.kind()),
        }
    }

    pub fn options(&self) -> Option<&'a OptionSet> {
        match &self.kind {
            ItemKind::Value { options, .. } => *options,
            _ => None,
        }
    }

    pub fn is_select(&self) -> bool {
        self.options().is_some()
    }

    pub fn linked_page(&self) -> Option<PageId> {
        match &self.kind {
            ItemKind::Link(page) | ItemKind::LinkedValue { page, .. } => *page,
            ItemKind::Back(page) => Some(*page),
            _ => None,
        }
    }

    /// Explicitly set precision, if any.
    pub fn precision(&self) -> Option<u8> {
        self.precision
    }

    /// Digits after the decimal point. Stored for any item, only used by
    /// float and double variables.
    pub fn set_precision(&mut self, precision: u8) {
        self.precision = Some(precision);
    }

    /// Precision in effect for a float or double variable; `None` for every
    /// other kind.
    pub fn resolved_precision(&self, config: &MenuConfig) -> Option<u8> {
        match self.value_kind() {
            ScalarKind::Float => Some(self.precision.unwrap_or(config.float_precision)),
            ScalarKind::Double => Some(self.precision.unwrap_or(config.double_precision)),
            _ => None,
        }
    }

    pub fn is_readonly(&self) -> bool {
        self.readonly
    }

    /// Readonly is advisory: the menu's commit and activate entry points
    /// consult it, the item does not.
    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn is_attached(&self) -> bool {
        self.parent.is_some()
    }

    pub fn parent_page(&self) -> Option<PageId> {
        self.parent
    }

    /// Hides a detached item. Attached items are hidden through
    /// [`crate::menu::Menu::hide`].
    pub fn hide(&mut self) {
        self.set_hidden(true);
    }

    pub fn show(&mut self) {
        self.set_hidden(false);
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.set_hidden_flag(hidden);
    }

    pub(crate) fn set_hidden_flag(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    /// Text a renderer shows in the value column, if the item has one.
    pub fn display_value(&self, config: &MenuConfig) -> Option<String> {
        match &self.kind {
            ItemKind::Computed(text) => Some(text()),
            ItemKind::Value {
                binding,
                options: Some(options),
                ..
            } => {
                let shown = options
                    .position_of(binding)
                    .and_then(|i| options.get(i))
                    .map(|o| o.name.clone());
                Some(shown.unwrap_or_else(|| binding.display(self.precision_or_zero(config))))
            }
            ItemKind::Value { binding, .. } | ItemKind::LinkedValue { binding, .. } => {
                Some(binding.display(self.precision_or_zero(config)))
            }
            _ => None,
        }
    }

    fn precision_or_zero(&self, config: &MenuConfig) -> u8 {
        self.resolved_precision(config).unwrap_or(0)
    }
}

impl fmt::Debug for MenuItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem")
            .field("title", &self.title)
            .field("type", &self.item_type())
            .field("value_kind", &self.value_kind())
            .field("select", &self.is_select())
            .field("precision", &self.precision)
            .field("readonly", &self.readonly)
            .field("hidden", &self.hidden)
            .field("parent", &self.parent)
            .field("next", &self.next)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::config::{DEFAULT_DOUBLE_PRECISION, DEFAULT_FLOAT_PRECISION};
    use crate::options::{OptionValue, SelectOption};

    #[test]
    fn readonly_flag_is_taken_as_given() {
        let level = Cell::new(3u8);

        assert!(!MenuItem::value("Level", &level, false).is_readonly());
        assert!(MenuItem::value("Level", &level, true).is_readonly());
        assert!(MenuItem::untitled_value(&level, true).is_readonly());
        assert!(!MenuItem::value_with_save("Level", &level, || {}).is_readonly());
    }

    #[test]
    fn text_and_computed_are_always_readonly() {
        let text = MenuItem::text("Hello");
        let computed = MenuItem::computed("Uptime", || "12s".to_string());
        let untitled = MenuItem::untitled_computed(String::new);

        for item in [&text, &computed, &untitled] {
            assert!(item.is_readonly());
        }
        assert_eq!(text.item_type(), ItemType::Text);
        assert_eq!(computed.item_type(), ItemType::Value);
        assert_eq!(computed.value_kind(), ScalarKind::Callback);
        assert!(computed.binding().is_none());
        assert_eq!(untitled.title(), None);
    }

    #[test]
    fn linked_value_is_never_readonly() {
        let count = Cell::new(1i16);
        let page = PageId::from_index(4);

        let linked = MenuItem::linked_value("Count", &count, page);
        let plain = MenuItem::value("Count", &count, false);

        assert!(!linked.is_readonly());
        assert!(!plain.is_readonly());
        assert_eq!(linked.item_type(), ItemType::LinkedValue);
        assert_eq!(linked.linked_page(), Some(page));
        assert_eq!(linked.value_kind(), ScalarKind::Integer);

        let detached = MenuItem::linked_value("Count", &count, None::<PageId>);
        assert_eq!(detached.linked_page(), None);
    }

    #[test]
    fn select_keeps_variable_kind() {
        let options: OptionSet = [SelectOption::new("A", OptionValue::Text("a".into()))]
            .into_iter()
            .collect();
        let mode = RefCell::new("a".to_string());

        let item = MenuItem::select("Mode", &mode, &options, false);

        assert_eq!(item.value_kind(), ScalarKind::Text);
        assert!(item.is_select());
        assert_eq!(item.display_value(&MenuConfig::default()).as_deref(), Some("A"));
        assert!(!MenuItem::value("Mode", &mode, false).is_select());
    }

    #[test]
    fn float_precision_defaults_and_overrides() {
        let config = MenuConfig::default();
        let ratio = Cell::new(0.5f32);
        let exact = Cell::new(0.25f64);

        let mut item = MenuItem::value("Ratio", &ratio, false);
        assert_eq!(item.resolved_precision(&config), Some(DEFAULT_FLOAT_PRECISION));

        item.set_precision(1);
        assert_eq!(item.precision(), Some(1));
        assert_eq!(item.resolved_precision(&config), Some(1));
        assert_eq!(item.display_value(&config).as_deref(), Some("0.5"));

        let double = MenuItem::value("Exact", &exact, false);
        assert_eq!(double.resolved_precision(&config), Some(DEFAULT_DOUBLE_PRECISION));
    }

    #[test]
    fn precision_is_ignored_for_other_kinds() {
        let level = Cell::new(3u8);
        let mut item = MenuItem::value("Level", &level, false);

        item.set_precision(4);
        assert_eq!(item.precision(), Some(4));
        assert_eq!(item.resolved_precision(&MenuConfig::default()), None);
        assert_eq!(item.display_value(&MenuConfig::default()).as_deref(), Some("3"));
    }

    #[test]
    fn title_can_be_replaced_and_cleared() {
        let level = Cell::new(0u8);
        let mut item = MenuItem::untitled_value(&level, false);
        assert_eq!(item.title(), None);

        item.set_title("Level");
        assert_eq!(item.title(), Some("Level"));

        item.clear_title();
        assert_eq!(item.title(), None);
    }

    #[test]
    fn detached_hide_and_show_flip_local_flag() {
        let mut item = MenuItem::text("Note");

        item.show();
        assert!(!item.is_hidden());

        item.hide();
        item.hide();
        assert!(item.is_hidden());
        assert!(!item.is_attached());

        item.show();
        assert!(!item.is_hidden());
    }

    #[test]
    fn link_and_button_types() {
        let page = PageId::from_index(1);
        let link = MenuItem::link("Settings", page, true);
        let button = MenuItem::button("Reset", || {}, false);

        assert_eq!(link.item_type(), ItemType::Link);
        assert!(link.is_readonly());
        assert!(link.binding().is_none());
        assert_eq!(button.item_type(), ItemType::Button);
        assert_eq!(button.value_kind(), ScalarKind::None);
        assert_eq!(button.display_value(&MenuConfig::default()), None);
    }
}
