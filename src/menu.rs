use crate::binding::Binding;
use crate::config::MenuConfig;
use crate::error::{MenuError, Result};
use crate::item::{ItemKind, ItemType, MenuItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(usize);

impl ItemId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl PageId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Bookkeeping for one page: the ends of its item chain plus the visible
/// count and cursor that hide/show keep consistent.
#[derive(Debug, Clone)]
pub struct MenuPage {
    title: String,
    head: Option<ItemId>,
    tail: Option<ItemId>,
    len: usize,
    visible_count: usize,
    cursor: usize,
    parent: Option<PageId>,
}

impl MenuPage {
    fn new(title: String) -> Self {
        Self {
            title,
            head: None,
            tail: None,
            len: 0,
            visible_count: 0,
            cursor: 0,
            parent: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count
    }

    /// Index of the selected item among the visible ones.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn parent(&self) -> Option<PageId> {
        self.parent
    }
}

/// What activating an item asks of the navigation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Open the value for editing.
    Edit,
    /// A boolean was flipped in place.
    Toggled(bool),
    Navigate(PageId),
    /// The button action ran.
    Pressed,
    Ignored,
}

/// Arena owning every page and item of a menu.
///
/// Items are addressed by [`ItemId`] and chained per page through their
/// `next` handle in insertion order. Chains only grow: nothing is removed or
/// reordered, and hidden items stay in place.
pub struct Menu<'a> {
    config: MenuConfig,
    pages: Vec<MenuPage>,
    items: Vec<MenuItem<'a>>,
}

impl<'a> Menu<'a> {
    pub fn new(config: MenuConfig) -> Self {
        Self {
            config,
            pages: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    pub fn add_page(&mut self, title: impl Into<String>) -> PageId {
        let id = PageId(self.pages.len());
        self.pages.push(MenuPage::new(title.into()));
        id
    }

    pub fn page(&self, id: PageId) -> Result<&MenuPage> {
        self.pages.get(id.0).ok_or(MenuError::UnknownPage(id))
    }

    fn page_mut(&mut self, id: PageId) -> Result<&mut MenuPage> {
        self.pages.get_mut(id.0).ok_or(MenuError::UnknownPage(id))
    }

    pub fn pages(&self) -> impl Iterator<Item = (PageId, &MenuPage)> {
        self.pages.iter().enumerate().map(|(i, p)| (PageId(i), p))
    }

    pub fn item(&self, id: ItemId) -> Result<&MenuItem<'a>> {
        self.items.get(id.0).ok_or(MenuError::UnknownItem(id))
    }

    fn item_ref_mut(&mut self, id: ItemId) -> Result<&mut MenuItem<'a>> {
        self.items.get_mut(id.0).ok_or(MenuError::UnknownItem(id))
    }

    pub fn item_mut(&mut self, id: ItemId) -> Result<ItemMut<'_, 'a>> {
        self.item(id)?;
        Ok(ItemMut { menu: self, id })
    }

    /// Takes ownership of a detached item without linking it into a page.
    pub fn insert(&mut self, item: MenuItem<'a>) -> ItemId {
        let id = ItemId(self.items.len());
        self.items.push(item);
        id
    }

    /// Links `item` at the end of `page`. An item joins exactly one page,
    /// once.
    pub fn append(&mut self, page: PageId, item: ItemId) -> Result<()> {
        self.page(page)?;
        let node = self.item(item)?;
        if node.is_attached() {
            return Err(MenuError::AlreadyAttached(item));
        }
        let hidden = node.is_hidden();

        let tail = self.pages[page.0].tail;
        if let Some(tail) = tail {
            self.items[tail.0].next = Some(item);
        }
        self.items[item.0].parent = Some(page);

        let p = &mut self.pages[page.0];
        if p.head.is_none() {
            p.head = Some(item);
        }
        p.tail = Some(item);
        p.len += 1;
        if !hidden {
            p.visible_count += 1;
        }
        log::debug!("appended {item:?} to {page:?} ({} visible)", p.visible_count);
        Ok(())
    }

    /// Inserts `item` and appends it to `page`.
    pub fn add_item(&mut self, page: PageId, item: MenuItem<'a>) -> Result<ItemId> {
        self.page(page)?;
        let id = self.insert(item);
        self.append(page, id)?;
        Ok(id)
    }

    /// Records `parent` as the page `page` returns to and puts a back entry
    /// at the head of `page`.
    pub fn set_parent_page(&mut self, page: PageId, parent: PageId) -> Result<ItemId> {
        self.page(parent)?;
        if self.page(page)?.parent.is_some() {
            return Err(MenuError::ParentAlreadySet(page));
        }

        let mut back = MenuItem::back(parent);
        back.parent = Some(page);
        back.next = self.pages[page.0].head;
        let id = self.insert(back);

        let p = &mut self.pages[page.0];
        p.parent = Some(parent);
        if p.visible_count > 0 {
            p.cursor += 1;
        }
        p.head = Some(id);
        if p.tail.is_none() {
            p.tail = Some(id);
        }
        p.len += 1;
        p.visible_count += 1;
        Ok(id)
    }

    pub fn hide(&mut self, id: ItemId) -> Result<()> {
        self.set_hidden(id, true)
    }

    pub fn show(&mut self, id: ItemId) -> Result<()> {
        self.set_hidden(id, false)
    }

    /// Changes visibility of an item. Attached items go through their page's
    /// bookkeeping; detached ones just flip their flag. Requesting the state
    /// the item is already in does nothing.
    pub fn set_hidden(&mut self, id: ItemId, hidden: bool) -> Result<()> {
        self.item(id)?;
        self.apply_hidden(id, hidden);
        Ok(())
    }

    /// `id` must be a valid handle.
    fn apply_hidden(&mut self, id: ItemId, hidden: bool) {
        let item = &self.items[id.0];
        if item.is_hidden() == hidden {
            return;
        }
        match item.parent {
            Some(page) if hidden => self.hide_in_page(page, id),
            Some(page) => self.show_in_page(page, id),
            None => self.items[id.0].set_hidden_flag(hidden),
        }
    }

    fn hide_in_page(&mut self, page: PageId, id: ItemId) {
        let pos = self.visible_position(page, id);
        self.items[id.0].set_hidden_flag(true);

        let p = &mut self.pages[page.0];
        p.visible_count -= 1;
        if pos < p.cursor || (p.cursor == p.visible_count && p.cursor > 0) {
            p.cursor -= 1;
        }
        log::debug!("hid {id:?} on {page:?}, cursor now {}", p.cursor);
    }

    fn show_in_page(&mut self, page: PageId, id: ItemId) {
        let pos = self.visible_position(page, id);
        self.items[id.0].set_hidden_flag(false);

        let p = &mut self.pages[page.0];
        if p.visible_count > 0 && pos <= p.cursor {
            p.cursor += 1;
        }
        p.visible_count += 1;
        log::debug!("showed {id:?} on {page:?}, cursor now {}", p.cursor);
    }

    /// Number of visible items ahead of `id` in its page.
    fn visible_position(&self, page: PageId, id: ItemId) -> usize {
        let mut pos = 0;
        let mut cur = self.pages[page.0].head;
        while let Some(c) = cur {
            if c == id {
                break;
            }
            if !self.items[c.0].is_hidden() {
                pos += 1;
            }
            cur = self.items[c.0].next;
        }
        pos
    }

    fn skip_hidden(&self, mut cur: Option<ItemId>) -> Option<ItemId> {
        while let Some(c) = cur {
            if !self.items[c.0].is_hidden() {
                break;
            }
            cur = self.items[c.0].next;
        }
        cur
    }

    pub fn first_visible(&self, page: PageId) -> Result<Option<ItemId>> {
        Ok(self.skip_hidden(self.page(page)?.head))
    }

    /// First visible item after `id` in its page, or `None` at the end.
    pub fn next_visible(&self, id: ItemId) -> Result<Option<ItemId>> {
        Ok(self.skip_hidden(self.item(id)?.next))
    }

    pub fn visible_items(&self, page: PageId) -> Result<VisibleItems<'_, 'a>> {
        Ok(VisibleItems {
            menu: self,
            next: self.first_visible(page)?,
        })
    }

    pub fn visible_at(&self, page: PageId, index: usize) -> Result<Option<ItemId>> {
        Ok(self.visible_items(page)?.nth(index))
    }

    pub fn cursor_item(&self, page: PageId) -> Result<Option<ItemId>> {
        self.visible_at(page, self.page(page)?.cursor)
    }

    /// Moves the cursor, clamped to the visible items.
    pub fn set_cursor(&mut self, page: PageId, index: usize) -> Result<()> {
        let p = self.page_mut(page)?;
        p.cursor = index.min(p.visible_count.saturating_sub(1));
        Ok(())
    }

    /// Parses `input` into the item's variable and fires its save callback.
    /// For selects, `input` names the option to pick.
    pub fn commit(&mut self, id: ItemId, input: &str) -> Result<()> {
        let text_capacity = self.config.text_capacity;
        let item = self.item(id)?;
        if item.is_readonly() {
            log::warn!("refusing to commit to readonly {id:?}");
            return Err(MenuError::ReadOnly);
        }
        if let Some(options) = item.options() {
            let index = options
                .position_by_name(input)
                .ok_or_else(|| MenuError::UnknownOption(input.to_string()))?;
            return self.select_option(id, index);
        }

        let binding = item.binding().ok_or(MenuError::NotEditable)?;
        binding.commit(input, text_capacity)?;
        log::debug!("committed '{input}' to {id:?}");
        self.fire_save(id);
        Ok(())
    }

    /// Stores option `index` of a select item and fires its save callback.
    pub fn select_option(&mut self, id: ItemId, index: usize) -> Result<()> {
        let item = self.item(id)?;
        if item.is_readonly() {
            return Err(MenuError::ReadOnly);
        }
        let options = item.options().ok_or(MenuError::NotSelect)?;
        let binding = item.binding().ok_or(MenuError::NotEditable)?;
        let option = options.get(index).ok_or(MenuError::OptionOutOfRange {
            index,
            len: options.len(),
        })?;

        binding.store_option(&option.value, self.config.text_capacity)?;
        log::debug!("selected '{}' for {id:?}", option.name);
        self.fire_save(id);
        Ok(())
    }

    fn fire_save(&mut self, id: ItemId) {
        if let ItemKind::Value {
            on_save: Some(on_save),
            ..
        } = self.items[id.0].kind_mut()
        {
            on_save();
        }
    }

    /// Handles a press on the item. Readonly items are ignored.
    pub fn activate(&mut self, id: ItemId) -> Result<Activation> {
        let item = self.item_ref_mut(id)?;
        if item.is_readonly() {
            return Ok(Activation::Ignored);
        }

        let activation = match item.kind_mut() {
            ItemKind::Value {
                binding: Binding::Boolean(cell),
                ..
            } => {
                let flipped = !cell.get();
                cell.set(flipped);
                Activation::Toggled(flipped)
            }
            ItemKind::Value { .. } => Activation::Edit,
            ItemKind::Button(action) => {
                action();
                Activation::Pressed
            }
            ItemKind::Link(Some(page)) | ItemKind::LinkedValue { page: Some(page), .. } => {
                Activation::Navigate(*page)
            }
            ItemKind::Back(page) => Activation::Navigate(*page),
            _ => Activation::Ignored,
        };

        if let Activation::Toggled(_) = activation {
            self.fire_save(id);
        }
        Ok(activation)
    }

    /// Plain-text lines for the visible items of a page, one per item.
    pub fn outline(&self, page: PageId) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        for id in self.visible_items(page)? {
            lines.push(self.outline_line(&self.items[id.0]));
        }
        Ok(lines)
    }

    fn outline_line(&self, item: &MenuItem<'a>) -> String {
        let title = item.title().unwrap_or_default();
        let line = match item.item_type() {
            ItemType::Back => "<".to_string(),
            ItemType::Link => format!("{title} >"),
            ItemType::Button => format!("[{title}]"),
            ItemType::Text => title.to_string(),
            ItemType::Value | ItemType::LinkedValue => {
                let value = item.display_value(&self.config).unwrap_or_default();
                match (item.title(), item.item_type()) {
                    (None, _) => value,
                    (Some(t), ItemType::LinkedValue) => format!("{t}: {value} >"),
                    (Some(t), _) => format!("{t}: {value}"),
                }
            }
        };
        if item.is_readonly() && matches!(item.item_type(), ItemType::Value | ItemType::Link) {
            format!("{line} (ro)")
        } else {
            line
        }
    }
}

/// Visible items of one page, in order.
pub struct VisibleItems<'m, 'a> {
    menu: &'m Menu<'a>,
    next: Option<ItemId>,
}

impl Iterator for VisibleItems<'_, '_> {
    type Item = ItemId;

    fn next(&mut self) -> Option<ItemId> {
        let cur = self.next?;
        self.next = self.menu.skip_hidden(self.menu.items[cur.0].next);
        Some(cur)
    }
}

/// Mutable access to an item held by a [`Menu`].
///
/// Visibility changes are routed through the menu so an attached item's page
/// stays consistent.
pub struct ItemMut<'m, 'a> {
    menu: &'m mut Menu<'a>,
    id: ItemId,
}

impl<'a> ItemMut<'_, 'a> {
    fn item(&mut self) -> &mut MenuItem<'a> {
        &mut self.menu.items[self.id.0]
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.item().set_title(title);
        self
    }

    pub fn clear_title(&mut self) -> &mut Self {
        self.item().clear_title();
        self
    }

    pub fn set_precision(&mut self, precision: u8) -> &mut Self {
        self.item().set_precision(precision);
        self
    }

    pub fn set_readonly(&mut self, readonly: bool) -> &mut Self {
        self.item().set_readonly(readonly);
        self
    }

    pub fn hide(&mut self) -> &mut Self {
        self.set_hidden(true)
    }

    pub fn show(&mut self) -> &mut Self {
        self.set_hidden(false)
    }

    pub fn set_hidden(&mut self, hidden: bool) -> &mut Self {
        // The id was checked when this handle was created.
        self.menu.apply_hidden(self.id, hidden);
        self
    }
}
