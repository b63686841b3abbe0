use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::binding::{check_text_len, Binding, ScalarKind, SelectTarget};
use crate::item::MenuItem;
use crate::menu::{Menu, PageId};
use crate::options::{OptionSet, OptionValue, SelectOption};

pub const DEFAULT_FLOAT_PRECISION: u8 = 3;
pub const DEFAULT_DOUBLE_PRECISION: u8 = 6;
pub const DEFAULT_TEXT_CAPACITY: usize = 16;

/// Defaults a menu applies to its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub float_precision: u8,
    pub double_precision: u8,
    /// Characters a text variable can hold.
    pub text_capacity: usize,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            float_precision: DEFAULT_FLOAT_PRECISION,
            double_precision: DEFAULT_DOUBLE_PRECISION,
            text_capacity: DEFAULT_TEXT_CAPACITY,
        }
    }
}

/// JSON description of a whole menu.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuFile {
    #[serde(default)]
    pub settings: MenuConfig,

    #[serde(default)]
    pub option_sets: HashMap<String, Vec<OptionEntry>>,

    pub pages: Vec<PageEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionEntry {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageEntry {
    pub name: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Name of the page this one returns to.
    #[serde(default)]
    pub parent: Option<String>,

    #[serde(default)]
    pub items: Vec<ItemEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemEntry {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub readonly: bool,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default)]
    pub precision: Option<u8>,

    #[serde(flatten)]
    pub body: ItemBody,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemBody {
    Byte(VariableEntry<u8>),
    Integer(VariableEntry<i16>),
    Boolean(VariableEntry<bool>),
    Text(VariableEntry<String>),
    Float(VariableEntry<f32>),
    Double(VariableEntry<f64>),
    Link { page: String },
    Button { action: String },
    Label,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableEntry<T> {
    pub value: T,

    /// Option set name; turns the item into a select.
    #[serde(default)]
    pub select: Option<String>,

    /// Page name; turns the item into a linked value.
    #[serde(default)]
    pub link: Option<String>,
}

pub fn load_optional() -> Result<Option<MenuFile>> {
    let Some(path) = resolve_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load(&path).map(Some)
}

pub fn load(path: &Path) -> Result<MenuFile> {
    let bytes = fs::read(path).with_context(|| format!("reading menu {}", path.display()))?;
    let file: MenuFile =
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    Ok(file)
}

pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = env::var("LCDMENU_CONFIG") {
        if !p.trim().is_empty() {
            return Some(PathBuf::from(p));
        }
    }

    let local = PathBuf::from("lcdmenu.json");
    if local.exists() {
        return Some(local);
    }

    if let Some(home) = env::var_os("HOME") {
        return Some(PathBuf::from(home).join(".config").join("lcdmenu").join("menu.json"));
    }

    None
}

/// Owns the variables and option sets a loaded menu binds to.
///
/// Built first so that a [`Menu`] can borrow from it.
#[derive(Debug, Default)]
pub struct Storage {
    slots: Vec<Slot>,
    option_sets: HashMap<String, OptionSet>,
}

#[derive(Debug)]
pub enum Slot {
    Byte(Cell<u8>),
    Integer(Cell<i16>),
    Boolean(Cell<bool>),
    Text(RefCell<String>),
    Float(Cell<f32>),
    Double(Cell<f64>),
}

impl Slot {
    fn binding(&self) -> Binding<'_> {
        match self {
            Slot::Byte(c) => Binding::Byte(c),
            Slot::Integer(c) => Binding::Integer(c),
            Slot::Boolean(c) => Binding::Boolean(c),
            Slot::Text(c) => Binding::Text(c),
            Slot::Float(c) => Binding::Float(c),
            Slot::Double(c) => Binding::Double(c),
        }
    }

    fn select_target(&self) -> Option<SelectTarget<'_>> {
        match self {
            Slot::Byte(c) => Some(c.into()),
            Slot::Integer(c) => Some(c.into()),
            Slot::Text(c) => Some(c.into()),
            Slot::Float(c) => Some(c.into()),
            Slot::Double(c) => Some(c.into()),
            Slot::Boolean(_) => None,
        }
    }
}

impl Storage {
    /// Allocates one slot per variable item, in page then item order, and
    /// converts every option set to the kind of the variables using it.
    pub fn from_file(file: &MenuFile) -> Result<Self> {
        let mut storage = Storage::default();
        let mut set_kinds: HashMap<&str, ScalarKind> = HashMap::new();
        let capacity = file.settings.text_capacity;

        for page in &file.pages {
            for item in &page.items {
                let (slot, select) = match &item.body {
                    ItemBody::Byte(v) => (Slot::Byte(Cell::new(v.value)), v.select.as_deref()),
                    ItemBody::Integer(v) => (Slot::Integer(Cell::new(v.value)), v.select.as_deref()),
                    ItemBody::Boolean(v) => (Slot::Boolean(Cell::new(v.value)), v.select.as_deref()),
                    ItemBody::Text(v) => {
                        check_text_len(&v.value, capacity).with_context(|| {
                            format!("text item '{}' on page '{}'", item.title.as_deref().unwrap_or(""), page.name)
                        })?;
                        (Slot::Text(RefCell::new(v.value.clone())), v.select.as_deref())
                    }
                    ItemBody::Float(v) => (Slot::Float(Cell::new(v.value)), v.select.as_deref()),
                    ItemBody::Double(v) => (Slot::Double(Cell::new(v.value)), v.select.as_deref()),
                    _ => continue,
                };
                if let Some(name) = select {
                    let kind = slot.binding().kind();
                    if let Some(prev) = set_kinds.insert(name, kind) {
                        if prev != kind {
                            bail!("option set '{name}' is used by both {prev} and {kind} variables");
                        }
                    }
                }
                storage.slots.push(slot);
            }
        }

        for (name, kind) in set_kinds {
            let entries = file
                .option_sets
                .get(name)
                .ok_or_else(|| anyhow!("unknown option set '{name}'"))?;
            let set = entries
                .iter()
                .map(|e| {
                    let value = option_value(&e.value, kind, capacity)
                        .with_context(|| format!("option '{}' in set '{name}'", e.name))?;
                    Ok(SelectOption::new(e.name.clone(), value))
                })
                .collect::<Result<OptionSet>>()?;
            storage.option_sets.insert(name.to_string(), set);
        }

        Ok(storage)
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }
}

fn option_value(value: &Value, kind: ScalarKind, text_capacity: usize) -> Result<OptionValue> {
    let bad = || anyhow!("{value} is not a valid {kind} option");
    let out = match kind {
        ScalarKind::Byte => OptionValue::Byte(
            value.as_u64().and_then(|v| u8::try_from(v).ok()).ok_or_else(bad)?,
        ),
        ScalarKind::Integer => OptionValue::Integer(
            value.as_i64().and_then(|v| i16::try_from(v).ok()).ok_or_else(bad)?,
        ),
        ScalarKind::Text => {
            let text = value.as_str().ok_or_else(bad)?;
            check_text_len(text, text_capacity)?;
            OptionValue::Text(text.to_string())
        }
        ScalarKind::Float => OptionValue::Float(
            value
                .as_f64()
                .map(|v| v as f32)
                .filter(|v| v.is_finite())
                .ok_or_else(bad)?,
        ),
        ScalarKind::Double => OptionValue::Double(value.as_f64().ok_or_else(bad)?),
        _ => bail!("{kind} variables cannot be option selects"),
    };
    Ok(out)
}

/// A menu built from a [`MenuFile`], with pages addressable by name.
pub struct LoadedMenu<'a> {
    pub menu: Menu<'a>,
    pub pages: HashMap<String, PageId>,
}

impl LoadedMenu<'_> {
    pub fn page(&self, name: &str) -> Result<PageId> {
        self.pages.get(name).copied().ok_or_else(|| {
            let mut known = self.pages.keys().map(|k| k.as_str()).collect::<Vec<_>>();
            known.sort_unstable();
            anyhow!("Unknown page '{name}'. Known pages: {}", known.join(", "))
        })
    }
}

/// Builds the menu described by `file` over the variables in `storage`.
/// `storage` must come from [`Storage::from_file`] on the same file.
pub fn build<'a>(file: &MenuFile, storage: &'a Storage) -> Result<LoadedMenu<'a>> {
    let mut menu = Menu::new(file.settings);
    let mut pages = HashMap::new();

    for page in &file.pages {
        let title = page.title.clone().unwrap_or_else(|| page.name.clone());
        let id = menu.add_page(title);
        if pages.insert(page.name.clone(), id).is_some() {
            bail!("duplicate page '{}'", page.name);
        }
    }
    let lookup = |name: &str| {
        pages
            .get(name)
            .copied()
            .ok_or_else(|| anyhow!("unknown page '{name}'"))
    };

    let mut slots = storage.slots.iter();
    for page in &file.pages {
        let page_id = lookup(&page.name)?;
        if let Some(parent) = page.parent.as_deref() {
            menu.set_parent_page(page_id, lookup(parent)?)?;
        }

        for entry in &page.items {
            let mut item = match &entry.body {
                ItemBody::Link { page: target } => {
                    MenuItem::link(entry.title.clone().unwrap_or_default(), lookup(target)?, entry.readonly)
                }
                ItemBody::Button { action } => {
                    let action = action.clone();
                    MenuItem::button(
                        entry.title.clone().unwrap_or_default(),
                        move || log::info!("button action '{action}' triggered"),
                        entry.readonly,
                    )
                }
                ItemBody::Label => MenuItem::text(entry.title.clone().unwrap_or_default()),
                body => {
                    let slot = slots
                        .next()
                        .ok_or_else(|| anyhow!("storage does not match menu description"))?;
                    variable_item(entry, body, slot, storage, &lookup)?
                }
            };

            if entry.title.is_none() {
                item.clear_title();
            }
            if let Some(precision) = entry.precision {
                item.set_precision(precision);
            }
            if entry.hidden {
                item.hide();
            }
            menu.add_item(page_id, item)?;
        }
    }

    log::debug!("built menu with {} pages", pages.len());
    Ok(LoadedMenu { menu, pages })
}

fn variable_item<'a>(
    entry: &ItemEntry,
    body: &ItemBody,
    slot: &'a Slot,
    storage: &'a Storage,
    lookup: &dyn Fn(&str) -> Result<PageId>,
) -> Result<MenuItem<'a>> {
    let (select, link) = match body {
        ItemBody::Byte(v) => (v.select.as_deref(), v.link.as_deref()),
        ItemBody::Integer(v) => (v.select.as_deref(), v.link.as_deref()),
        ItemBody::Boolean(v) => (v.select.as_deref(), v.link.as_deref()),
        ItemBody::Text(v) => (v.select.as_deref(), v.link.as_deref()),
        ItemBody::Float(v) => (v.select.as_deref(), v.link.as_deref()),
        ItemBody::Double(v) => (v.select.as_deref(), v.link.as_deref()),
        _ => bail!("not a variable item"),
    };
    let title = entry.title.clone();

    let item = match (select, link, title) {
        (Some(_), Some(_), _) => bail!("an item cannot be both a select and a linked value"),
        (Some(set), None, title) => {
            let options = storage
                .option_sets
                .get(set)
                .ok_or_else(|| anyhow!("unknown option set '{set}'"))?;
            let target = slot
                .select_target()
                .ok_or_else(|| anyhow!("boolean variables cannot be option selects"))?;
            MenuItem::select(title.unwrap_or_default(), target, options, entry.readonly)
        }
        (None, Some(page), title) => {
            let mut item = MenuItem::linked_value(title.unwrap_or_default(), slot.binding(), lookup(page)?);
            if entry.readonly {
                item.set_readonly(true);
            }
            item
        }
        (None, None, Some(title)) => MenuItem::value(title, slot.binding(), entry.readonly),
        (None, None, None) => MenuItem::untitled_value(slot.binding(), entry.readonly),
    };
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> MenuFile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn settings_fall_back_to_defaults() {
        let file = parse(r#"{ "settings": { "float_precision": 1 }, "pages": [] }"#);

        assert_eq!(file.settings.float_precision, 1);
        assert_eq!(file.settings.double_precision, DEFAULT_DOUBLE_PRECISION);
        assert_eq!(file.settings.text_capacity, DEFAULT_TEXT_CAPACITY);
    }

    #[test]
    fn builds_pages_items_and_selects() {
        let file = parse(
            r#"{
                "option_sets": { "speeds": [
                    { "name": "Slow", "value": 1 },
                    { "name": "Fast", "value": 5 }
                ] },
                "pages": [
                    { "name": "main", "title": "Main", "items": [
                        { "type": "byte", "title": "Speed", "value": 5, "select": "speeds" },
                        { "type": "float", "title": "Gain", "value": 1.5, "precision": 1 },
                        { "type": "boolean", "title": "Debug", "value": false, "hidden": true },
                        { "type": "link", "title": "More", "page": "more" }
                    ] },
                    { "name": "more", "parent": "main", "items": [
                        { "type": "label", "title": "v1.0" }
                    ] }
                ]
            }"#,
        );
        let storage = Storage::from_file(&file).unwrap();
        assert_eq!(storage.slots().len(), 3);

        let loaded = build(&file, &storage).unwrap();
        let main = loaded.page("main").unwrap();
        let more = loaded.page("more").unwrap();

        assert_eq!(
            loaded.menu.outline(main).unwrap(),
            vec!["Speed: Fast", "Gain: 1.5", "More >"]
        );
        assert_eq!(loaded.menu.outline(more).unwrap(), vec!["<", "v1.0"]);
        assert_eq!(loaded.menu.page(more).unwrap().title(), "more");
        assert!(loaded.page("missing").is_err());
    }

    #[test]
    fn rejects_boolean_select() {
        let file = parse(
            r#"{
                "option_sets": { "flags": [ { "name": "Yes", "value": true } ] },
                "pages": [ { "name": "main", "items": [
                    { "type": "boolean", "title": "Flag", "value": true, "select": "flags" }
                ] } ]
            }"#,
        );
        assert!(Storage::from_file(&file).is_err());
    }

    #[test]
    fn rejects_out_of_range_option() {
        let file = parse(
            r#"{
                "option_sets": { "levels": [ { "name": "Huge", "value": 300 } ] },
                "pages": [ { "name": "main", "items": [
                    { "type": "byte", "title": "Level", "value": 1, "select": "levels" }
                ] } ]
            }"#,
        );
        let err = Storage::from_file(&file).unwrap_err();
        assert!(format!("{err:#}").contains("Huge"));
    }

    #[test]
    fn rejects_float_option_beyond_f32_range() {
        let file = parse(
            r#"{
                "option_sets": { "gains": [ { "name": "Wild", "value": 1e300 } ] },
                "pages": [ { "name": "main", "items": [
                    { "type": "float", "title": "Gain", "value": 1.0, "select": "gains" }
                ] } ]
            }"#,
        );
        let err = Storage::from_file(&file).unwrap_err();
        assert!(format!("{err:#}").contains("Wild"));
    }

    #[test]
    fn text_values_must_fit_capacity() {
        let initial = parse(
            r#"{
                "settings": { "text_capacity": 4 },
                "pages": [ { "name": "main", "items": [
                    { "type": "text", "title": "Name", "value": "abcdefghij" }
                ] } ]
            }"#,
        );
        let err = Storage::from_file(&initial).unwrap_err();
        assert!(format!("{err:#}").contains("Name"));

        let option = parse(
            r#"{
                "settings": { "text_capacity": 4 },
                "option_sets": { "modes": [
                    { "name": "Eco", "value": "eco" },
                    { "name": "Long", "value": "abcdefghij" }
                ] },
                "pages": [ { "name": "main", "items": [
                    { "type": "text", "title": "Mode", "value": "eco", "select": "modes" }
                ] } ]
            }"#,
        );
        let err = Storage::from_file(&option).unwrap_err();
        assert!(format!("{err:#}").contains("Long"));
    }

    #[test]
    fn untitled_entries_stay_untitled() {
        let file = parse(
            r#"{
                "pages": [
                    { "name": "main", "items": [
                        { "type": "label" },
                        { "type": "link", "page": "more" },
                        { "type": "button", "action": "reset" },
                        { "type": "label", "title": "" }
                    ] },
                    { "name": "more", "items": [] }
                ]
            }"#,
        );
        let storage = Storage::from_file(&file).unwrap();
        let loaded = build(&file, &storage).unwrap();
        let main = loaded.page("main").unwrap();

        let titles: Vec<_> = loaded
            .menu
            .visible_items(main)
            .unwrap()
            .map(|id| loaded.menu.item(id).unwrap().title().map(str::to_string))
            .collect();
        assert_eq!(titles, vec![None, None, None, Some(String::new())]);
    }
}
