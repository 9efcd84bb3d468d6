//! Sections and the items they hold.

/// Longest item name kept, in bytes. Longer names are truncated.
pub const ITEM_NAME_MAX: usize = 64;

/// Longest item value kept, in bytes. Longer values are truncated.
pub const ITEM_VALUE_MAX: usize = 256;

/// Capacity of a section's first item allocation; later growth doubles it.
pub const INITIAL_ITEM_CAPACITY: usize = 32;

/// One `name=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    name: String,
    value: String,
}

impl Item {
    /// Builds an item from raw text: each side is cut to its length limit,
    /// then trimmed.
    pub fn new(raw_name: &str, raw_value: &str) -> Self {
        Self {
            name: truncate(raw_name, ITEM_NAME_MAX).trim().to_string(),
            value: truncate(raw_value, ITEM_VALUE_MAX).trim().to_string(),
        }
    }

    /// An item with the same name and a new value, cut to the value limit.
    pub(crate) fn with_value(&self, value: &str) -> Self {
        Self {
            name: self.name.clone(),
            value: truncate(value, ITEM_VALUE_MAX).to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Cuts `text` to at most `max` bytes without splitting a character.
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// An ordered collection of items.
///
/// Items are kept in insertion order while loading and sorted by name once
/// the load completes, so that same-named items are adjacent.
#[derive(Debug, Clone, Default)]
pub struct Section {
    items: Vec<Item>,
    alloc_count: usize,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Slots reserved for items: 0, then 32, then doubling.
    pub fn capacity(&self) -> usize {
        self.alloc_count
    }

    pub(crate) fn push(&mut self, item: Item) {
        if self.items.len() >= self.alloc_count {
            self.grow();
        }
        self.items.push(item);
    }

    fn grow(&mut self) {
        let alloc_count = if self.alloc_count == 0 {
            INITIAL_ITEM_CAPACITY
        } else {
            self.alloc_count * 2
        };
        let mut items = Vec::with_capacity(alloc_count);
        items.append(&mut self.items);
        self.items = items;
        self.alloc_count = alloc_count;
    }

    pub(crate) fn sort(&mut self) {
        if self.items.len() > 1 {
            self.items.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }

    /// Index of some item named `name`, by binary search over sorted items.
    fn position(&self, name: &str) -> Option<usize> {
        self.items
            .binary_search_by(|item| item.name.as_str().cmp(name))
            .ok()
    }

    /// First item named `name`. Requires sorted items.
    pub(crate) fn find(&self, name: &str) -> Option<&Item> {
        self.position(name).map(|index| &self.items[index])
    }

    /// Every item named `name`, as one contiguous run. Requires sorted items.
    pub(crate) fn find_all(&self, name: &str) -> &[Item] {
        let Some(found) = self.position(name) else {
            return &[];
        };

        let same = |item: &Item| item.name == name;
        let first = self.items[..found]
            .iter()
            .rposition(|item| !same(item))
            .map_or(0, |index| index + 1);
        let last = self.items[found..]
            .iter()
            .position(|item| !same(item))
            .map_or(self.items.len(), |offset| found + offset);

        &self.items[first..last]
    }
}
