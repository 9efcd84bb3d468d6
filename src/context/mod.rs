//! The loaded configuration tree and its query surface.

mod section;
mod typed;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::preprocess::ScratchArena;

pub use section::{Item, Section, INITIAL_ITEM_CAPACITY, ITEM_NAME_MAX, ITEM_VALUE_MAX};

pub(crate) use section::truncate;
use typed::{leading_float, leading_integer};

/// A loaded, read-only INI configuration.
///
/// Produced by [`Loader`](crate::Loader). Items live in an unnamed global
/// section and in named sections; every lookup takes a section name, with
/// `""` meaning the global section. Missing sections and items are not
/// errors: lookups return `None` or the caller's default.
///
/// ## Example
///
/// ```
/// let ctx = ini_directives::load_str("port = 8080\n[db]\nhost = localhost\n")?;
///
/// assert_eq!(ctx.get_int("", "port", 0), 8080);
/// assert_eq!(ctx.get_str("db", "host"), Some("localhost"));
/// assert_eq!(ctx.get_str_or("db", "user", "root"), "root");
/// # Ok::<(), ini_directives::Error>(())
/// ```
#[derive(Debug)]
pub struct IniContext {
    base_dir: PathBuf,
    global: Section,
    sections: HashMap<String, Section>,
    annotations_enabled: bool,
    arena: ScratchArena,
}

/// Borrowed view of one section.
#[derive(Debug, Clone, Copy)]
pub struct SectionView<'a> {
    name: &'a str,
    items: &'a [Item],
}

impl<'a> SectionView<'a> {
    /// Section name; empty for the global section.
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn items(&self) -> &'a [Item] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IniContext {
    pub(crate) fn new(base_dir: PathBuf, annotations_enabled: bool) -> Self {
        Self {
            base_dir,
            global: Section::new(),
            sections: HashMap::new(),
            annotations_enabled,
            arena: ScratchArena::new(),
        }
    }

    /// Directory that relative includes are resolved against. Empty when the
    /// top-level document was fetched remotely.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn annotations_enabled(&self) -> bool {
        self.annotations_enabled
    }

    /// Buffers written by directive expansion during the load.
    pub fn scratch(&self) -> &ScratchArena {
        &self.arena
    }

    pub(crate) fn arena_mut(&mut self) -> &mut ScratchArena {
        &mut self.arena
    }

    /// The section items are appended to; `None` is the global section.
    pub(crate) fn section_mut(&mut self, name: Option<&str>) -> &mut Section {
        match name {
            None => &mut self.global,
            Some(name) => self.sections.entry(name.to_string()).or_default(),
        }
    }

    pub(crate) fn sort_items(&mut self) {
        self.global.sort();
        for section in self.sections.values_mut() {
            section.sort();
        }
    }

    fn lookup(&self, section: &str) -> Option<&Section> {
        if section.is_empty() {
            Some(&self.global)
        } else {
            self.sections.get(section)
        }
    }

    /// Value of `item` in `section`.
    ///
    /// When the key has several values, any one of them is returned.
    pub fn get_str(&self, section: &str, item: &str) -> Option<&str> {
        self.lookup(section)?
            .find(truncate(item, ITEM_NAME_MAX))
            .map(Item::value)
    }

    pub fn get_str_or<'a>(&'a self, section: &str, item: &str, default: &'a str) -> &'a str {
        self.get_str(section, item).unwrap_or(default)
    }

    /// Leading decimal integer of the value, as `atoi` would read it.
    ///
    /// The default applies only when the item is absent. A present value
    /// with no leading digits reads as 0; out-of-range values saturate.
    pub fn get_int(&self, section: &str, item: &str, default: i32) -> i32 {
        self.get_str(section, item).map_or(default, |value| {
            let n = leading_integer(value);
            i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX })
        })
    }

    pub fn get_int64(&self, section: &str, item: &str, default: i64) -> i64 {
        self.get_str(section, item).map_or(default, leading_integer)
    }

    /// Leading floating point number of the value, as `strtod` would read it.
    pub fn get_double(&self, section: &str, item: &str, default: f64) -> f64 {
        self.get_str(section, item).map_or(default, leading_float)
    }

    /// `true`, `yes`, `on` (any case) and `1` are true; any other present
    /// value is false.
    pub fn get_bool(&self, section: &str, item: &str, default: bool) -> bool {
        match self.get_str(section, item) {
            None => default,
            Some(value) => {
                ["true", "yes", "on"]
                    .iter()
                    .any(|word| value.eq_ignore_ascii_case(word))
                    || value == "1"
            }
        }
    }

    /// Up to `max_values` values of a multi-valued key.
    pub fn get_values(&self, section: &str, item: &str, max_values: usize) -> Vec<&str> {
        self.get_values_ex(section, item)
            .iter()
            .take(max_values)
            .map(Item::value)
            .collect()
    }

    /// Every item named `item` in `section`, adjacent in storage.
    pub fn get_values_ex(&self, section: &str, item: &str) -> &[Item] {
        self.lookup(section)
            .map_or(&[][..], |found| found.find_all(truncate(item, ITEM_NAME_MAX)))
    }

    /// Names of all named sections, sorted. The global section is not listed.
    pub fn section_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sections.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// View of a section; `""` is the global section.
    pub fn section(&self, name: &str) -> Option<SectionView<'_>> {
        if name.is_empty() {
            return Some(SectionView {
                name: "",
                items: self.global.items(),
            });
        }
        let (name, section) = self.sections.get_key_value(name)?;
        Some(SectionView {
            name,
            items: section.items(),
        })
    }

    /// Every named section, sorted by name.
    pub fn sections(&self) -> impl Iterator<Item = SectionView<'_>> {
        self.section_names()
            .into_iter()
            .filter_map(move |name| self.section(name))
    }

    /// Raw items of a section; empty when the section does not exist.
    pub fn section_items(&self, name: &str) -> &[Item] {
        self.lookup(name).map_or(&[][..], Section::items)
    }

    /// Releases sections, items and scratch buffers.
    ///
    /// Dropping the context has the same effect.
    pub fn destroy(mut self) {
        tracing::debug!(
            sections = self.sections.len(),
            scratch_buffers = self.arena.len(),
            "destroying ini context"
        );
        self.arena.release();
        self.sections.clear();
    }
}

impl fmt::Display for IniContext {
    /// Lists every section with numbered `name=value` lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_items(f: &mut fmt::Formatter<'_>, items: &[Item]) -> fmt::Result {
            for (index, item) in items.iter().enumerate() {
                writeln!(f, "{}. {}={}", index + 1, item.name(), item.value())?;
            }
            writeln!(f)
        }

        writeln!(f, "global section, item count: {}", self.global.len())?;
        write_items(f, self.global.items())?;

        for view in self.sections() {
            writeln!(f, "section: {}, item count: {}", view.name(), view.len())?;
            write_items(f, view.items())?;
        }
        Ok(())
    }
}
