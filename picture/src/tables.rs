use crate::typeface::*;

use std::sync::*;

///
/// An append-only table that assigns each distinct value a stable 1-based index
///
/// Index 0 is reserved to mean 'no value'. Tables are small (a handful of type names or fonts per picture),
/// so lookups are a linear scan.
///
#[derive(Clone, Debug, PartialEq)]
pub struct InternTable<T> {
    values: Vec<T>
}

///
/// The names of the flattenable types used by a picture
///
pub type FactoryTable = InternTable<String>;

///
/// The typefaces used by the fonts in a picture
///
pub type TypefaceTable = InternTable<Arc<Typeface>>;

impl<T> Default for InternTable<T> {
    fn default() -> Self {
        InternTable { values: vec![] }
    }
}

impl<T> InternTable<T> {
    ///
    /// Creates a new empty table
    ///
    pub fn new() -> InternTable<T> {
        Self::default()
    }

    ///
    /// Appends a value read from the wire, without checking for duplicates, returning its index
    ///
    pub fn push(&mut self, value: T) -> u32 {
        self.values.push(value);
        self.values.len() as u32
    }

    ///
    /// Retrieves the value at a 1-based index
    ///
    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        if index == 0 {
            None
        } else {
            self.values.get((index - 1) as usize)
        }
    }

    #[inline] pub fn len(&self) -> usize { self.values.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.values.is_empty() }

    ///
    /// The values in this table, in index order
    ///
    pub fn iter(&self) -> impl Iterator<Item=&T> {
        self.values.iter()
    }
}

impl<T: PartialEq> InternTable<T> {
    ///
    /// Returns the index of an existing equal value, or appends the value and returns its new index
    ///
    pub fn intern(&mut self, value: T) -> u32 {
        if let Some(existing) = self.index_of(&value) {
            existing
        } else {
            self.push(value)
        }
    }

    ///
    /// Finds the index of a value already in this table
    ///
    pub fn index_of(&self, value: &T) -> Option<u32> {
        self.values.iter()
            .position(|existing| existing == value)
            .map(|idx| (idx + 1) as u32)
    }
}

impl FactoryTable {
    ///
    /// Interns a factory name
    ///
    pub fn intern_name(&mut self, name: &str) -> u32 {
        match self.values.iter().position(|existing| existing == name) {
            Some(idx)   => (idx + 1) as u32,
            None        => self.push(name.to_string())
        }
    }

    ///
    /// Retrieves the factory name at a 1-based index
    ///
    pub fn name(&self, index: u32) -> Option<&str> {
        self.get(index).map(|name| name.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn intern_same_name_twice() {
        let mut table = FactoryTable::new();

        let first   = table.intern_name("SkDashImpl");
        let second  = table.intern_name("SkDashImpl");

        assert!(first == 1);
        assert!(second == 1);
        assert!(table.len() == 1);
    }

    #[test]
    fn indexes_are_one_based() {
        let mut table = FactoryTable::new();

        table.intern_name("SkLinearGradient");
        table.intern_name("SkBlurImageFilter");

        assert!(table.name(0).is_none());
        assert!(table.name(1) == Some("SkLinearGradient"));
        assert!(table.name(2) == Some("SkBlurImageFilter"));
        assert!(table.name(3).is_none());
    }

    #[test]
    fn push_does_not_dedup() {
        let mut table = InternTable::new();

        assert!(table.push(4) == 1);
        assert!(table.push(4) == 2);
        assert!(table.intern(4) == 1);
        assert!(table.len() == 2);
    }

    #[test]
    fn intern_typeface_by_value() {
        let mut table   = TypefaceTable::new();
        let face        = Arc::new(Typeface::new(FontDescriptor::with_family("Lato"), vec![1, 2, 3]));
        let same_face   = Arc::new(Typeface::new(FontDescriptor::with_family("Lato"), vec![1, 2, 3]));
        let other_face  = Arc::new(Typeface::new(FontDescriptor::with_family("Lato"), vec![4]));

        assert!(table.intern(Arc::clone(&face)) == 1);
        assert!(table.intern(same_face) == 1);
        assert!(table.intern(other_face) == 2);
        assert!(table.intern(face) == 1);
    }
}
