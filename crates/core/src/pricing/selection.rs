use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered set of catalog ids chosen by the shopper.
///
/// Membership changes only through [`SelectionSet::toggle`]. Insertion order is
/// kept so order summaries list items in the order they were picked; pricing
/// does not depend on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionSet<Id> {
    ids: Vec<Id>,
}

impl<Id> Default for SelectionSet<Id> {
    fn default() -> Self {
        Self { ids: Vec::new() }
    }
}

impl<Id: PartialEq> SelectionSet<Id> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` if absent, removes it if present. Returns whether `id` is a
    /// member afterwards.
    pub fn toggle(&mut self, id: Id) -> bool {
        match self.ids.iter().position(|existing| existing == &id) {
            Some(index) => {
                self.ids.remove(index);
                false
            }
            None => {
                self.ids.push(id);
                true
            }
        }
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Id> {
        self.ids.iter()
    }

    pub fn as_slice(&self) -> &[Id] {
        &self.ids
    }
}

/// Builds a set from untrusted input (e.g. navigation state), keeping the first
/// occurrence of any duplicated id.
impl<Id: PartialEq> FromIterator<Id> for SelectionSet<Id> {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        let mut ids = Vec::new();
        for id in iter {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Self { ids }
    }
}

impl<'a, Id> IntoIterator for &'a SelectionSet<Id> {
    type Item = &'a Id;
    type IntoIter = std::slice::Iter<'a, Id>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl<Id: Serialize> Serialize for SelectionSet<Id> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ids.serialize(serializer)
    }
}

impl<'de, Id: Deserialize<'de> + PartialEq> Deserialize<'de> for SelectionSet<Id> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Id>::deserialize(deserializer).map(|ids| ids.into_iter().collect())
    }
}
