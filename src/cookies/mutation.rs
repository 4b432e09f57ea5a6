use super::attributes::CookieAttributes;

/// One pending `Set-Cookie` write.
#[derive(Clone, PartialEq, Eq)]
pub struct CookieMutation {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
}

impl CookieMutation {
    pub fn set(name: impl Into<String>, value: impl Into<String>, attributes: CookieAttributes) -> Self {
        Self { name: name.into(), value: value.into(), attributes }
    }

    /// A removal is a write of the empty value with an expired Max-Age.
    pub fn removal(name: impl Into<String>, attributes: &CookieAttributes) -> Self {
        Self { name: name.into(), value: String::new(), attributes: attributes.expired() }
    }

    pub fn is_removal(&self) -> bool {
        self.value.is_empty() && self.attributes.is_expired()
    }
}

// Values are secrets: show the length only.
impl std::fmt::Debug for CookieMutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieMutation")
            .field("name", &self.name)
            .field("value_len", &self.value.len())
            .field("attributes", &self.attributes)
            .finish()
    }
}

/// Ordered collection of pending cookie writes for one request/response cycle.
///
/// Staging a name that is already present overwrites the earlier entry in
/// place, so the set holds at most one mutation per name and keeps the order
/// in which names were first staged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationSet {
    entries: Vec<CookieMutation>,
}

impl MutationSet {
    pub fn new() -> Self { Self::default() }

    pub fn stage(&mut self, mutation: CookieMutation) {
        match self.entries.iter_mut().find(|m| m.name == mutation.name) {
            Some(existing) => *existing = mutation,
            None => self.entries.push(mutation),
        }
    }

    pub fn set(&mut self, name: &str, value: &str, attributes: &CookieAttributes) {
        self.stage(CookieMutation::set(name, value, attributes.clone()));
    }

    pub fn remove(&mut self, name: &str, attributes: &CookieAttributes) {
        self.stage(CookieMutation::removal(name, attributes));
    }

    /// Stage every mutation of `other` after the ones already held here.
    pub fn merge(&mut self, other: MutationSet) {
        for m in other.entries { self.stage(m); }
    }

    pub fn get(&self, name: &str) -> Option<&CookieMutation> {
        self.entries.iter().find(|m| m.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CookieMutation> { self.entries.iter() }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.entries.iter().map(|m| m.name.as_str()) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl FromIterator<CookieMutation> for MutationSet {
    fn from_iter<I: IntoIterator<Item = CookieMutation>>(iter: I) -> Self {
        let mut set = MutationSet::new();
        for m in iter { set.stage(m); }
        set
    }
}
