//! Resource Index
//!
//! A (type, id)-keyed lookup over a flat resource list, used to resolve
//! cross-references during extraction (e.g. a stage's `deployment` input into
//! the actual deployment record).

use crate::snapshot::ResourceRecord;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TypeId<'a> {
    ty: &'a str,
    id: &'a str,
}

/// Index over one snapshot's resource list. Build once per extraction pass.
pub struct ResourceIndex<'a> {
    entries: HashMap<TypeId<'a>, &'a ResourceRecord>,
}

impl<'a> ResourceIndex<'a> {
    /// Single pass, O(n). Duplicate (type, id) pairs are last-write-wins; no
    /// dedup guarantee beyond that.
    pub fn build(resources: &'a [ResourceRecord]) -> Self {
        let mut entries = HashMap::with_capacity(resources.len());
        for res in resources {
            entries.insert(
                TypeId {
                    ty: res.ty.as_str(),
                    id: res.id.as_str(),
                },
                res,
            );
        }
        Self { entries }
    }

    /// A missing key is not an error: callers treat it as "referenced resource
    /// is optional/unavailable" since role slots may legitimately be absent.
    pub fn lookup(&self, ty: &str, id: &str) -> Option<&'a ResourceRecord> {
        self.entries.get(&TypeId { ty, id }).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
