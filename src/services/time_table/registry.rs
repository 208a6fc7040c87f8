use std::collections::HashMap;

use super::TimeTable;

/// Host-side lookup of time table instances by identifier.
///
/// Instances never see their identifier; it only exists here.
pub struct TimeTableRegistry<G, I> {
    instances: HashMap<String, TimeTable<G, I>>,
}

impl<G, I> Default for TimeTableRegistry<G, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G, I> std::fmt::Debug for TimeTableRegistry<G, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeTableRegistry")
            .field("instances", &self.idents())
            .finish()
    }
}

impl<G, I> TimeTableRegistry<G, I> {
    pub fn new() -> Self {
        Self {
            instances: HashMap::new(),
        }
    }

    /// Register an instance, returning the one it replaced.
    pub fn register(
        &mut self,
        ident: impl Into<String>,
        table: TimeTable<G, I>,
    ) -> Option<TimeTable<G, I>> {
        let ident = ident.into();
        let previous = self.instances.insert(ident.clone(), table);
        if previous.is_some() {
            log::warn!("Time table '{}' registered twice, replacing", ident);
        }
        previous
    }

    pub fn get(&self, ident: &str) -> Option<&TimeTable<G, I>> {
        self.instances.get(ident)
    }

    pub fn get_mut(&mut self, ident: &str) -> Option<&mut TimeTable<G, I>> {
        self.instances.get_mut(ident)
    }

    /// Instance for an identifier the host registered itself.
    ///
    /// # Panics
    ///
    /// Panics if `ident` was never registered. Looking up an unknown
    /// instance is a wiring bug in the host, not a runtime condition.
    pub fn instance_mut(&mut self, ident: &str) -> &mut TimeTable<G, I> {
        match self.instances.get_mut(ident) {
            Some(table) => table,
            None => panic!("time table '{}' is not registered", ident),
        }
    }

    pub fn remove(&mut self, ident: &str) -> Option<TimeTable<G, I>> {
        self.instances.remove(ident)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Registered identifiers, sorted.
    pub fn idents(&self) -> Vec<&str> {
        let mut idents: Vec<&str> = self.instances.keys().map(String::as_str).collect();
        idents.sort_unstable();
        idents
    }
}
