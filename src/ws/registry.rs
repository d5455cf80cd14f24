use indexmap::IndexMap;

use crate::models::{ConnId, HubError, Session};
use super::palette::ColorAllocator;

/// Live sessions keyed by connection id, kept in join order
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: IndexMap<ConnId, Session>,
    colors: ColorAllocator,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session for a freshly opened connection.
    ///
    /// The display name counts the sessions live at join time, so names can repeat after
    /// someone leaves. The color comes from the round-robin allocator.
    pub fn create(&mut self, id: ConnId) -> Result<Session, HubError> {
        if self.sessions.contains_key(&id) {
            return Err(HubError::DuplicateSession(id));
        }

        let session = Session {
            id,
            display_name: format!("User {}", self.sessions.len() + 1),
            color: self.colors.next_color().to_string(),
            cursor_offset: 0,
        };
        self.sessions.insert(id, session.clone());
        Ok(session)
    }

    pub fn get(&self, id: &ConnId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn contains(&self, id: &ConnId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Overwrite the cursor offset, returning the updated session if it exists.
    pub fn update_cursor(&mut self, id: &ConnId, offset: i64) -> Option<&Session> {
        let session = self.sessions.get_mut(id)?;
        session.cursor_offset = offset;
        Some(session)
    }

    pub fn remove(&mut self, id: &ConnId) -> Option<Session> {
        self.sessions.shift_remove(id)
    }

    /// Owned snapshot of every live session in join order
    pub fn list_all(&self) -> Vec<Session> {
        self.sessions.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Number of sessions ever created
    pub fn joins_total(&self) -> u64 {
        self.colors.issued()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::palette::PALETTE;
    use uuid::Uuid;

    #[test]
    fn create_assigns_name_color_and_zero_cursor() {
        let mut registry = SessionRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let first = registry.create(a).unwrap();
        let second = registry.create(b).unwrap();

        assert_eq!(first.id, a);
        assert_eq!(first.display_name, "User 1");
        assert_eq!(first.color, PALETTE[0]);
        assert_eq!(first.cursor_offset, 0);
        assert_eq!(second.display_name, "User 2");
        assert_eq!(second.color, PALETTE[1]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut registry = SessionRegistry::new();
        let a = Uuid::new_v4();
        registry.create(a).unwrap();

        assert_eq!(registry.create(a), Err(HubError::DuplicateSession(a)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.joins_total(), 1);
    }

    #[test]
    fn names_follow_live_count_and_colors_follow_join_count() {
        let mut registry = SessionRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        registry.create(a).unwrap();
        registry.create(b).unwrap();
        registry.remove(&a);
        let third = registry.create(c).unwrap();

        // Two live before c joined, so the name is reused; the color is not.
        assert_eq!(third.display_name, "User 2");
        assert_eq!(third.color, PALETTE[2]);
    }

    #[test]
    fn colors_wrap_past_palette() {
        let mut registry = SessionRegistry::new();
        let sessions: Vec<_> = (0..PALETTE.len() + 1)
            .map(|_| registry.create(Uuid::new_v4()).unwrap())
            .collect();

        assert_eq!(sessions[PALETTE.len()].color, sessions[0].color);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut registry = SessionRegistry::new();
        let ghost = Uuid::new_v4();

        assert!(registry.get(&ghost).is_none());
        assert!(registry.update_cursor(&ghost, 12).is_none());
        assert!(registry.remove(&ghost).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn update_cursor_accepts_any_offset() {
        let mut registry = SessionRegistry::new();
        let a = Uuid::new_v4();
        registry.create(a).unwrap();

        assert_eq!(registry.update_cursor(&a, 42).map(|s| s.cursor_offset), Some(42));
        assert_eq!(registry.update_cursor(&a, -7).map(|s| s.cursor_offset), Some(-7));
        assert_eq!(registry.get(&a).unwrap().cursor_offset, -7);
    }

    #[test]
    fn list_is_a_detached_snapshot_in_join_order() {
        let mut registry = SessionRegistry::new();
        let ids: Vec<_> = (0..3).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            registry.create(*id).unwrap();
        }
        registry.remove(&ids[1]);

        let snapshot = registry.list_all();
        registry.update_cursor(&ids[0], 99);

        let listed: Vec<_> = snapshot.iter().map(|s| s.id).collect();
        assert_eq!(listed, vec![ids[0], ids[2]]);
        assert_eq!(snapshot[0].cursor_offset, 0);
    }
}
