//! Room membership registry.
//!
//! Pure bookkeeping, owned by the broker: which connection is in which room,
//! with a reverse index so a departing connection can be removed from every
//! room without scanning them all. Rooms exist only while they have members.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::{ConnectionId, RoomName};

/// Result of a join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The room did not exist and was created
    Created,
    Joined,
    AlreadyMember,
}

/// Result of a leave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left,
    /// The last member left and the room was deleted
    RoomDeleted,
    NotMember,
}

/// Joining would create a room beyond the ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomLimitReached(pub usize);

#[derive(Debug, Default)]
pub struct Registry {
    rooms: HashMap<RoomName, HashSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<RoomName>>,
    max_rooms: Option<usize>,
}

impl Registry {
    pub fn new(max_rooms: Option<usize>) -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            max_rooms,
        }
    }

    /// Add `id` to `room`, creating the room lazily. Idempotent.
    pub fn join(
        &mut self,
        id: &ConnectionId,
        room: &RoomName,
    ) -> Result<JoinOutcome, RoomLimitReached> {
        let outcome = match self.rooms.get_mut(room) {
            Some(members) => {
                if !members.insert(id.clone()) {
                    return Ok(JoinOutcome::AlreadyMember);
                }
                JoinOutcome::Joined
            }
            None => {
                if let Some(max) = self.max_rooms
                    && self.rooms.len() >= max
                {
                    return Err(RoomLimitReached(max));
                }
                self.rooms
                    .insert(room.clone(), HashSet::from([id.clone()]));
                JoinOutcome::Created
            }
        };

        self.memberships
            .entry(id.clone())
            .or_default()
            .insert(room.clone());
        Ok(outcome)
    }

    /// Remove `id` from `room`, deleting the room once empty.
    pub fn leave(&mut self, id: &ConnectionId, room: &RoomName) -> LeaveOutcome {
        let Some(members) = self.rooms.get_mut(room) else {
            return LeaveOutcome::NotMember;
        };
        if !members.remove(id) {
            return LeaveOutcome::NotMember;
        }
        let emptied = members.is_empty();
        if emptied {
            self.rooms.remove(room);
        }

        if let Some(rooms) = self.memberships.get_mut(id) {
            rooms.remove(room);
            if rooms.is_empty() {
                self.memberships.remove(id);
            }
        }

        if emptied {
            LeaveOutcome::RoomDeleted
        } else {
            LeaveOutcome::Left
        }
    }

    /// Remove `id` from every room it belongs to.
    ///
    /// Returns the rooms deleted because `id` was their last member.
    pub fn remove_everywhere(&mut self, id: &ConnectionId) -> Vec<RoomName> {
        let Some(rooms) = self.memberships.remove(id) else {
            return Vec::new();
        };

        let mut deleted = Vec::new();
        for room in rooms {
            if let Some(members) = self.rooms.get_mut(&room) {
                members.remove(id);
                if members.is_empty() {
                    self.rooms.remove(&room);
                    deleted.push(room);
                }
            }
        }
        deleted
    }

    /// Members of `room`; empty when the room does not exist.
    pub fn members(&self, room: &RoomName) -> impl Iterator<Item = &ConnectionId> {
        self.rooms.get(room).into_iter().flatten()
    }

    /// Rooms `id` belongs to, sorted by name.
    pub fn rooms_of(&self, id: &ConnectionId) -> BTreeSet<RoomName> {
        self.memberships
            .get(id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains_room(&self, room: &RoomName) -> bool {
        self.rooms.contains_key(room)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn rooms(&self) -> impl Iterator<Item = (&RoomName, &HashSet<ConnectionId>)> {
        self.rooms.iter()
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
        self.memberships.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ConnectionId {
        ConnectionId::new(value.to_string()).unwrap()
    }

    fn room(value: &str) -> RoomName {
        RoomName::new(value.to_string()).unwrap()
    }

    fn sorted_members(registry: &Registry, name: &RoomName) -> Vec<String> {
        let mut members: Vec<String> = registry
            .members(name)
            .map(|id| id.as_str().to_string())
            .collect();
        members.sort();
        members
    }

    #[test]
    fn test_join_creates_room_lazily() {
        // テスト項目: 存在しないルームへの参加でルームが作成される
        // given (前提条件):
        let mut registry = Registry::default();

        // when (操作):
        let first = registry.join(&id("alice"), &room("lobby"));
        let second = registry.join(&id("bob"), &room("lobby"));

        // then (期待する結果):
        assert_eq!(first, Ok(JoinOutcome::Created));
        assert_eq!(second, Ok(JoinOutcome::Joined));
        assert_eq!(sorted_members(&registry, &room("lobby")), vec!["alice", "bob"]);
    }

    #[test]
    fn test_join_is_idempotent() {
        // テスト項目: 同じルームへの二重参加は状態を変えない
        // given (前提条件):
        let mut registry = Registry::default();
        registry.join(&id("alice"), &room("lobby")).unwrap();

        // when (操作):
        let result = registry.join(&id("alice"), &room("lobby"));

        // then (期待する結果):
        assert_eq!(result, Ok(JoinOutcome::AlreadyMember));
        assert_eq!(sorted_members(&registry, &room("lobby")), vec!["alice"]);
    }

    #[test]
    fn test_last_leave_deletes_room_and_rejoin_starts_fresh() {
        // テスト項目: 最後のメンバーが抜けるとルームが削除され、再参加時は空のルームから始まる
        // given (前提条件):
        let mut registry = Registry::default();
        registry.join(&id("alice"), &room("lobby")).unwrap();
        registry.join(&id("bob"), &room("lobby")).unwrap();

        // when (操作):
        let first = registry.leave(&id("alice"), &room("lobby"));
        let last = registry.leave(&id("bob"), &room("lobby"));
        let rejoin = registry.join(&id("carol"), &room("lobby"));

        // then (期待する結果):
        assert_eq!(first, LeaveOutcome::Left);
        assert_eq!(last, LeaveOutcome::RoomDeleted);
        assert_eq!(rejoin, Ok(JoinOutcome::Created));
        assert_eq!(sorted_members(&registry, &room("lobby")), vec!["carol"]);
    }

    #[test]
    fn test_leave_is_idempotent_and_tolerates_missing_rooms() {
        // テスト項目: 未参加・存在しないルームからの退出は何もしない
        // given (前提条件):
        let mut registry = Registry::default();
        registry.join(&id("alice"), &room("lobby")).unwrap();
        registry.join(&id("bob"), &room("lobby")).unwrap();
        registry.leave(&id("alice"), &room("lobby"));

        // when (操作):
        let twice = registry.leave(&id("alice"), &room("lobby"));
        let missing = registry.leave(&id("alice"), &room("nowhere"));

        // then (期待する結果):
        assert_eq!(twice, LeaveOutcome::NotMember);
        assert_eq!(missing, LeaveOutcome::NotMember);
        assert_eq!(sorted_members(&registry, &room("lobby")), vec!["bob"]);
        assert!(registry.rooms_of(&id("alice")).is_empty());
    }

    #[test]
    fn test_remove_everywhere_cleans_every_room() {
        // テスト項目: 接続の削除で全ルームから取り除かれ、空になったルームは削除される
        // given (前提条件):
        let mut registry = Registry::default();
        registry.join(&id("alice"), &room("lobby")).unwrap();
        registry.join(&id("alice"), &room("solo")).unwrap();
        registry.join(&id("bob"), &room("lobby")).unwrap();

        // when (操作):
        let deleted = registry.remove_everywhere(&id("alice"));

        // then (期待する結果):
        assert_eq!(deleted, vec![room("solo")]);
        assert!(!registry.contains_room(&room("solo")));
        assert_eq!(sorted_members(&registry, &room("lobby")), vec!["bob"]);
        assert!(registry.rooms_of(&id("alice")).is_empty());
        assert!(registry.remove_everywhere(&id("alice")).is_empty());
    }

    #[test]
    fn test_room_limit_blocks_only_new_rooms() {
        // テスト項目: ルーム数の上限は新規作成のみを制限し、既存ルームへの参加は許可される
        // given (前提条件):
        let mut registry = Registry::new(Some(1));
        registry.join(&id("alice"), &room("lobby")).unwrap();

        // when (操作):
        let new_room = registry.join(&id("bob"), &room("other"));
        let existing = registry.join(&id("bob"), &room("lobby"));

        // then (期待する結果):
        assert_eq!(new_room, Err(RoomLimitReached(1)));
        assert_eq!(existing, Ok(JoinOutcome::Joined));
        assert_eq!(registry.room_count(), 1);
        assert!(registry.rooms_of(&id("bob")).contains(&room("lobby")));
    }

    #[test]
    fn test_members_of_missing_room_is_empty() {
        // テスト項目: 存在しないルームのメンバーは空
        let registry = Registry::default();
        assert_eq!(registry.members(&room("ghost")).count(), 0);
    }
}
