use thiserror::Error;

use crate::profile::{ProfileField, ProfileId, ServerProfile};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("profile index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Clone)]
struct Entry {
    id: ProfileId,
    profile: ServerProfile,
}

/// Ordered in-memory mirror of the persisted profile list.
///
/// Position `i` here is position `i` in the persisted list and the `i`-th
/// rendered row whenever no drag or write is in progress.
#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    entries: Vec<Entry>,
    next_id: u64,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profiles(profiles: impl IntoIterator<Item = ServerProfile>) -> Self {
        let mut store = Self::new();
        for profile in profiles {
            let id = store.allocate_id();
            store.entries.push(Entry { id, profile });
        }
        store
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert_front(&mut self, profile: ServerProfile) -> ProfileId {
        let id = self.allocate_id();
        self.entries.insert(0, Entry { id, profile });
        id
    }

    pub fn remove_at(&mut self, index: usize) -> Result<(ProfileId, ServerProfile), StoreError> {
        self.check(index)?;
        let entry = self.entries.remove(index);
        Ok((entry.id, entry.profile))
    }

    /// Remove at `from`, then insert at `to`. `from == to` is a no-op.
    pub fn move_to(&mut self, from: usize, to: usize) -> Result<(), StoreError> {
        self.check(from)?;
        self.check(to)?;
        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
        }
        Ok(())
    }

    pub fn update_field(
        &mut self,
        index: usize,
        field: ProfileField,
        value: String,
    ) -> Result<(), StoreError> {
        self.check(index)?;
        self.entries[index].profile.set_field(field, value);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&ServerProfile> {
        self.entries.get(index).map(|entry| &entry.profile)
    }

    pub fn id_at(&self, index: usize) -> Option<ProfileId> {
        self.entries.get(index).map(|entry| entry.id)
    }

    pub fn index_of(&self, id: ProfileId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn by_id(&self, id: ProfileId) -> Option<&ServerProfile> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.profile)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProfileId, &ServerProfile)> {
        self.entries.iter().map(|entry| (entry.id, &entry.profile))
    }

    pub fn ids(&self) -> Vec<ProfileId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }

    pub fn profiles(&self) -> Vec<ServerProfile> {
        self.entries.iter().map(|entry| entry.profile.clone()).collect()
    }

    fn allocate_id(&mut self) -> ProfileId {
        let id = ProfileId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check(&self, index: usize) -> Result<(), StoreError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(StoreError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(store: &ProfileStore) -> Vec<String> {
        store.iter().map(|(_, p)| p.nickname.clone()).collect()
    }

    fn abc() -> ProfileStore {
        ProfileStore::from_profiles(["A", "B", "C"].map(ServerProfile::named))
    }

    #[test]
    fn insert_front_puts_new_profile_first() {
        let mut store = ProfileStore::from_profiles(["A", "B"].map(ServerProfile::named));
        let id = store.insert_front(ServerProfile::named("New"));
        assert_eq!(names(&store), ["New", "A", "B"]);
        assert_eq!(store.index_of(id), Some(0));
    }

    #[test]
    fn move_is_remove_then_insert() {
        let mut store = abc();
        store.move_to(2, 0).unwrap();
        assert_eq!(names(&store), ["C", "A", "B"]);
        store.move_to(0, 2).unwrap();
        assert_eq!(names(&store), ["A", "B", "C"]);
        store.move_to(1, 1).unwrap();
        assert_eq!(names(&store), ["A", "B", "C"]);
    }

    #[test]
    fn ids_follow_profiles_across_moves() {
        let mut store = abc();
        let c = store.id_at(2).unwrap();
        store.move_to(2, 0).unwrap();
        assert_eq!(store.index_of(c), Some(0));
        store.remove_at(0).unwrap();
        assert_eq!(store.index_of(c), None);
    }

    #[test]
    fn out_of_range_is_an_error_not_a_panic() {
        let mut store = abc();
        assert_eq!(
            store.remove_at(3),
            Err(StoreError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert!(store.move_to(0, 3).is_err());
        assert!(
            store
                .update_field(7, ProfileField::Nickname, "x".to_owned())
                .is_err()
        );
        assert_eq!(names(&store), ["A", "B", "C"]);
    }

    #[test]
    fn update_field_edits_in_place() {
        let mut store = abc();
        store
            .update_field(1, ProfileField::UdpEndpoint, "10.0.0.2:20042".to_owned())
            .unwrap();
        assert_eq!(store.get(1).unwrap().udp_endpoint, "10.0.0.2:20042");
        assert_eq!(store.get(1).unwrap().nickname, "B");
    }

    #[test]
    fn matches_reference_model_over_mixed_operations() {
        // Small deterministic LCG so the sequence is reproducible.
        let mut seed: u64 = 0x5eed;
        let mut next = move |bound: usize| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((seed >> 33) as usize) % bound.max(1)
        };

        let mut store = ProfileStore::new();
        let mut model: Vec<String> = Vec::new();
        for step in 0..500 {
            match next(3) {
                0 => {
                    let name = format!("s{step}");
                    store.insert_front(ServerProfile::named(name.clone()));
                    model.insert(0, name);
                }
                1 if !model.is_empty() => {
                    let index = next(model.len());
                    store.remove_at(index).unwrap();
                    model.remove(index);
                }
                2 if !model.is_empty() => {
                    let from = next(model.len());
                    let to = next(model.len());
                    store.move_to(from, to).unwrap();
                    let item = model.remove(from);
                    model.insert(to, item);
                }
                _ => {}
            }
            assert_eq!(names(&store), model, "diverged at step {step}");
        }
    }
}
