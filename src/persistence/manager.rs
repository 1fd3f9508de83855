//! Slot reads/writes and autosave rotation

use super::{
    Clock, KeyValueStore, PersistenceConfig, PersistenceError, SlotEntry, SlotId, SlotStatus,
};
use crate::engine::{RestoreError, StoryEngine};

/// Owns the key-value store and knows the key layout
///
/// Keys:
/// - `<namespace>_save_<slot>` → engine state as JSON
/// - `<namespace>_save_timestamp_<slot>` → `"<sceneId>\n(<date-time>)"`
pub struct SaveManager<S, C> {
    config: PersistenceConfig,
    store: S,
    clock: C,
}

impl<S: KeyValueStore, C: Clock> SaveManager<S, C> {
    pub fn new(config: PersistenceConfig, store: S, clock: C) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Key holding a slot's serialized state
    pub fn state_key(&self, slot: SlotId) -> String {
        format!("{}_save_{}", self.config.namespace, slot)
    }

    /// Key holding a slot's display label
    pub fn label_key(&self, slot: SlotId) -> String {
        format!("{}_save_timestamp_{}", self.config.namespace, slot)
    }

    /// Fail unless the slot exists under the current configuration
    pub fn check_slot(&self, slot: SlotId) -> Result<(), PersistenceError> {
        let in_range = match slot {
            SlotId::Numbered(i) => i < self.config.max_slots,
            SlotId::Auto(i) => i < self.config.max_auto_slots,
            SlotId::Quick => true,
        };
        if in_range {
            Ok(())
        } else {
            Err(PersistenceError::SlotOutOfRange(slot))
        }
    }

    /// Stored entry for a slot, `None` if empty
    ///
    /// Empty strings count as absent: older builds cleared slots that way.
    pub fn read_slot(&self, slot: SlotId) -> Option<SlotEntry> {
        let state = self.store.get(&self.state_key(slot)).filter(|s| !s.is_empty())?;
        let label = self.store.get(&self.label_key(slot)).unwrap_or_default();
        Some(SlotEntry { state, label })
    }

    pub fn is_occupied(&self, slot: SlotId) -> bool {
        self.read_slot(slot).is_some()
    }

    pub fn status(&self, slot: SlotId) -> SlotStatus {
        match self.read_slot(slot) {
            Some(entry) => SlotStatus {
                slot,
                occupied: true,
                label: Some(entry.label),
            },
            None => SlotStatus::empty(slot),
        }
    }

    /// Status of manual slots `0..max_slots` followed by `a0..a{max_auto_slots - 1}`
    ///
    /// Read-only: never touches the store's contents.
    pub fn populate_save_slots(&self, max_slots: u32, max_auto_slots: u32) -> Vec<SlotStatus> {
        (0..max_slots)
            .map(SlotId::Numbered)
            .chain((0..max_auto_slots).map(SlotId::Auto))
            .map(|slot| self.status(slot))
            .collect()
    }

    /// [`populate_save_slots`](Self::populate_save_slots) with the configured counts
    pub fn slot_statuses(&self) -> Vec<SlotStatus> {
        self.populate_save_slots(self.config.max_slots, self.config.max_auto_slots)
    }

    /// Write state and label together
    fn write_entry(&mut self, slot: SlotId, entry: &SlotEntry) -> Result<(), PersistenceError> {
        let state_key = self.state_key(slot);
        let label_key = self.label_key(slot);
        let previous = self.read_slot(slot);
        self.store.set(&state_key, &entry.state)?;
        if let Err(e) = self.store.set(&label_key, &entry.label) {
            // The label key was not touched, so putting the old state back
            // restores the slot exactly
            let rollback = match &previous {
                Some(old) => self.store.set(&state_key, &old.state),
                None => self.store.remove(&state_key),
            };
            if let Err(undo) = rollback {
                log::error!("Rollback of slot {slot} failed: {undo}");
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn clear_entry(&mut self, slot: SlotId) -> Result<(), PersistenceError> {
        let state_key = self.state_key(slot);
        let label_key = self.label_key(slot);
        self.store.remove(&state_key)?;
        self.store.remove(&label_key)?;
        Ok(())
    }

    /// Serialize the engine's current state with a fresh label
    fn snapshot<E: StoryEngine>(&self, engine: &E) -> Result<SlotEntry, PersistenceError> {
        let state = engine.exportable_state()?;
        let state = serde_json::to_string(&state)?;
        let label = format!("{}\n({})", engine.scene_id(), self.clock.now_label());
        Ok(SlotEntry { state, label })
    }

    /// Save the engine's state into a slot, overwriting whatever was there
    pub fn save_slot<E: StoryEngine>(
        &mut self,
        slot: SlotId,
        engine: &E,
    ) -> Result<(), PersistenceError> {
        self.check_slot(slot)?;
        let entry = self.snapshot(engine)?;
        self.write_entry(slot, &entry)?;
        log::info!("Saved slot {slot} ({} bytes)", entry.state.len());
        Ok(())
    }

    /// Restore the engine from a slot
    pub fn load_slot<E: StoryEngine>(
        &self,
        slot: SlotId,
        engine: &mut E,
    ) -> Result<(), PersistenceError> {
        self.check_slot(slot)?;
        let entry = self
            .read_slot(slot)
            .ok_or(PersistenceError::SlotEmpty(slot))?;

        let restore_err = |source: RestoreError| PersistenceError::Restore { slot, source };
        let state = serde_json::from_str(&entry.state)
            .map_err(|e| restore_err(RestoreError::Malformed(e)))?;
        engine.set_state(state).map_err(restore_err)?;

        log::info!("Loaded slot {slot}");
        Ok(())
    }

    /// Clear a slot. Fails with `SlotEmpty` (and changes nothing) if already empty.
    pub fn delete_slot(&mut self, slot: SlotId) -> Result<(), PersistenceError> {
        self.check_slot(slot)?;
        if !self.is_occupied(slot) {
            return Err(PersistenceError::SlotEmpty(slot));
        }
        self.clear_entry(slot)?;
        log::info!("Deleted slot {slot}");
        Ok(())
    }

    pub fn quick_save<E: StoryEngine>(&mut self, engine: &E) -> Result<(), PersistenceError> {
        self.save_slot(SlotId::Quick, engine)
    }

    pub fn quick_load<E: StoryEngine>(&self, engine: &mut E) -> Result<(), PersistenceError> {
        self.load_slot(SlotId::Quick, engine)
    }

    /// Shift the autosave chain down one place and write a new `a0`
    ///
    /// The snapshot is taken before rotating so a failed export leaves the
    /// chain untouched. Does nothing when the chain depth is 0.
    pub fn autosave<E: StoryEngine>(&mut self, engine: &E) -> Result<(), PersistenceError> {
        if self.config.max_auto_slots == 0 {
            log::debug!("Autosave disabled");
            return Ok(());
        }
        let entry = self.snapshot(engine)?;
        self.rotate_autosaves()?;
        self.write_entry(SlotId::Auto(0), &entry)?;
        log::debug!("Autosaved at {}", engine.scene_id());
        Ok(())
    }

    /// `a{i}` → `a{i+1}` for i from depth-2 down to 0, empties included
    fn rotate_autosaves(&mut self) -> Result<(), PersistenceError> {
        let depth = self.config.max_auto_slots;
        for i in (0..depth.saturating_sub(1)).rev() {
            let (from, to) = (SlotId::Auto(i), SlotId::Auto(i + 1));
            match self.read_slot(from) {
                Some(entry) => self.write_entry(to, &entry)?,
                None => self.clear_entry(to)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ExportError, InMemoryEngine};
    use crate::persistence::{FixedClock, MemoryStore, StoreError};
    use proptest::prelude::*;

    fn manager() -> SaveManager<MemoryStore, FixedClock> {
        SaveManager::new(
            PersistenceConfig::for_story("TestStory", "build"),
            MemoryStore::new(),
            FixedClock::new("Jan 1, 2026, 9:00:00 AM"),
        )
    }

    fn state_at(m: &SaveManager<MemoryStore, FixedClock>, slot: SlotId) -> Option<serde_json::Value> {
        m.read_slot(slot)
            .map(|e| serde_json::from_str(&e.state).unwrap())
    }

    #[test]
    fn test_key_layout() {
        let m = manager();
        assert_eq!(m.state_key(SlotId::Numbered(3)), "TestStory_build_save_3");
        assert_eq!(m.label_key(SlotId::Auto(0)), "TestStory_build_save_timestamp_a0");
        assert_eq!(m.state_key(SlotId::Quick), "TestStory_build_save_q");
    }

    #[test]
    fn test_save_writes_state_and_label() {
        let mut m = manager();
        let engine = InMemoryEngine::new("library");
        m.save_slot(SlotId::Numbered(0), &engine).unwrap();

        let entry = m.read_slot(SlotId::Numbered(0)).unwrap();
        assert_eq!(entry.label, "library\n(Jan 1, 2026, 9:00:00 AM)");
        assert_eq!(m.store().len(), 2);
    }

    #[test]
    fn test_save_then_load_restores_state() {
        let mut m = manager();
        let mut engine = InMemoryEngine::new("intro");
        engine.set_quality("trust", 3.0);
        m.save_slot(SlotId::Numbered(5), &engine).unwrap();

        engine.goto("archive");
        engine.set_quality("trust", 0.0);
        m.load_slot(SlotId::Numbered(5), &mut engine).unwrap();

        assert_eq!(engine.scene_id(), "intro");
        assert_eq!(engine.quality("trust"), Some(3.0));
    }

    #[test]
    fn test_load_empty_slot() {
        let m = manager();
        let mut engine = InMemoryEngine::new("intro");
        let err = m.load_slot(SlotId::Numbered(1), &mut engine).unwrap_err();
        assert!(matches!(err, PersistenceError::SlotEmpty(SlotId::Numbered(1))));
        assert_eq!(err.user_message(), "No save available");
    }

    #[test]
    fn test_load_corrupt_slot_is_restore_error() {
        let mut m = manager();
        let key = m.state_key(SlotId::Numbered(2));
        m.store_mut().set(&key, "{not json").unwrap();

        let mut engine = InMemoryEngine::new("intro");
        let err = m.load_slot(SlotId::Numbered(2), &mut engine).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Restore {
                source: RestoreError::Malformed(_),
                ..
            }
        ));
        assert_eq!(engine.scene_id(), "intro");
    }

    #[test]
    fn test_load_rejected_by_engine() {
        let mut m = manager();
        let key = m.state_key(SlotId::Quick);
        m.store_mut().set(&key, "42").unwrap();

        let mut engine = InMemoryEngine::new("intro");
        let err = m.quick_load(&mut engine).unwrap_err();
        assert!(matches!(
            err,
            PersistenceError::Restore {
                source: RestoreError::Rejected(_),
                ..
            }
        ));
        assert_eq!(err.user_message(), "Could not load save");
    }

    #[test]
    fn test_delete_then_status_empty() {
        let mut m = manager();
        let engine = InMemoryEngine::new("intro");
        m.save_slot(SlotId::Numbered(4), &engine).unwrap();
        assert!(m.status(SlotId::Numbered(4)).occupied);

        m.delete_slot(SlotId::Numbered(4)).unwrap();
        let status = m.status(SlotId::Numbered(4));
        assert!(!status.occupied);
        assert_eq!(status.label, None);
        assert!(m.store().is_empty());
    }

    #[test]
    fn test_delete_empty_slot_is_noop_error() {
        let mut m = manager();
        let engine = InMemoryEngine::new("intro");
        m.save_slot(SlotId::Numbered(0), &engine).unwrap();
        let before = m.store().clone();

        let err = m.delete_slot(SlotId::Numbered(1)).unwrap_err();
        assert!(matches!(err, PersistenceError::SlotEmpty(_)));
        assert_eq!(m.store(), &before);
    }

    #[test]
    fn test_legacy_empty_string_is_absent() {
        let mut m = manager();
        let (sk, lk) = (m.state_key(SlotId::Numbered(0)), m.label_key(SlotId::Numbered(0)));
        m.store_mut().set(&sk, "").unwrap();
        m.store_mut().set(&lk, "").unwrap();

        assert!(!m.is_occupied(SlotId::Numbered(0)));
        assert!(matches!(
            m.delete_slot(SlotId::Numbered(0)),
            Err(PersistenceError::SlotEmpty(_))
        ));
    }

    #[test]
    fn test_autosave_rotation_depth_two() {
        let mut m = manager();
        let mut engine = InMemoryEngine::new("x");
        m.autosave(&engine).unwrap();
        engine.goto("y");
        m.autosave(&engine).unwrap();
        assert_eq!(state_at(&m, SlotId::Auto(0)).unwrap()["sceneId"], "y");
        assert_eq!(state_at(&m, SlotId::Auto(1)).unwrap()["sceneId"], "x");

        engine.goto("z");
        m.autosave(&engine).unwrap();
        assert_eq!(state_at(&m, SlotId::Auto(0)).unwrap()["sceneId"], "z");
        assert_eq!(state_at(&m, SlotId::Auto(1)).unwrap()["sceneId"], "y");
        // x fell off the end; nothing beyond the chain depth is written
        assert!(m.store().get(&m.state_key(SlotId::Auto(2))).is_none());
    }

    #[test]
    fn test_autosave_labels_move_with_state() {
        let mut m = manager();
        let mut engine = InMemoryEngine::new("first");
        m.autosave(&engine).unwrap();
        engine.goto("second");
        m.autosave(&engine).unwrap();

        let a1 = m.read_slot(SlotId::Auto(1)).unwrap();
        assert!(a1.label.starts_with("first\n"));
    }

    #[test]
    fn test_first_autosave_leaves_a1_empty() {
        let mut m = manager();
        m.autosave(&InMemoryEngine::new("intro")).unwrap();
        assert!(m.is_occupied(SlotId::Auto(0)));
        assert!(!m.is_occupied(SlotId::Auto(1)));
    }

    #[test]
    fn test_autosave_rotation_depth_three_shifts_empties() {
        let mut m = SaveManager::new(
            PersistenceConfig::default().with_slots(8, 3),
            MemoryStore::new(),
            FixedClock::new("t"),
        );
        let mut engine = InMemoryEngine::new("x");
        m.autosave(&engine).unwrap();
        engine.goto("y");
        m.autosave(&engine).unwrap();
        engine.goto("z");
        m.autosave(&engine).unwrap();
        let scenes: Vec<_> = (0..3)
            .map(|i| state_at(&m, SlotId::Auto(i)).unwrap()["sceneId"].clone())
            .collect();
        assert_eq!(scenes, ["z", "y", "x"]);

        // A hole in the chain moves down instead of duplicating the entry below it
        m.delete_slot(SlotId::Auto(0)).unwrap();
        engine.goto("w");
        m.autosave(&engine).unwrap();
        assert_eq!(state_at(&m, SlotId::Auto(0)).unwrap()["sceneId"], "w");
        assert!(!m.is_occupied(SlotId::Auto(1)));
        assert_eq!(state_at(&m, SlotId::Auto(2)).unwrap()["sceneId"], "y");
    }

    #[test]
    fn test_autosave_disabled_at_depth_zero() {
        let mut m = SaveManager::new(
            PersistenceConfig::default().with_slots(8, 0),
            MemoryStore::new(),
            FixedClock::new("t"),
        );
        m.autosave(&InMemoryEngine::new("intro")).unwrap();
        assert!(m.store().is_empty());
    }

    struct BrokenEngine;

    impl StoryEngine for BrokenEngine {
        type State = serde_json::Value;

        fn exportable_state(&self) -> Result<Self::State, ExportError> {
            Err(ExportError("cyclic object".into()))
        }

        fn set_state(&mut self, _state: Self::State) -> Result<(), RestoreError> {
            Ok(())
        }

        fn scene_id(&self) -> String {
            "broken".into()
        }
    }

    #[test]
    fn test_failed_export_leaves_chain_untouched() {
        let mut m = manager();
        m.autosave(&InMemoryEngine::new("x")).unwrap();
        let before = m.store().clone();

        let err = m.autosave(&BrokenEngine).unwrap_err();
        assert!(matches!(err, PersistenceError::Export(_)));
        assert_eq!(err.user_message(), "Save failed");
        assert_eq!(m.store(), &before);
    }

    struct FullStore {
        inner: MemoryStore,
        quota: usize,
    }

    impl KeyValueStore for FullStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.inner.get(key).is_none() && self.inner.len() >= self.quota {
                return Err(StoreError("QuotaExceededError".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_quota_failure_keeps_slot_consistent() {
        let store = FullStore {
            inner: MemoryStore::new(),
            quota: 1,
        };
        let mut m = SaveManager::new(PersistenceConfig::default(), store, FixedClock::new("t"));
        let err = m
            .save_slot(SlotId::Numbered(0), &InMemoryEngine::new("intro"))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Storage(_)));
        // State written, label refused: the state is rolled back
        assert!(!m.is_occupied(SlotId::Numbered(0)));
        assert!(m.store().inner.is_empty());
    }

    /// Accepts state writes but refuses every label write
    struct NoLabelStore {
        inner: MemoryStore,
        refuse_labels: bool,
    }

    impl KeyValueStore for NoLabelStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.refuse_labels && key.contains("_save_timestamp_") {
                return Err(StoreError("QuotaExceededError".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_overwrite_keeps_previous_save() {
        let store = NoLabelStore {
            inner: MemoryStore::new(),
            refuse_labels: false,
        };
        let mut m = SaveManager::new(PersistenceConfig::default(), store, FixedClock::new("t"));
        m.save_slot(SlotId::Numbered(0), &InMemoryEngine::new("precious"))
            .unwrap();
        let before = m.read_slot(SlotId::Numbered(0));

        m.store_mut().refuse_labels = true;
        let err = m
            .save_slot(SlotId::Numbered(0), &InMemoryEngine::new("newer"))
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Storage(_)));
        assert_eq!(m.read_slot(SlotId::Numbered(0)), before);
        assert!(before.unwrap().label.starts_with("precious\n"));
    }

    #[test]
    fn test_out_of_range_slots() {
        let mut m = manager();
        let engine = InMemoryEngine::new("intro");
        assert!(matches!(
            m.save_slot(SlotId::Numbered(8), &engine),
            Err(PersistenceError::SlotOutOfRange(_))
        ));
        assert!(matches!(
            m.delete_slot(SlotId::Auto(2)),
            Err(PersistenceError::SlotOutOfRange(_))
        ));
        assert!(m.store().is_empty());
    }

    #[test]
    fn test_quick_slot_independent_of_numbered() {
        let mut m = manager();
        let mut engine = InMemoryEngine::new("quick");
        m.quick_save(&engine).unwrap();
        let quick_before = m.read_slot(SlotId::Quick);

        engine.goto("slot-zero");
        m.save_slot(SlotId::Numbered(0), &engine).unwrap();
        m.autosave(&engine).unwrap();

        assert_eq!(m.read_slot(SlotId::Quick), quick_before);
        assert!(m.slot_statuses().iter().all(|s| s.slot != SlotId::Quick));
    }

    #[test]
    fn test_populate_lists_numbered_then_auto() {
        let mut m = manager();
        m.save_slot(SlotId::Numbered(1), &InMemoryEngine::new("intro"))
            .unwrap();
        let statuses = m.populate_save_slots(3, 2);
        let slots: Vec<_> = statuses.iter().map(|s| s.slot.to_string()).collect();
        assert_eq!(slots, ["0", "1", "2", "a0", "a1"]);
        assert!(statuses[1].occupied);
        assert_eq!(statuses.iter().filter(|s| s.occupied).count(), 1);
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let mut store = MemoryStore::new();
        {
            let mut a = SaveManager::new(
                PersistenceConfig::for_story("A", "1"),
                &mut store,
                FixedClock::new("t"),
            );
            a.save_slot(SlotId::Numbered(0), &InMemoryEngine::new("a"))
                .unwrap();
        }
        let b = SaveManager::new(
            PersistenceConfig::for_story("B", "1"),
            &mut store,
            FixedClock::new("t"),
        );
        assert!(!b.is_occupied(SlotId::Numbered(0)));
    }

    fn any_slot() -> impl Strategy<Value = SlotId> {
        prop_oneof![
            (0u32..8).prop_map(SlotId::Numbered),
            (0u32..2).prop_map(SlotId::Auto),
            Just(SlotId::Quick),
        ]
    }

    proptest! {
        #[test]
        fn prop_save_load_round_trip(
            slot in any_slot(),
            scene in "[a-z_]{1,12}",
            value in -1_000_000i64..1_000_000,
        ) {
            let mut m = manager();
            let mut engine = InMemoryEngine::new(&scene);
            engine.set_quality("q", value as f64);
            let expected = engine.state().clone();
            m.save_slot(slot, &engine).unwrap();

            let mut other = InMemoryEngine::new("elsewhere");
            m.load_slot(slot, &mut other).unwrap();
            prop_assert_eq!(other.state(), &expected);
        }

        #[test]
        fn prop_populate_is_read_only(
            saved in proptest::collection::vec(any_slot(), 0..6),
            calls in 1usize..5,
        ) {
            let mut m = manager();
            let engine = InMemoryEngine::new("intro");
            for slot in &saved {
                m.save_slot(*slot, &engine).unwrap();
            }
            let before = m.store().clone();
            for _ in 0..calls {
                let statuses = m.populate_save_slots(8, 2);
                prop_assert_eq!(statuses.len(), 10);
            }
            prop_assert_eq!(m.store(), &before);
        }

        #[test]
        fn prop_delete_reports_empty(slot in any_slot()) {
            let mut m = manager();
            m.save_slot(slot, &InMemoryEngine::new("intro")).unwrap();
            m.delete_slot(slot).unwrap();
            prop_assert!(!m.status(slot).occupied);
        }
    }
}
