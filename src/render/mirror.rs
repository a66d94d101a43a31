//! Scene Mirror: keeps one scene node per materialized entity.
//!
//! Reconciliation is snapshot based. Each pass compares the full entity id
//! set in the store against the registry, so running it twice on an
//! unchanged store mutates nothing.
//!
//! Asset nodes are never despawned. The mirror only remembers which of them
//! have been backed by an entity record, so the visual pass can hide them once
//! that record is deleted.

use super::{BoxSpec, NodeHandle, NodeTag, SceneGraph};
use crate::scene::{EntityId, EntityStore};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<EntityId>,
    pub removed: Vec<EntityId>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct SceneMirror {
    registry: HashMap<EntityId, NodeHandle>,
    matched_assets: HashSet<EntityId>,
}

impl SceneMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile<S: SceneGraph + ?Sized>(
        &mut self,
        store: &EntityStore,
        scene: &mut S,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for (category, entity) in store.iter() {
            if !entity.is_new || self.registry.contains_key(&entity.id) {
                continue;
            }
            let Some(placement) = entity.placement else {
                log::warn!("New {} {} has no placement; not materialized", category, entity.id);
                continue;
            };
            let node = scene.spawn_box(&BoxSpec {
                tag: NodeTag::new(category, entity.id.clone()),
                placement,
                color: entity.color,
            });
            log::info!("Created scene node {:?} for {}", node, entity.id);
            self.registry.insert(entity.id.clone(), node);
            report.created.push(entity.id.clone());
        }

        let live: HashSet<&str> = store.iter().map(|(_, entity)| entity.id.as_str()).collect();
        let mut stale: Vec<EntityId> = self
            .registry
            .keys()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect();
        stale.sort();
        for id in stale {
            let Some(node) = self.registry.remove(&id) else {
                continue;
            };
            if scene.despawn(node) {
                log::info!("Removed scene node {:?} for {}", node, id);
            } else {
                log::warn!("Scene node {:?} for {} was already gone", node, id);
            }
            report.removed.push(id);
        }

        for (node, tag) in scene.nodes() {
            if tag.category.is_some()
                && store.contains(tag.id.as_str())
                && self.registry.get(&tag.id) != Some(&node)
            {
                self.matched_assets.insert(tag.id);
            }
        }

        report
    }

    /// Despawns every mirrored node, e.g. before the scene is torn down.
    pub fn release_all<S: SceneGraph + ?Sized>(&mut self, scene: &mut S) -> usize {
        let count = self.registry.len();
        for (_, node) in self.registry.drain() {
            scene.despawn(node);
        }
        count
    }

    /// Asset-node ids that once had an entity record and no longer do.
    pub fn retired(&self, store: &EntityStore) -> Vec<EntityId> {
        let mut retired: Vec<EntityId> = self
            .matched_assets
            .iter()
            .filter(|id| !store.contains(id.as_str()))
            .cloned()
            .collect();
        retired.sort();
        retired
    }

    pub fn node_for(&self, id: &str) -> Option<NodeHandle> {
        self.registry.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{HeadlessScene, NodeAppearance, RenderConfig};
    use crate::scene::{Category, DetectionSummary, Rgb};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn scene() -> HeadlessScene {
        HeadlessScene::new(RenderConfig {
            width: 8,
            height: 8,
            ..RenderConfig::default()
        })
    }

    fn new_entity_count(store: &EntityStore) -> usize {
        store.iter().filter(|(_, e)| e.is_new).count()
    }

    #[test]
    fn three_walls_then_delete_second() {
        let mut store = EntityStore::new();
        let mut scene = scene();
        let mut mirror = SceneMirror::new();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..3 {
            store.add_wall(Rgb::new(0xcc, 0xcc, 0xcc), &mut rng);
        }
        let report = mirror.reconcile(&store, &mut scene);
        assert_eq!(report.created.len(), 3);
        assert_eq!(mirror.len(), 3);
        assert_eq!(scene.node_count(), 3);

        let second = mirror.node_for("wall_1").unwrap();
        store.remove(Category::Wall, "wall_1");
        let report = mirror.reconcile(&store, &mut scene);
        assert_eq!(report.removed, vec![EntityId::new("wall_1")]);
        assert_eq!(store.list(Category::Wall).len(), 2);
        assert_eq!(mirror.len(), 2);
        assert_eq!(scene.node_count(), 2);
        assert_eq!(scene.release_count(second), 1);

        mirror.reconcile(&store, &mut scene);
        assert_eq!(scene.release_count(second), 1);
    }

    #[test]
    fn reconcile_twice_is_idempotent() {
        let mut store = EntityStore::new();
        let mut scene = scene();
        let mut mirror = SceneMirror::new();
        let mut rng = StdRng::seed_from_u64(5);
        store.add_wall(Rgb::BLACK, &mut rng);
        store.add_wall(Rgb::BLACK, &mut rng);
        mirror.reconcile(&store, &mut scene);

        let before = scene.stats();
        let report = mirror.reconcile(&store, &mut scene);
        assert!(report.is_empty());
        assert_eq!(scene.stats(), before);
    }

    #[test]
    fn original_entities_are_never_materialized_or_removed() {
        let mut store = EntityStore::from_detection(DetectionSummary {
            walls_detected: 2,
            ..Default::default()
        });
        let mut scene = scene();
        let asset_node =
            scene.insert_asset_node(NodeTag::from_name("wall_0"), NodeAppearance::default());
        let mut mirror = SceneMirror::new();
        assert!(mirror.reconcile(&store, &mut scene).is_empty());

        store.remove(Category::Wall, "wall_0");
        assert!(mirror.reconcile(&store, &mut scene).is_empty());
        assert!(scene.tag(asset_node).is_some());
    }

    #[test]
    fn deleted_original_entities_are_reported_retired() {
        let mut store = EntityStore::from_detection(DetectionSummary {
            walls_detected: 2,
            ..Default::default()
        });
        let mut scene = scene();
        for name in ["wall_0", "wall_1", "floor_slab"] {
            scene.insert_asset_node(NodeTag::from_name(name), NodeAppearance::default());
        }
        let mut mirror = SceneMirror::new();
        mirror.reconcile(&store, &mut scene);
        assert!(mirror.retired(&store).is_empty());

        store.remove(Category::Wall, "wall_0");
        let before = scene.stats();
        mirror.reconcile(&store, &mut scene);
        assert_eq!(scene.stats(), before);
        assert_eq!(mirror.retired(&store), vec![EntityId::new("wall_0")]);
    }

    #[test]
    fn removed_new_walls_are_not_retired() {
        let mut store = EntityStore::new();
        let mut scene = scene();
        let mut mirror = SceneMirror::new();
        let mut rng = StdRng::seed_from_u64(3);
        store.add_wall(Rgb::BLACK, &mut rng);
        mirror.reconcile(&store, &mut scene);
        store.remove(Category::Wall, "wall_0");
        mirror.reconcile(&store, &mut scene);
        assert!(mirror.retired(&store).is_empty());
    }

    #[test]
    fn wall_added_and_deleted_before_reconcile_leaves_nothing() {
        let mut store = EntityStore::new();
        let mut scene = scene();
        let mut mirror = SceneMirror::new();
        let mut rng = StdRng::seed_from_u64(9);
        store.add_wall(Rgb::BLACK, &mut rng);
        store.remove(Category::Wall, "wall_0");
        assert!(mirror.reconcile(&store, &mut scene).is_empty());
        assert_eq!(scene.stats().spawned, 0);
    }

    #[test]
    fn random_add_remove_sequences_never_leak() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..20 {
            let mut store = EntityStore::new();
            let mut scene = scene();
            let mut mirror = SceneMirror::new();
            for _ in 0..30 {
                let walls: Vec<EntityId> =
                    store.list(Category::Wall).iter().map(|e| e.id.clone()).collect();
                if walls.is_empty() || rng.gen_bool(0.6) {
                    store.add_wall(Rgb::BLACK, &mut rng);
                } else {
                    let victim = &walls[rng.gen_range(0..walls.len())];
                    store.remove(Category::Wall, victim.as_str());
                }
                mirror.reconcile(&store, &mut scene);

                assert_eq!(mirror.len(), new_entity_count(&store));
                assert_eq!(scene.node_count(), mirror.len());
                for (_, tag) in scene.nodes() {
                    assert!(store.contains(tag.id.as_str()), "leaked node {}", tag.id);
                }
            }
            let stats = scene.stats();
            assert_eq!(stats.geometries_released, stats.despawned);
            assert_eq!(stats.spawned - stats.despawned, mirror.len());
        }
    }

    #[test]
    fn release_all_empties_registry() {
        let mut store = EntityStore::new();
        let mut scene = scene();
        let mut mirror = SceneMirror::new();
        let mut rng = StdRng::seed_from_u64(1);
        store.add_wall(Rgb::BLACK, &mut rng);
        mirror.reconcile(&store, &mut scene);
        assert_eq!(mirror.release_all(&mut scene), 1);
        assert!(mirror.is_empty());
        assert_eq!(scene.node_count(), 0);
    }
}
