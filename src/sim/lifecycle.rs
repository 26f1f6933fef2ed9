//! Enemy lifecycle: deferred actions and the live-enemy roster
//!
//! Nothing outside the tick mutates the world. Delayed work (the death grace
//! period, the spawn timer) is queued here keyed by tick and drained by the
//! game loop on the simulation thread.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use super::enemy::{Enemy, EnemyId};
use super::physics::{PhysicsWorld, ShapeHandle};

/// Work due at a later tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RemoveEnemy(EnemyId),
    /// One firing of the spawn timer; stale generations are dropped
    Spawn { generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled {
    due: u64,
    /// Insertion order breaks ties so equal-tick actions run FIFO
    seq: u64,
    action: Action,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Tick-keyed priority queue with one cancellable periodic spawn timer
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: u64,
    seq: u64,
    queue: BinaryHeap<Reverse<Scheduled>>,
    spawn_generation: u64,
    spawn_period: Option<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn advance(&mut self) {
        self.now += 1;
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Period of the running spawn timer, if any
    pub fn spawn_period(&self) -> Option<u64> {
        self.spawn_period
    }

    pub fn schedule_in(&mut self, ticks: u64, action: Action) {
        let seq = self.seq;
        self.seq += 1;
        self.queue.push(Reverse(Scheduled {
            due: self.now + ticks,
            seq,
            action,
        }));
    }

    /// Cancel any running spawn timer and register a new one.
    /// The first firing is one full period from now.
    pub fn start_spawn_timer(&mut self, period: u64) {
        self.spawn_generation += 1;
        self.spawn_period = Some(period.max(1));
        self.schedule_in(period.max(1), Action::Spawn {
            generation: self.spawn_generation,
        });
    }

    pub fn cancel_spawn_timer(&mut self) {
        self.spawn_generation += 1;
        self.spawn_period = None;
    }

    /// Next action due at or before the current tick. A live spawn firing
    /// re-arms the timer for the following period.
    pub fn pop_due(&mut self) -> Option<Action> {
        loop {
            match self.queue.peek() {
                Some(Reverse(next)) if next.due <= self.now => {}
                _ => return None,
            }
            let Reverse(next) = self.queue.pop()?;
            match next.action {
                Action::Spawn { generation } => {
                    if generation != self.spawn_generation {
                        continue;
                    }
                    if let Some(period) = self.spawn_period {
                        self.schedule_in(period, Action::Spawn { generation });
                    }
                    return Some(next.action);
                }
                Action::RemoveEnemy(_) => return Some(next.action),
            }
        }
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.cancel_spawn_timer();
    }
}

/// Live enemies, in id order
#[derive(Debug, Clone, Default)]
pub struct EnemyRoster {
    enemies: BTreeMap<EnemyId, Enemy>,
    next_id: u32,
}

impl EnemyRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids are never reused within a session
    pub fn next_id(&mut self) -> EnemyId {
        self.next_id += 1;
        EnemyId(self.next_id)
    }

    pub fn insert(&mut self, enemy: Enemy) {
        self.enemies.insert(enemy.id, enemy);
    }

    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    pub fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.get_mut(&id)
    }

    /// Detach the enemy's body, aim, shape and spring from the world and drop
    /// it from the roster. A second call for the same id is a no-op.
    pub fn remove(&mut self, world: &mut PhysicsWorld, id: EnemyId) -> bool {
        let Some(enemy) = self.enemies.remove(&id) else {
            return false;
        };
        world.remove_bundle(enemy.bundle());
        log::debug!("enemy {} removed", id.0);
        true
    }

    pub fn find_by_shape(&self, shape: ShapeHandle) -> Option<EnemyId> {
        self.enemies
            .values()
            .find(|e| e.shape() == shape)
            .map(|e| e.id)
    }

    /// Enemies on the field, dying ones included
    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.enemies.values().filter(|e| e.is_alive()).count()
    }

    pub fn ids(&self) -> Vec<EnemyId> {
        self.enemies.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.values_mut()
    }

    /// Remove every enemy from the world
    pub fn clear(&mut self, world: &mut PhysicsWorld) {
        for enemy in std::mem::take(&mut self.enemies).into_values() {
            world.remove_bundle(enemy.bundle());
        }
    }
}
