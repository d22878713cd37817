//! Room id pool with generational handles
//!
//! Room ids are small integers so they can be stored per tile. Released ids
//! go on a LIFO free list and are handed out again; each slot carries a
//! generation that is bumped on release, so a `RoomHandle` taken earlier can
//! tell whether its room still exists or the id now names a different room.
//! Id 0 is reserved for obstacles and never allocated.

use serde::{Serialize, Deserialize};

/// Room id stored on obstacle tiles
pub const OBSTACLE: u32 = 0;

/// A room id plus the generation it was allocated with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomHandle {
    id: u32,
    generation: u32,
}

impl RoomHandle {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
pub struct RoomIds {
    /// Generation per slot, slot 0 unused
    generations: Vec<u32>,
    alive: Vec<bool>,
    /// Released ids (LIFO)
    free: Vec<u32>,
    alive_count: u32,
}

impl Default for RoomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomIds {
    pub fn new() -> Self {
        Self {
            generations: vec![0],
            alive: vec![false],
            free: Vec::new(),
            alive_count: 0,
        }
    }

    /// Allocate an id, reusing a released one when available
    pub fn allocate(&mut self) -> RoomHandle {
        self.alive_count += 1;
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.generations.push(0);
                self.alive.push(false);
                (self.generations.len() - 1) as u32
            }
        };
        self.alive[id as usize] = true;
        RoomHandle { id, generation: self.generations[id as usize] }
    }

    /// Release a live id. Panics on the obstacle id or an id that is not live.
    pub fn release(&mut self, id: u32) {
        assert!(self.is_live(id), "releasing room {} which is not live", id);
        let idx = id as usize;
        self.alive[idx] = false;
        self.generations[idx] += 1;
        self.free.push(id);
        self.alive_count -= 1;
    }

    pub fn is_live(&self, id: u32) -> bool {
        id != OBSTACLE && self.alive.get(id as usize).copied().unwrap_or(false)
    }

    /// Current handle for a live id
    pub fn handle(&self, id: u32) -> Option<RoomHandle> {
        self.is_live(id).then(|| RoomHandle { id, generation: self.generations[id as usize] })
    }

    /// Does the handle still name the room it was taken from?
    pub fn is_current(&self, handle: RoomHandle) -> bool {
        self.is_live(handle.id) && self.generations[handle.id as usize] == handle.generation
    }

    pub fn alive_count(&self) -> u32 {
        self.alive_count
    }

    /// One past the largest id ever allocated
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }
}
