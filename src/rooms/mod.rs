//! Incremental room tracking
//!
//! A room is a maximal 4-connected group of walkable tiles. Every walkable
//! tile stores the id of its room; obstacles store `OBSTACLE` (0). Edits
//! relabel locally instead of recomputing the whole map:
//!
//! - `place` turns an area into obstacles, then flood fills the pieces left
//!   around it inside a small window. A room that now shows more than one
//!   piece next to the area keeps its id on the largest piece and the others
//!   are relabeled with fresh ids (split).
//! - `remove` turns an area walkable as a temporary room, then absorbs it and
//!   every room touching its border into the largest of those rooms (merge).
//!
//! `Rooms` has no lock of its own. Use `SharedRooms` to share it between
//! threads; all calls then serialize on one mutex.

mod ids;

pub use ids::{RoomHandle, RoomIds, OBSTACLE};

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::config::{RoomsConfig, MAX_SPLIT_WINDOW_MARGIN};
use crate::world::{Area, TileMap};

const NEIGHBORS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// Connected piece of a room found inside the split window
struct Piece {
    seed: (i32, i32),
    tiles: usize,
    touches_ring: bool,
}

pub struct Rooms {
    size: i32,
    /// Room id per tile, row-major
    layout: Vec<u32>,
    /// Tile count per room id
    counts: Vec<u32>,
    ids: RoomIds,
    config: RoomsConfig,
}

impl Rooms {
    /// Label every walkable tile of the map
    pub fn new(map: &TileMap) -> Self {
        Self::with_config(map, &RoomsConfig::default())
    }

    pub fn with_config(map: &TileMap, config: &RoomsConfig) -> Self {
        let size = map.size() as i32;
        let mut rooms = Self {
            size,
            layout: vec![OBSTACLE; map.tile_count()],
            counts: vec![0],
            ids: RoomIds::new(),
            config: *config,
        };
        let mut visited = vec![false; map.tile_count()];
        let mut queue = VecDeque::new();
        for (x, y) in map.area().tiles() {
            let idx = rooms.index(x, y);
            if visited[idx] || map.is_obstacle(x, y) {
                continue;
            }
            visited[idx] = true;
            let room = rooms.new_room();
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                rooms.set_tile(cx, cy, room);
                for (dx, dy) in NEIGHBORS {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if !map.in_bounds(nx, ny) {
                        continue;
                    }
                    let nidx = rooms.index(nx, ny);
                    if !visited[nidx] && !map.is_obstacle(nx, ny) {
                        visited[nidx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
        }
        log::debug!("labeled {} rooms on {}x{} map", rooms.room_count(), size, size);
        rooms
    }

    pub fn bounds(&self) -> Area {
        Area::square(0, 0, self.size)
    }

    fn index(&self, x: i32, y: i32) -> usize {
        assert!(
            x >= 0 && y >= 0 && x < self.size && y < self.size,
            "tile ({}, {}) outside {}x{} rooms grid", x, y, self.size, self.size
        );
        x as usize + y as usize * self.size as usize
    }

    /// Room id at (x, y), `OBSTACLE` for obstacles
    pub fn room_id(&self, x: i32, y: i32) -> u32 {
        self.layout[self.index(x, y)]
    }

    pub fn is_obstacle(&self, x: i32, y: i32) -> bool {
        self.room_id(x, y) == OBSTACLE
    }

    /// Tiles in a room, 0 for ids that are not live
    pub fn tile_count(&self, id: u32) -> u32 {
        if self.ids.is_live(id) {
            self.counts[id as usize]
        } else {
            0
        }
    }

    /// Number of live rooms
    pub fn room_count(&self) -> usize {
        self.ids.alive_count() as usize
    }

    /// Live rooms as (id, tile count), ascending by id
    pub fn rooms(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (1..self.counts.len() as u32)
            .filter(|&id| self.ids.is_live(id))
            .map(|id| (id, self.counts[id as usize]))
    }

    /// Handle of the room at (x, y), `None` on obstacles
    pub fn handle(&self, x: i32, y: i32) -> Option<RoomHandle> {
        self.ids.handle(self.room_id(x, y))
    }

    /// Does the handle still name a live room it was taken from?
    pub fn is_current(&self, handle: RoomHandle) -> bool {
        self.ids.is_current(handle)
    }

    fn new_room(&mut self) -> u32 {
        let id = self.ids.allocate().id();
        if self.counts.len() < self.ids.capacity() {
            self.counts.resize(self.ids.capacity(), 0);
        }
        self.counts[id as usize] = 0;
        id
    }

    fn add_tile(&mut self, room: u32) {
        assert!(self.ids.is_live(room), "adding a tile to room {} which is not live", room);
        self.counts[room as usize] += 1;
    }

    fn remove_tile(&mut self, room: u32) {
        assert!(self.ids.is_live(room), "removing a tile from room {} which is not live", room);
        self.counts[room as usize] -= 1;
        if self.counts[room as usize] == 0 {
            self.ids.release(room);
        }
    }

    /// Relabel one tile, keeping counts in step
    fn set_tile(&mut self, x: i32, y: i32, room: u32) {
        let idx = self.index(x, y);
        let prev = self.layout[idx];
        if prev == room {
            return;
        }
        if room != OBSTACLE {
            self.add_tile(room);
        }
        self.layout[idx] = room;
        if prev != OBSTACLE {
            self.remove_tile(prev);
        }
    }

    /// Turn `area` (clamped to the map) into obstacles and split any room
    /// it cut in two.
    pub fn place(&mut self, area: Area) {
        let Some(area) = self.bounds().intersection(&area) else {
            return;
        };
        let mut cut: HashSet<u32> = HashSet::new();
        for (x, y) in area.tiles() {
            let room = self.room_id(x, y);
            if room != OBSTACLE {
                cut.insert(room);
                self.set_tile(x, y, OBSTACLE);
            }
        }
        if cut.is_empty() {
            return;
        }

        let bounds = self.bounds();
        let window = area
            .expand(self.config.split_window_margin.clamp(1, MAX_SPLIT_WINDOW_MARGIN))
            .intersection(&bounds)
            .unwrap_or(area);
        let ring = area.expand(1).intersection(&bounds).unwrap_or(area);

        // Pieces of the cut rooms inside the window, row-major discovery order
        let mut visited = vec![false; window.size()];
        let mut queue = VecDeque::new();
        let mut by_room: BTreeMap<u32, Vec<Piece>> = BTreeMap::new();
        for (x, y) in window.tiles() {
            let room = self.room_id(x, y);
            if visited[window.local_index(x, y)] || !cut.contains(&room) {
                continue;
            }
            visited[window.local_index(x, y)] = true;
            let mut piece = Piece { seed: (x, y), tiles: 0, touches_ring: false };
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                piece.tiles += 1;
                piece.touches_ring |= ring.contains(cx, cy);
                for (dx, dy) in NEIGHBORS {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if !window.contains(nx, ny) {
                        continue;
                    }
                    let idx = window.local_index(nx, ny);
                    if !visited[idx] && self.room_id(nx, ny) == room {
                        visited[idx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }
            if piece.touches_ring {
                by_room.entry(room).or_default().push(piece);
            }
        }

        let mut relabeled: HashSet<(i32, i32)> = HashSet::new();
        for (room, mut pieces) in by_room {
            if pieces.len() < 2 {
                continue;
            }
            // Largest keeps the id, ties go to the first found
            pieces.sort_by(|a, b| b.tiles.cmp(&a.tiles));
            for piece in &pieces[1..] {
                if relabeled.contains(&piece.seed) || self.room_id(piece.seed.0, piece.seed.1) != room {
                    continue;
                }
                let fresh = self.new_room();
                let moved = self.flood_relabel(piece.seed, room, fresh, &mut relabeled);
                log::debug!("room {} split at {}: {} tiles moved to room {}", room, area, moved, fresh);
            }
        }
    }

    /// Relabel the whole component of `from` containing `seed` to `to`
    fn flood_relabel(&mut self, seed: (i32, i32), from: u32, to: u32, visited: &mut HashSet<(i32, i32)>) -> usize {
        let mut queue = VecDeque::new();
        let mut moved = 0;
        visited.insert(seed);
        queue.push_back(seed);
        while let Some((x, y)) = queue.pop_front() {
            self.set_tile(x, y, to);
            moved += 1;
            for (dx, dy) in NEIGHBORS {
                let (nx, ny) = (x + dx, y + dy);
                if self.bounds().contains(nx, ny)
                    && self.room_id(nx, ny) == from
                    && visited.insert((nx, ny))
                {
                    queue.push_back((nx, ny));
                }
            }
        }
        moved
    }

    /// Make `area` (clamped to the map) walkable and merge it with every
    /// room touching it.
    pub fn remove(&mut self, area: Area) {
        let bounds = self.bounds();
        let Some(area) = bounds.intersection(&area) else {
            return;
        };
        let carved = self.new_room();
        for (x, y) in area.tiles() {
            self.set_tile(x, y, carved);
        }

        // Border walk: west (S to N), north (W to E), east (N to S), south (E to W)
        let (x0, y0, x1, y1) = (area.min_x(), area.min_y(), area.max_x(), area.max_y());
        let border = (y0..=y1).map(|y| (x0 - 1, y))
            .chain((x0..=x1).map(|x| (x, y1 + 1)))
            .chain((y0..=y1).rev().map(|y| (x1 + 1, y)))
            .chain((x0..=x1).rev().map(|x| (x, y0 - 1)));
        let mut neighbors: Vec<u32> = Vec::new();
        for (x, y) in border {
            if !bounds.contains(x, y) {
                continue;
            }
            let room = self.room_id(x, y);
            if room != OBSTACLE && !neighbors.contains(&room) {
                neighbors.push(room);
            }
        }

        // Largest neighbor survives, ties go to the lowest id
        let Some(survivor) = neighbors
            .iter()
            .copied()
            .max_by(|&a, &b| self.counts[a as usize].cmp(&self.counts[b as usize]).then(b.cmp(&a)))
        else {
            log::debug!("carved area {} is enclosed, new room {}", area, carved);
            return;
        };

        // The carved area is a solid rectangle, so every border neighbor is
        // reachable through it
        let mut visited: HashSet<(i32, i32)> = HashSet::new();
        let mut queue = VecDeque::new();
        let start = (x0, y0);
        visited.insert(start);
        queue.push_back(start);
        while let Some((x, y)) = queue.pop_front() {
            self.set_tile(x, y, survivor);
            for (dx, dy) in NEIGHBORS {
                let (nx, ny) = (x + dx, y + dy);
                if !bounds.contains(nx, ny) {
                    continue;
                }
                let room = self.room_id(nx, ny);
                if room != OBSTACLE && room != survivor && visited.insert((nx, ny)) {
                    queue.push_back((nx, ny));
                }
            }
        }
        log::debug!("carved area {} merged {} rooms into room {}", area, neighbors.len() + 1, survivor);
    }

    /// Full consistency check: counts match the layout, every live room is
    /// connected, and no two rooms touch.
    pub fn validate(&self) -> Result<(), String> {
        let mut recount = vec![0u32; self.counts.len()];
        for (x, y) in self.bounds().tiles() {
            let room = self.room_id(x, y);
            if room == OBSTACLE {
                continue;
            }
            if !self.ids.is_live(room) {
                return Err(format!("tile ({}, {}) has dead room {}", x, y, room));
            }
            recount[room as usize] += 1;
            for (dx, dy) in [(1, 0), (0, 1)] {
                let (nx, ny) = (x + dx, y + dy);
                if self.bounds().contains(nx, ny) {
                    let other = self.room_id(nx, ny);
                    if other != OBSTACLE && other != room {
                        return Err(format!("rooms {} and {} touch at ({}, {})", room, other, x, y));
                    }
                }
            }
        }
        for (id, count) in self.rooms() {
            if recount[id as usize] != count {
                return Err(format!("room {} counts {} tiles, layout has {}", id, count, recount[id as usize]));
            }
            if count == 0 {
                return Err(format!("room {} is live with no tiles", id));
            }
        }

        // Each room must be one component
        let mut seen: HashSet<u32> = HashSet::new();
        let mut visited = vec![false; self.layout.len()];
        for (x, y) in self.bounds().tiles() {
            let room = self.room_id(x, y);
            if room == OBSTACLE || visited[self.index(x, y)] {
                continue;
            }
            if !seen.insert(room) {
                return Err(format!("room {} is split into several components", room));
            }
            let mut queue = VecDeque::from([(x, y)]);
            visited[self.index(x, y)] = true;
            while let Some((cx, cy)) = queue.pop_front() {
                for (dx, dy) in NEIGHBORS {
                    let (nx, ny) = (cx + dx, cy + dy);
                    if self.bounds().contains(nx, ny) && self.room_id(nx, ny) == room {
                        let idx = self.index(nx, ny);
                        if !visited[idx] {
                            visited[idx] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// `Rooms` behind one mutex. Edits and queries all take the same lock.
#[derive(Clone)]
pub struct SharedRooms {
    inner: Arc<Mutex<Rooms>>,
}

impl SharedRooms {
    pub fn new(rooms: Rooms) -> Self {
        Self { inner: Arc::new(Mutex::new(rooms)) }
    }

    pub fn place(&self, area: Area) {
        self.inner.lock().unwrap().place(area);
    }

    pub fn remove(&self, area: Area) {
        self.inner.lock().unwrap().remove(area);
    }

    pub fn room_id(&self, x: i32, y: i32) -> u32 {
        self.inner.lock().unwrap().room_id(x, y)
    }

    /// Run `f` with the lock held
    pub fn with<R>(&self, f: impl FnOnce(&Rooms) -> R) -> R {
        f(&self.inner.lock().unwrap())
    }
}
