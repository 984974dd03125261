//! Entity manager: a dense, double-buffered array of entities with
//! per-entity bitsets matched against precomputed signatures.
//!
//! # Lifecycle
//!
//! Creating and killing entities only marks intent. New entities are
//! appended past the current size and become visible to iteration after
//! [`Manager::refresh`]; killed entities stay visible until the same call,
//! which compacts the array so all live entities sit at the front.
//!
//! ```rust,ignore
//! let mut manager = Manager::<Game>::new();
//!
//! let e = manager.create_index();
//! manager.add_component(e, Position { x: 0.0, y: 0.0 });
//! manager.add_component(e, Velocity { dx: 1.0, dy: 0.0 });
//! manager.refresh();
//!
//! manager.update_system(&mut Mover);
//! ```

use log::{debug, trace};

use super::{
    entity::{Entity, EntityHandle, EntityIndex, Generation, HandleData, HandleError},
    settings::{
        ComponentStorage, HasComponent, HasSignature, HasTag, Options, Settings, component_bit,
        signature_bitset, tag_bit,
    },
};
use crate::memory::{AllocVec, Allocator};

/// Logic run once per entity matching signature `Sig`.
pub trait System<S: HasSignature<Sig>, Sig> {
    fn run(&mut self, index: EntityIndex, components: <S as HasSignature<Sig>>::Fetch<'_>);
}

/// Owner of every entity and component of one settings world.
pub struct Manager<S: Settings> {
    options: Options,
    capacity: usize,
    size: usize,
    size_next: usize,
    entities: AllocVec<Entity<S::Blocks>>,
    handles: AllocVec<HandleData>,
    components: S::Storage,
    alloc: Allocator,
}

impl<S: Settings> Default for Manager<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Settings> Manager<S> {
    /// Manager using the world's options and the default allocator.
    pub fn new() -> Self {
        Self::with_options_in(S::options(), Allocator::default())
    }

    pub fn new_in(alloc: Allocator) -> Self {
        Self::with_options_in(S::options(), alloc)
    }

    pub fn with_options(options: Options) -> Self {
        Self::with_options_in(options, Allocator::default())
    }

    pub fn with_options_in(options: Options, alloc: Allocator) -> Self {
        let mut manager = Self {
            options,
            capacity: 0,
            size: 0,
            size_next: 0,
            entities: AllocVec::new_in(alloc.clone()),
            handles: AllocVec::new_in(alloc.clone()),
            components: S::Storage::new_in(alloc.clone()),
            alloc,
        };
        manager.grow_to(options.start_capacity);
        manager
    }

    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[inline]
    pub fn allocator(&self) -> &Allocator {
        &self.alloc
    }

    /// Entities visible to iteration, as of the last refresh.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Entities that will be visible after the next refresh, counting the
    /// ones killed since the last one.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.size_next
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The entity at `index`. Panics when `index` is outside the capacity.
    #[inline]
    pub fn entity(&self, index: EntityIndex) -> &Entity<S::Blocks> {
        &self.entities[index]
    }

    // ------------------------------------------------------------- lifecycle

    /// Drop every entity and invalidate every handle, keeping the capacity.
    pub fn clear(&mut self) {
        for (slot, (entity, handle)) in self.entities.iter_mut().zip(self.handles.iter_mut()).enumerate() {
            entity.data = slot;
            entity.handle = slot;
            entity.alive = false;
            entity.bitset.reset();

            handle.entity = slot;
            handle.generation = handle.generation.next();
        }
        self.size = 0;
        self.size_next = 0;
    }

    /// Make room for `new_capacity` entities.
    pub fn grow_to(&mut self, new_capacity: usize) {
        if new_capacity <= self.capacity {
            return;
        }
        debug!("ecs: growing entity storage {} -> {new_capacity}", self.capacity);

        self.entities.reserve_exact(new_capacity - self.capacity);
        self.handles.reserve_exact(new_capacity - self.capacity);
        for slot in self.capacity..new_capacity {
            self.entities.push(Entity::new(slot, S::BIT_COUNT));
            self.handles.push(HandleData {
                entity: slot,
                generation: Generation::FIRST,
            });
        }
        self.components.grow_to(new_capacity);
        self.capacity = new_capacity;
    }

    fn grow_if_needed(&mut self) {
        if self.capacity > self.size_next {
            return;
        }
        let next = self.options.next_capacity(self.capacity);
        self.grow_to(next);
    }

    /// Create an entity. It becomes visible to iteration after the next
    /// refresh.
    pub fn create_index(&mut self) -> EntityIndex {
        self.grow_if_needed();

        let index = self.size_next;
        self.size_next += 1;

        let entity = &mut self.entities[index];
        entity.alive = true;
        entity.bitset.reset();
        index
    }

    /// Create an entity and a handle that follows it through compaction.
    pub fn create_handle(&mut self) -> EntityHandle {
        let index = self.create_index();
        let slot = self.entities[index].handle;
        let data = &mut self.handles[slot];
        data.entity = index;
        EntityHandle {
            slot,
            generation: data.generation,
        }
    }

    /// Mark an entity dead. It is removed at the next refresh.
    #[inline]
    pub fn kill(&mut self, index: EntityIndex) {
        self.entities[index].alive = false;
    }

    #[inline]
    pub fn is_alive(&self, index: EntityIndex) -> bool {
        self.entities[index].alive
    }

    // --------------------------------------------------------------- handles

    /// Whether `handle` still refers to the entity it was created for.
    pub fn is_handle_valid(&self, handle: &EntityHandle) -> bool {
        self.handles
            .get(handle.slot)
            .is_some_and(|data| data.generation == handle.generation)
    }

    /// Current index of the entity behind `handle`.
    pub fn resolve(&self, handle: &EntityHandle) -> Result<EntityIndex, HandleError> {
        if self.is_handle_valid(handle) {
            Ok(self.handles[handle.slot].entity)
        } else {
            Err(HandleError::Stale(*handle))
        }
    }

    pub fn kill_handle(&mut self, handle: &EntityHandle) -> Result<(), HandleError> {
        let index = self.resolve(handle)?;
        self.kill(index);
        Ok(())
    }

    // ------------------------------------------------------------------ tags

    pub fn add_tag<T>(&mut self, index: EntityIndex)
    where
        S: HasTag<T>,
    {
        self.entities[index].bitset.set(tag_bit::<S, T>());
    }

    pub fn remove_tag<T>(&mut self, index: EntityIndex)
    where
        S: HasTag<T>,
    {
        self.entities[index].bitset.unset(tag_bit::<S, T>());
    }

    pub fn has_tag<T>(&self, index: EntityIndex) -> bool
    where
        S: HasTag<T>,
    {
        self.entities[index].bitset.test(tag_bit::<S, T>())
    }

    // ------------------------------------------------------------ components

    /// Attach `value` to an entity, overwriting any previous `C`.
    pub fn add_component<C: 'static>(&mut self, index: EntityIndex, value: C) -> &mut C
    where
        S: HasComponent<C>,
    {
        let entity = &mut self.entities[index];
        entity.bitset.set(component_bit::<S, C>());
        let row = entity.data;

        let slot = &mut S::column_mut(&mut self.components)[row];
        *slot = value;
        slot
    }

    /// Detach `C`. The stored value stays in its row until overwritten.
    pub fn remove_component<C: 'static>(&mut self, index: EntityIndex)
    where
        S: HasComponent<C>,
    {
        self.entities[index].bitset.unset(component_bit::<S, C>());
    }

    pub fn has_component<C: 'static>(&self, index: EntityIndex) -> bool
    where
        S: HasComponent<C>,
    {
        self.entities[index].bitset.test(component_bit::<S, C>())
    }

    /// The entity's `C`, if attached.
    pub fn component<C: 'static>(&self, index: EntityIndex) -> Option<&C>
    where
        S: HasComponent<C>,
    {
        let entity = &self.entities[index];
        if !entity.bitset.test(component_bit::<S, C>()) {
            return None;
        }
        S::column(&self.components).get(entity.data)
    }

    pub fn component_mut<C: 'static>(&mut self, index: EntityIndex) -> Option<&mut C>
    where
        S: HasComponent<C>,
    {
        let entity = &self.entities[index];
        if !entity.bitset.test(component_bit::<S, C>()) {
            return None;
        }
        let row = entity.data;
        S::column_mut(&mut self.components).get_mut(row)
    }

    // ------------------------------------------------------------ signatures

    /// Whether the entity has every component and tag of `Sig`.
    pub fn matches_signature<Sig>(&self, index: EntityIndex) -> bool
    where
        S: HasSignature<Sig>,
    {
        self.entities[index].bitset.matches(signature_bitset::<S, Sig>())
    }

    /// Borrow the components of `Sig` on an entity that matches it.
    pub fn query<Sig>(&mut self, index: EntityIndex) -> Option<<S as HasSignature<Sig>>::Fetch<'_>>
    where
        S: HasSignature<Sig>,
    {
        if !self.matches_signature::<Sig>(index) {
            return None;
        }
        let row = self.entities[index].data;
        Some(S::fetch(&mut self.components, row))
    }

    /// Call `f` with every visible entity.
    pub fn for_entities(&mut self, mut f: impl FnMut(&mut Self, EntityIndex)) {
        for index in 0..self.size {
            f(self, index);
        }
    }

    /// Call `f` with every visible entity matching `Sig`.
    pub fn for_matching<Sig>(&mut self, mut f: impl FnMut(&mut Self, EntityIndex))
    where
        S: HasSignature<Sig>,
    {
        let signature = signature_bitset::<S, Sig>();
        for index in 0..self.size {
            if self.entities[index].bitset.matches(signature) {
                f(self, index);
            }
        }
    }

    /// Run `system` on every visible entity matching `Sig`.
    pub fn update_system<Sig>(&mut self, system: &mut impl System<S, Sig>)
    where
        S: HasSignature<Sig>,
    {
        let signature = signature_bitset::<S, Sig>();
        for index in 0..self.size {
            let entity = &self.entities[index];
            if entity.bitset.matches(signature) {
                let row = entity.data;
                system.run(index, S::fetch(&mut self.components, row));
            }
        }
    }

    // --------------------------------------------------------------- refresh

    /// Apply pending creations and kills: live entities move to the front,
    /// dead ones have their handles invalidated.
    pub fn refresh(&mut self) {
        if self.size_next == 0 {
            self.size = 0;
            return;
        }
        let live = self.compact();
        trace!("ecs: refresh kept {live} of {} entities", self.size_next);
        self.size = live;
        self.size_next = live;
    }

    fn compact(&mut self) -> usize {
        let mut dead = 0;
        let mut alive = self.size_next - 1;

        loop {
            // First dead entity from the left.
            loop {
                if dead > alive {
                    return dead;
                }
                if !self.entities[dead].alive {
                    break;
                }
                dead += 1;
            }

            // First alive entity from the right.
            loop {
                if self.entities[alive].alive {
                    break;
                }
                self.invalidate_handle(alive);
                if alive <= dead {
                    return dead;
                }
                alive -= 1;
            }

            self.entities.swap(alive, dead);
            self.refresh_handle(dead);
            self.invalidate_handle(alive);
            self.refresh_handle(alive);

            dead += 1;
            alive -= 1;
        }
    }

    fn invalidate_handle(&mut self, index: EntityIndex) {
        let slot = self.entities[index].handle;
        let data = &mut self.handles[slot];
        data.generation = data.generation.next();
    }

    fn refresh_handle(&mut self, index: EntityIndex) {
        let slot = self.entities[index].handle;
        self.handles[slot].entity = index;
    }
}
