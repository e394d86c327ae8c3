use crate::object::Flags;
use crate::object::Object;
use crate::object::Payload;
use crate::object::TAG_NONE;
use super::Handle;

use shrike_core::error::ErrorCode;
use tracing::debug;
use tracing::trace;

/// One slot of the arena.
struct Slot
{
    generation: u32,
    entry: Option<Object>,
}

/// Dedicated allocation region for objects.
///
/// The heap owns every object outright. Callers refer to objects through
/// [`Handle`]s and mutate them through the checked accessors; reclaimed
/// slots are recycled through a free list under a fresh generation.
///
/// If the arena cannot grow, the allocation failure is process-fatal: the
/// runtime has no strategy for continuing without its value representation.
pub struct Heap
{
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Heap
{
    /// Create an empty heap.
    pub fn new() -> Self
    {
        Self{
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Create a new object with the given name.
    ///
    /// The object starts with a reference count of 1 and the
    /// [`Flags::USED`] flag set: it is live and uniquely owned by the
    /// caller. It carries no payload until a kind attaches one through
    /// [`adopt`](`Heap::adopt`).
    pub fn create(&mut self, name: &str) -> Handle
    {
        self.install(Object{
            name: name.to_owned(),
            payload: None,
            refs: 1,
            flags: Flags::USED,
            tag: TAG_NONE,
        })
    }

    /// Create a new object carrying the given payload.
    ///
    /// This is the constructor path concrete kinds use: the payload's
    /// dispatch table is bound to the object and its type tag is captured.
    /// The guarantees of [`create`](`Heap::create`) apply.
    pub fn adopt(&mut self, name: &str, payload: Box<dyn Payload>) -> Handle
    {
        let tag = payload.type_tag();
        self.install(Object{
            name: name.to_owned(),
            payload: Some(payload),
            refs: 1,
            flags: Flags::USED,
            tag,
        })
    }

    fn install(&mut self, object: Object) -> Handle
    {
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].entry = Some(object);
                index
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot{generation: 0, entry: Some(object)});
                index
            }
        };

        self.live += 1;
        let generation = self.slots[index as usize].generation;
        trace!(index, generation, "object created");
        Handle{index, generation}
    }

    /// Borrow the object behind a handle, if it is still there.
    pub fn get(&self, handle: Handle) -> Option<&Object>
    {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }

        slot.entry.as_ref()
    }

    /// Mutably borrow the object behind a handle, if it is still there.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut Object>
    {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }

        slot.entry.as_mut()
    }

    /// Whether the handle still refers to an object.
    pub fn contains(&self, handle: Handle) -> bool
    {
        self.get(handle).is_some()
    }

    /// Increment the reference count; returns the new count.
    ///
    /// # Panics
    ///
    /// Panics on a stale handle: retaining a reclaimed object is the moral
    /// equivalent of a use after free and is treated as a broken contract.
    #[track_caller]
    pub fn retain(&mut self, handle: Handle) -> u32
    {
        match self.get_mut(handle) {
            Some(object) => {
                object.refs += 1;
                object.refs
            }
            None => panic!("retain through a stale handle"),
        }
    }

    /// Decrement the reference count; returns the new count.
    ///
    /// The heap never destroys on its own. The holder that drops the count
    /// to zero is expected to call [`destroy`](`Heap::destroy`) by hand.
    ///
    /// # Panics
    ///
    /// Panics on a stale handle, or when the count is already zero.
    #[track_caller]
    pub fn release(&mut self, handle: Handle) -> u32
    {
        match self.get_mut(handle) {
            Some(object) => {
                if object.refs == 0 {
                    panic!("release of an object with no references");
                }

                object.refs -= 1;
                object.refs
            }
            None => panic!("release through a stale handle"),
        }
    }

    /// Destroy the object behind a handle.
    ///
    /// Runs the kind's destructor and the generic teardown; see
    /// [`Object::destroy`] for the ordering and the dangling-payload
    /// invariant. The slot stays occupied by the torn-down value until
    /// [`reclaim`](`Heap::reclaim`). Stale handles and already destroyed
    /// objects are no-ops.
    #[track_caller]
    pub fn destroy(&mut self, handle: Handle) -> ErrorCode
    {
        match self.get_mut(handle) {
            Some(object) => {
                debug!(index = handle.index, "object destroyed");
                object.destroy()
            }
            None => ErrorCode::Ok,
        }
    }

    /// Evict a destroyed object's slot and recycle it.
    ///
    /// Only a torn-down object may be reclaimed; a live one answers
    /// [`ErrorCode::Perm`] and stays put. The generation moves on, so every
    /// outstanding handle to the slot goes stale. Reclaiming a stale handle
    /// is a no-op.
    pub fn reclaim(&mut self, handle: Handle) -> ErrorCode
    {
        let slot = match self.slots.get_mut(handle.index as usize) {
            Some(slot) if slot.generation == handle.generation => slot,
            _ => return ErrorCode::Ok,
        };

        match slot.entry.as_ref() {
            Some(object) if !object.flags.contains(Flags::FREED) => {
                ErrorCode::Perm
            }
            Some(_) => {
                slot.entry = None;
                slot.generation += 1;
                self.free.push(handle.index);
                self.live -= 1;
                trace!(index = handle.index, "slot reclaimed");
                ErrorCode::Ok
            }
            None => ErrorCode::Ok,
        }
    }

    /// Number of objects created and not yet reclaimed.
    pub fn len(&self) -> usize
    {
        self.live
    }

    /// Whether the heap holds no objects.
    pub fn is_empty(&self) -> bool
    {
        self.live == 0
    }
}

impl Default for Heap
{
    fn default() -> Self
    {
        Self::new()
    }
}
