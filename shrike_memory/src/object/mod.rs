//! In-memory representation of objects.

use shrike_core::context::RuntimeContext;
use shrike_core::error::ErrorCode;

use bitflags::bitflags;
use std::any::Any;
use std::io;

/// Tag of objects that carry no payload.
///
/// Concrete kinds pick nonzero tags; the value is an open set, so adding a
/// kind never touches this crate.
pub const TAG_NONE: u32 = 0;

bitflags!
{
    /// Lifecycle flags carried by every object.
    pub struct Flags: u32
    {
        /// Set at creation; the slot holds a live value.
        const USED = 1 << 0;

        /// Set by teardown; guards against double destruction.
        const FREED = 1 << 1;

        /// Set by the module loader once a module is mapped and validated.
        const LOADED = 1 << 2;
    }
}

/// Dispatch table bound to each concrete kind of object.
///
/// A kind binds its own behaviour at construction time by implementing this
/// trait; the object and heap contracts never change when a kind is added.
/// The boxed payload is also the kind's private data: everything the value
/// owns beyond its name lives behind this trait.
pub trait Payload
{
    /// Integer discriminator of this kind.
    fn type_tag(&self) -> u32;

    /// Type-specific destructor step.
    ///
    /// Releases every resource the payload owns. Runs before the generic
    /// teardown, which probes [`released`](`Payload::released`) and treats
    /// anything left over as a fatal programming error, not a recoverable
    /// failure.
    fn release(&mut self);

    /// Whether nothing remains to release.
    fn released(&self) -> bool;

    /// Write the raw form of the value, without a newline.
    fn print(&self, out: &mut dyn io::Write) -> io::Result<()>;

    /// Boolean value of the object, as judged by conditional dispatch.
    fn truthy(&self) -> bool
    {
        true
    }

    /// Debug-only diagnostic line; no-op unless overridden.
    fn dump(&self, context: &RuntimeContext, out: &mut dyn io::Write)
        -> io::Result<()>
    {
        let _ = (context, out);
        Ok(())
    }

    /// The payload as [`Any`], for checked downcasts to the concrete kind.
    fn as_any(&self) -> &dyn Any;
}

/// The polymorphic heap value.
///
/// An object is identified by its name (owned, possibly empty), an integer
/// type tag, and the payload its kind attached. Holders track their
/// interest through the reference count; the object is live while the count
/// is above zero, but the count never destroys anything on its own: the
/// holder that drops it to zero destroys the object by hand.
pub struct Object
{
    pub(crate) name: String,
    pub(crate) payload: Option<Box<dyn Payload>>,
    pub(crate) refs: u32,
    pub(crate) flags: Flags,
    pub(crate) tag: u32,
}

impl Object
{
    /// Name of the object. May be empty.
    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Current reference count.
    pub fn refs(&self) -> u32
    {
        self.refs
    }

    /// Lifecycle flags.
    pub fn flags(&self) -> Flags
    {
        self.flags
    }

    /// Lifecycle flags, for holders that mark extra states.
    pub fn flags_mut(&mut self) -> &mut Flags
    {
        &mut self.flags
    }

    /// Integer type tag; [`TAG_NONE`] for payload-less objects.
    pub fn tag(&self) -> u32
    {
        self.tag
    }

    /// The attached payload, if any.
    pub fn payload(&self) -> Option<&dyn Payload>
    {
        self.payload.as_deref()
    }

    /// The attached payload, if any.
    pub fn payload_mut(&mut self) -> Option<&mut (dyn Payload + 'static)>
    {
        self.payload.as_deref_mut()
    }

    /// Destroy the object: type-specific destructor, then generic teardown.
    ///
    /// The kind's [`release`](`Payload::release`) runs first and must leave
    /// nothing behind; the generic step then verifies that, drops the
    /// payload, clears the name, and zeroes the rest of the value, leaving
    /// only [`Flags::FREED`] set. This ordering converts a destructor that
    /// forgot a resource into an immediate, loud panic at the destroying
    /// call site rather than a silent leak.
    ///
    /// Destroying an already destroyed object is a guarded no-op.
    ///
    /// # Panics
    ///
    /// Panics when the payload still holds resources after its own
    /// destructor ran. This is a broken memory contract, never an error
    /// code.
    #[track_caller]
    pub fn destroy(&mut self) -> ErrorCode
    {
        if self.flags.contains(Flags::FREED) {
            return ErrorCode::Ok;
        }

        if let Some(payload) = self.payload.as_mut() {
            payload.release();
        }

        if let Some(payload) = self.payload.as_ref() {
            if !payload.released() {
                panic!(
                    "payload of object '{}' (tag {}) was not released \
                     before teardown",
                    self.name, self.tag,
                );
            }
        }

        self.payload = None;
        self.name.clear();
        self.refs = 0;
        self.tag = TAG_NONE;
        self.flags = Flags::FREED;

        ErrorCode::Ok
    }

    /// Write the raw form of the object, without a newline.
    ///
    /// Kinds print through their dispatch slot; a payload-less object falls
    /// back to its identity: address, name and type tag.
    pub fn print(&self, out: &mut dyn io::Write) -> io::Result<()>
    {
        match self.payload.as_deref() {
            Some(payload) => payload.print(out),
            None => write!(
                out,
                "<object {:p} '{}' tag {}>",
                self as *const Self, self.name, self.tag,
            ),
        }
    }

    /// Boolean value of the object.
    ///
    /// An object with no payload carries no value and is falsy.
    pub fn truthy(&self) -> bool
    {
        match self.payload.as_deref() {
            Some(payload) => payload.truthy(),
            None => false,
        }
    }

    /// Debug-only diagnostic line, dispatched to the payload.
    pub fn dump(&self, context: &RuntimeContext, out: &mut dyn io::Write)
        -> io::Result<()>
    {
        match self.payload.as_deref() {
            Some(payload) => payload.dump(context, out),
            None => Ok(()),
        }
    }
}
