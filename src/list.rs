//! Ownership-enforcing child containers
//!
//! Every container is bound to the node that owns it. Adding an element links it beneath
//! that owner and merges its IDs into the owner's subtree index; removing it hands the
//! subtree back detached. All containers reject elements that already have a parent.

mod child_list;
mod indexed;
mod slot;
mod typed;
mod unknown;

pub use child_list::ChildList;
pub use indexed::IndexedChildList;
pub use slot::ChildSlot;
pub use typed::TypedChildList;
pub use unknown::UnknownChildList;
