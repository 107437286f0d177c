mod bundle;
mod link;
mod note;
mod sheet;

pub use self::bundle::RelatedBundle;
pub use self::link::{CollectiveTitle, Link};
pub use self::note::Note;
pub use self::sheet::Sheet;

/// An item attached to a ref, possibly a range.
pub trait Anchored {
    /// The ref the item is attached to; empty if it has none.
    fn anchor_ref(&self) -> &str;

    /// Every individual ref the anchor covers, when the server has already
    /// expanded it.
    fn anchor_ref_expanded(&self) -> &[String] {
        &[]
    }
}
