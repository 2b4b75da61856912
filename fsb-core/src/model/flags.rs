//! src/model/flags.rs
//!
//! Behaviour switches of a browse session.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BrowseFlags: u16 {
        const HIDE_DIRS = 1;
        const HIDE_FILES = 2;
        /// List dot-prefixed and attribute-hidden objects.
        const SHOW_HIDDEN = 4;
        /// Leave the synthetic `..` out of listings.
        const SKIP_PARENT = 8;
        /// Keep manifest lines whose path no longer exists.
        const LIST_DEAD = 16;
        /// Open paths as a recursive walk.
        const WALK = 32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_values_are_stable() {
        assert_eq!(BrowseFlags::HIDE_DIRS.bits(), 1);
        assert_eq!(BrowseFlags::HIDE_FILES.bits(), 2);
        assert_eq!(BrowseFlags::SHOW_HIDDEN.bits(), 4);
        assert_eq!(BrowseFlags::SKIP_PARENT.bits(), 8);
        assert_eq!(BrowseFlags::LIST_DEAD.bits(), 16);
        assert_eq!(BrowseFlags::WALK.bits(), 32);
    }
}
