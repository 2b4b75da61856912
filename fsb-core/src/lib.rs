pub mod error;

pub mod config;

pub mod fs {
    pub mod attrs;

    pub mod backend;
    pub use backend::{DirectoryBackend, ListKind, RawEntry, RawRecord};

    pub mod entry;
    pub use entry::{Entry, EntryFormat};

    pub mod ext_set;
    pub use ext_set::ExtensionSet;

    pub mod manifest;

    pub mod ordering;

    pub mod walker;
    pub use walker::{DirectoryWalker, MAX_DEPTH, WalkMode, WalkStats};
}

pub mod model {
    pub mod browse_session;
    pub use browse_session::BrowseSession;

    pub mod entry_list;
    pub use entry_list::{EntryList, EntrySlot, MAX_DIRS, MAX_FILES};

    pub mod flags;
    pub use flags::BrowseFlags;
}

pub mod logging;
pub use logging::{LoggerBuilder, LoggerConfig, init_logging_with_config};

pub mod util {
    pub mod paths;
}

pub use error::{BrowseError, BrowseResult};

pub use model::{BrowseFlags, BrowseSession, EntryList};
