mod content;
mod entry;
mod payload;
mod settings;

pub use self::content::TextContent;
pub use self::entry::CacheEntry;
pub use self::payload::TextPayload;
pub use self::settings::TextSettings;
