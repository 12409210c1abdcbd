mod clipboard;

pub use clipboard::{ClipboardWriter, SystemClipboard};
