pub mod host;
pub mod importer;
pub mod memory;
pub mod protocol;

pub use host::{CornerRadii, DesignHost, FrameLayout, HostError, NativePaint, TextProps};
pub use importer::{ImportError, ImportReport, handle_message, import_document, validate};
pub use memory::InMemoryHost;
pub use protocol::{ImportOutcome, UiMessage};
