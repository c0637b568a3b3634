pub mod classification;
pub mod clock;
pub mod config;
pub mod conversation;
pub mod folio;
pub mod ticket;

pub use classification::ClassificationLabel;
pub use clock::{Clock, FixedClock, SystemClock};
pub use conversation::{
    ContentPart, ConversationHistory, ConversationStore, ConversationTurn, Role, StoreError,
};
pub use folio::{FolioError, FolioGenerator};
pub use ticket::{NewTicket, ServiceType, TicketRecord, TicketStatus};
