pub use accounts::{Account, AccountRole, FundingPolicy};
pub use campaigns::{Campaign, LinkButton, Media, MediaKind, PhoneButton};
pub use commands::{FundCampaignCmd, GrantPointsCmd, NewAccountCmd};
pub use error::EngineError;
pub use journal::{EntryKind, EntryStatus, JournalEntry};
pub use ops::{Engine, EngineBuilder, FundingOutcome, GrantOutcome, JournalListFilter};

mod accounts;
mod campaigns;
mod commands;
mod error;
mod journal;
mod ops;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
