//! Exam registration: roster lookup, rank transformation, ordering and
//! rendering of the registration sheet.

pub mod filename;
pub mod pipeline;
pub mod rank;
pub mod render;
pub mod roster;
pub mod router;
pub mod service;

pub use filename::{content_disposition, derive_filename, FilenameStyle};
pub use pipeline::{
    ErrorKind, ExportError, ExportPipeline, ExportSettings, OrderingPolicy, RegistrationSheet,
    ResolvedEntry, SelectionRequest, ValidationError, HEADER_LABELS,
};
pub use rank::{RankLabel, RankSortKey, RegistrationRank};
pub use render::{DocumentFormat, RenderError};
pub use roster::{
    parse_roster, CsvRosterFile, Roster, RosterEntry, RosterError, RosterIndex, RosterSource,
};
pub use router::{registration_router, ExportRequest};
pub use service::{ExportDocument, RegistrationExporter};
