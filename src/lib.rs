pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod inspect;
pub mod lookup;
pub mod parser;
pub mod schema;
pub mod source;
pub mod ui;
pub mod writer;

pub use batch::{convert_killmails, flatten_source, ConversionSummary, ConvertOptions, RecordFailure};
pub use cli::{Cli, Commands};
pub use error::ConvertError;
pub use lookup::{CatalogPaths, Lookups};
pub use parser::{flatten_killmail, select_attacker, CellValue, FlatRow, TaggedRow};
pub use ui::{ConsoleUi, Phase, SilentUi, Ui, UiApp};
