pub mod decks;
pub mod delete;
pub mod due;
pub mod edit;
pub mod import;
pub mod stats;
pub mod study;

use hanzi_srs::commands::CommandError;

use crate::OutputFormat;

/// Report a command error in the requested format and hand it back for exit
pub fn fail(err: CommandError, format: &OutputFormat, context: &'static str) -> anyhow::Error {
    if let OutputFormat::Json = format {
        let output = serde_json::json!({ "error": &err });
        println!("{}", output);
    }
    anyhow::Error::new(err).context(context)
}
