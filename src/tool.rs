// Represents a subcommand of rqr.
pub trait Tool {
    // The contribution of this tool to the rqr CLI. The clap::Command
    // returned here will be set up as a subcommand on the rqr binary.
    fn cli() -> clap::Command;

    // Run the tool. All the context that the tool requires should come
    // from the cli above.
    fn execute(&self) -> anyhow::Result<Option<Output>>;
}

#[derive(Debug)]
pub enum Output {
    // Raw bytes, such as a PNG written to stdout.
    Bytes(Vec<u8>),
    JsonValue(serde_json::Value),
}
