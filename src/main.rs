use anyhow::Result;
use termai::api::ApiClient;
use termai::app::Session;
use termai::config::Config;
use termai::terminal::{read_kitty_selection, TerminalFrontend};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let client = ApiClient::new(&config);
    let frontend = TerminalFrontend::new()?;
    println!("Fetching models...");
    let seed = config
        .seed_from_selection
        .then(read_kitty_selection)
        .flatten();

    let mut session = Session::start(client, &config, frontend)
        .await?
        .with_seed_input(seed);
    session.run().await?;

    Ok(())
}
