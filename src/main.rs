mod client;
mod settings;
mod table;
mod transport;

use color_eyre::Result;
use log::{error, info};
use tokio::sync::mpsc::unbounded_channel;

use client::Client;
use settings::Settings;

fn main() -> Result<()> {
    color_eyre::install()?;

    let settings = Settings::load()?;
    // The terminal belongs to the board, so logs go to a file
    simple_logging::log_to_file(&settings.log_file, settings.log_level())?;
    info!("Joining room {} at {} as {}", settings.room_id, settings.server_addr, settings.player_id);

    let runtime = tokio::runtime::Runtime::new()?;
    let (inbound_sender, inbound_receiver) = unbounded_channel();
    let (outbound_sender, outbound_receiver) = unbounded_channel();

    let addr = settings.server_addr.clone();
    let hello = settings.hello();
    runtime.spawn(async move {
        if let Err(e) = transport::run(addr, hello, inbound_sender, outbound_receiver).await {
            error!("Transport stopped: {e:#}");
        }
    });

    let client = Client::launch(settings.player_id, settings.cell_metrics(), inbound_receiver, outbound_sender);
    let result = client.run();

    runtime.shutdown_background();
    result
}
