use dotenv::dotenv;
use log::{error, info, warn};
use weather_relay::{AmqpDialer, Connector, Error, HttpForwarder, Relay, RelayConfig, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RelayConfig::from_env()?;
    info!("🐹 Weather relay starting...");

    let mut connector = Connector::new(AmqpDialer, &config.broker_url, config.retry_delay);
    let connection = connector.connect().await;

    let (session, deliveries) =
        Session::open(connection, &config.queue_name, config.ack_mode).await?;
    let relay = Relay::new(HttpForwarder::new(&config.api_url)?, config.api_timeout);

    let listener = tokio::spawn(async move { relay.run(deliveries).await });
    let stop_listener = listener.abort_handle();
    info!(" [*] Waiting for messages on {}...", config.queue_name);

    let stopped = tokio::select! {
        joined = listener => match joined {
            Ok(Ok(())) => {
                warn!("Consumer stream ended");
                Ok(())
            }
            Ok(Err(e)) => {
                error!("❌ Listener stopped: {e}");
                Err(e)
            }
            Err(e) => {
                error!("❌ Listener task failed: {e}");
                Err(Error::Broker(format!("listener task failed: {e}")))
            }
        },
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("❌ Could not listen for shutdown signal: {e}");
            }
            info!("🛑 Shutting down...");
            stop_listener.abort();
            Ok(())
        }
    };

    exit_status(stopped, session.close().await)?;
    Ok(())
}

/// The listener's failure is what the process exits with; a session that
/// cannot be closed afterwards is only logged in that case.
fn exit_status(stopped: Result<(), Error>, closed: Result<(), Error>) -> Result<(), Error> {
    match (stopped, closed) {
        (Err(cause), Err(e)) => {
            error!("❌ Could not close broker session: {e}");
            Err(cause)
        }
        (Err(cause), Ok(())) => Err(cause),
        (Ok(()), closed) => closed,
    }
}
