//! Register a webhook for one location and print its events.
//!
//! ```sh
//! NELLO_CLIENT_ID=... NELLO_CLIENT_SECRET=... \
//!     cargo run --example listen_events -- L1 http://my-host:8080/hook
//! ```

use nello_sdk::{Auth, Nello, WebhookConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let location_id = args.next().unwrap_or_else(|| "L1".to_string());
    let url = args
        .next()
        .unwrap_or_else(|| "http://0.0.0.0:8080/hook".to_string());

    let client_id = std::env::var("NELLO_CLIENT_ID")?;
    let client_secret = std::env::var("NELLO_CLIENT_SECRET")?;

    let auth = Auth::new(client_id, client_secret)?;
    let nello = Nello::connect(auth.retrieve_token().await?);

    let location = nello.location(location_id);
    let mut events = location.events().await;

    let outcome = location
        .listen(WebhookConfig::new(url).listen(true))
        .await?;
    println!("registered: {outcome:?}");

    while let Some(event) = events.recv().await {
        println!(
            "[{}] action={:?} data={}",
            event.received_at, event.action, event.data
        );
    }

    nello.shutdown().await;
    Ok(())
}
