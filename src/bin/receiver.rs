use flit::config::Config;
use flit::connection::{Connection, Role};
use flit::result::FlitResult;

#[tokio::main]
async fn main() -> FlitResult<()> {
    tracing_subscriber::fmt::init();

    let config = Config::receiver();
    let mut connection = Connection::new(Role::Server, config).await?;

    // a timeout here is the normal end of the transfer, not a failure
    connection.receive_packets().await
}
