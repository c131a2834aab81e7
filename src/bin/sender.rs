use flit::config::Config;
use flit::connection::{Connection, Role};
use flit::result::FlitResult;

#[tokio::main]
async fn main() -> FlitResult<()> {
    tracing_subscriber::fmt::init();

    let config = Config::sender();
    let mut connection = Connection::new(Role::Client, config.clone()).await?;

    for _ in 0..config.max_streams {
        let id = connection.open_stream(true)?;
        connection.add_file_to_stream(id, &config.file_path).await?;
    }

    connection.send_packets().await
}
