use clap::Parser;
use ring_storage::config::NodeConfig;
use ring_storage::membership::types::NodeId;
use ring_storage::server::{self, ServerLimits};
use ring_storage::storage::node::StorageNode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ring-storage-node", about = "Storage node of a fixed replicated ring")]
struct Args {
    /// Id of this node in the ring (1..=N).
    #[arg(long, env = "RING_NODE_ID")]
    node_id: u32,

    /// Port to listen on; overrides the configured address of this node.
    #[arg(long, env = "RING_PORT")]
    port: Option<u16>,

    /// TOML config file. Without one the classic five-node localhost ring is used.
    #[arg(long, env = "RING_CONFIG")]
    config: Option<PathBuf>,

    /// Parent directory of the per-node data directories.
    #[arg(long, env = "RING_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let node_id = NodeId(args.node_id);

    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(port) = args.port {
        config.set_port(node_id, port);
    }

    let bind_addr = config
        .endpoint(node_id)
        .map(|endpoint| endpoint.addr)
        .ok_or_else(|| anyhow::anyhow!("node {} is not in the configured ring", node_id))?;

    let node = StorageNode::from_config(&config, node_id).await?;
    let limits = ServerLimits::from(&config);

    tracing::info!("Node {} listening on {}", node_id, bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    server::serve(listener, node, &limits).await?;

    Ok(())
}
