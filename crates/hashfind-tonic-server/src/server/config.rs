use anyhow::bail;
use clap::Parser;

/// Runtime configuration for the `hashfind-tonic-server` binary.
///
/// These settings control how many searches may run at once, how far a
/// streamed search may run ahead of its client, and how long shutdown waits
/// for in-flight searches. All values are parsed from CLI arguments or
/// environment variables (a `.env` file is honored).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hashfind-tonic-server",
    version,
    about = "A gRPC service that searches for secrets whose digest resembles a name"
)]
pub struct CliArgs {
    /// Number of worker tasks, i.e. searches that may run concurrently.
    ///
    /// Every search occupies one worker until it finds its ideal match or its
    /// call ends. Further calls queue behind busy workers.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS", default_value_t = 1)]
    pub num_workers: usize,

    /// Capacity of the buffer between a streaming search and its gRPC
    /// response.
    ///
    /// With the default of one, the search blocks as soon as a single match is
    /// waiting to be written, so nothing is held back from a slow client for
    /// long.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 1)]
    pub stream_buffer_size: usize,

    /// Seconds to wait for in-flight searches to finish on shutdown before
    /// they are cancelled.
    ///
    /// Environment variable: `SHUTDOWN_TIMEOUT`
    #[arg(long, env = "SHUTDOWN_TIMEOUT", default_value_t = 3)]
    pub shutdown_timeout: usize,

    /// Address to listen on (TCP or Unix socket path; use --uds for Unix socket).
    ///
    /// Example: "127.0.0.1:50051" or "/tmp/hashfind.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("127.0.0.1:50051"))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub num_workers: usize,
    pub stream_buffer_size: usize,
    pub shutdown_timeout: usize,
    pub server_addr: String,
    pub uds: bool,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        Ok(Self {
            num_workers: args.num_workers,
            stream_buffer_size: args.stream_buffer_size,
            shutdown_timeout: args.shutdown_timeout,
            server_addr: args.server_addr,
            uds: args.uds,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            num_workers: 1,
            stream_buffer_size: 1,
            shutdown_timeout: 3,
            server_addr: String::from("127.0.0.1:50051"),
            uds: false,
        }
    }
}
