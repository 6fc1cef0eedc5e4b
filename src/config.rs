use crate::infrastructure::sandbox::SandboxGateway;
use clap::Parser;
use std::path::PathBuf;

/// Process configuration, from command-line flags with environment
/// fallbacks.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Input remit requests CSV file
    pub input: PathBuf,

    /// Path to persistent history database (optional). If provided, uses RocksDB.
    #[arg(long, env = "REMITGW_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "REMITGW_LOG", default_value = "warn")]
    pub log_level: String,

    /// Sandbox partner fee, in basis points of the principal
    #[arg(long, default_value_t = 0)]
    pub fee_bps: u64,

    /// Sandbox tax, in basis points of the fee
    #[arg(long, default_value_t = 0)]
    pub tax_bps: u64,

    /// Partner code the sandbox gateway rejects (repeatable)
    #[arg(long = "reject-partner")]
    pub reject_partners: Vec<String>,
}

impl Config {
    pub fn sandbox_gateway(&self) -> SandboxGateway {
        self.reject_partners
            .iter()
            .fold(SandboxGateway::new(self.fee_bps, self.tax_bps), |gw, code| {
                gw.reject_partner(code)
            })
    }
}
