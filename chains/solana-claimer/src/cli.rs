use crate::config::DEFAULT_CONFIG_PATH;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Check, claim and drain a folder of Solana wallets", long_about = None)]
pub struct Cli {
    /// Configuration file; missing files fall back to the environment
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Show debug logs on the console
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check claim eligibility per wallet and display valid and total sum
    Check {
        /// Save the eligible wallets for `claim`
        #[arg(long)]
        execute: bool,
    },
    /// Claim the airdrop for the drop wallets
    Claim {
        /// Send the claim transactions (dry run otherwise)
        #[arg(long)]
        execute: bool,
    },
    /// Drain wallet balances {base, quote, tokens, sol}
    Drain(DrainArgs),
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainArgs {
    /// Drain the base token
    #[arg(long)]
    pub base: bool,
    /// Drain the quote token
    #[arg(long)]
    pub quote: bool,
    /// Drain both base and quote
    #[arg(long)]
    pub tokens: bool,
    /// Drain native SOL above the fee reserve
    #[arg(long)]
    pub sol: bool,
}

impl DrainArgs {
    pub fn drain_base(&self) -> bool {
        self.base || self.tokens
    }

    pub fn drain_quote(&self) -> bool {
        self.quote || self.tokens
    }

    pub fn any(&self) -> bool {
        self.drain_base() || self.drain_quote() || self.sol
    }
}
