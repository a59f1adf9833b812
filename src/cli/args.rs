use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use stripemd::fid::Fid;

use crate::cli::validation::{parse_hash_type, parse_stripe};

#[derive(Parser, Debug)]
#[command(name = "stripemd")]
#[command(
    version,
    about = "Inspect metadata routing for a sharded filesystem namespace"
)]
pub struct Args {
    #[arg(long, global = true, help = "Path to the cluster config file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Show which shard and stripe a directory entry routes to")]
    Route {
        #[arg(long, help = "Fid of the parent directory")]
        parent: Fid,

        #[arg(long, help = "Entry name")]
        name: String,

        #[arg(
            long = "stripe",
            value_parser = parse_stripe,
            help = "Stripe of a striped parent as FID@SHARD, in stripe order"
        )]
        stripes: Vec<(Fid, u32)>,

        #[arg(
            long,
            value_parser = parse_hash_type,
            default_value = "fnv_1a_64",
            help = "Directory hash type (name or raw value)"
        )]
        hash_type: u32,

        #[arg(long, help = "JSON output")]
        json: bool,
    },
    #[command(about = "Show the shard owning a fid")]
    Locate {
        #[arg(help = "Fid, e.g. [0x200000400:0x1:0x0]")]
        fid: Fid,

        #[arg(long, help = "JSON output")]
        json: bool,
    },
    #[command(about = "Encode or decode export file handles")]
    Fh {
        #[command(subcommand)]
        action: FhAction,
    },
    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    #[command(about = "Check the cluster configuration for problems")]
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum FhAction {
    #[command(about = "Build a handle for a fid")]
    Encode {
        #[arg(long)]
        fid: Fid,

        #[arg(long, value_enum, default_value_t = ObjectKind::File)]
        mode: ObjectKind,

        #[arg(long, help = "Parent directory to embed in the handle")]
        parent: Option<Fid>,
    },
    #[command(about = "Print the fids inside a handle")]
    Decode {
        #[arg(help = "Handle as TYPE:WORD,WORD,...")]
        handle: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    #[command(about = "Show current configuration values")]
    Show,
    #[command(about = "Show config file path")]
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Dir,
    File,
}

impl ObjectKind {
    pub fn mode(self) -> u32 {
        match self {
            ObjectKind::Dir => libc::S_IFDIR as u32,
            ObjectKind::File => libc::S_IFREG as u32,
        }
    }
}
