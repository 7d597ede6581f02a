//! Hosts subcommand implementation.
//!
//! Handles the `edgecheck hosts` command, which prints the edge servers a
//! probe run would target without probing them.

use super::{load_topology, Context};
use crate::discovery::TargetSelection;
use crate::error::CliResult;
use crate::output;
use crate::types::Host;
use clap::Parser;
use std::path::PathBuf;

/// List edge servers from the topology.
#[derive(Parser, Debug, Default)]
pub struct HostsCommand {
    /// Only list the edge servers of this site
    #[arg(short = 's', long, value_name = "NAME")]
    pub site: Option<String>,

    /// Topology document to read
    #[arg(long, value_name = "PATH", env = "EDGECHECK_TOPOLOGY")]
    pub topology: Option<PathBuf>,
}

impl HostsCommand {
    /// Execute the hosts command.
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        let hosts = self.discover(ctx).await?;

        if ctx.verbose {
            output::print_info(&format!("{} edge servers", hosts.len()));
        }
        output::print_hosts(&hosts);
        Ok(())
    }

    pub async fn discover(&self, ctx: &Context) -> CliResult<Vec<Host>> {
        let topology = load_topology(self.topology.as_deref(), &ctx.settings)?;
        let selection = TargetSelection::Topology {
            site: self.site.clone(),
        };

        Ok(selection.resolve(&topology).await?)
    }
}
