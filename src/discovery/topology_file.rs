//! Topology document stored as JSON.
//!
//! ```json
//! {
//!   "sites": [
//!     {
//!       "name": "Dublin",
//!       "pools": [
//!         { "fqdn": "edgepool.dub.example.com",
//!           "servers": ["edge1.dub.example.com", "edge2.dub.example.com"] },
//!         { "fqdn": "edge3.dub.example.com" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! A pool without a server list is a single edge server named by its FQDN.

use super::TopologySource;
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::types::Host;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyFile {
    #[serde(default)]
    pub sites: Vec<Site>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    #[serde(default)]
    pub pools: Vec<EdgePool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgePool {
    pub fqdn: Host,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Host>,
}

impl EdgePool {
    /// Edge servers in this pool, in document order.
    pub fn edge_servers(&self) -> Vec<Host> {
        if self.servers.is_empty() {
            vec![self.fqdn.clone()]
        } else {
            self.servers.clone()
        }
    }
}

impl Site {
    /// Compare against a filter such as `Dublin` or `site:Dublin`.
    pub fn matches(&self, filter: &str) -> bool {
        let filter = filter.trim();
        let filter = match filter.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("site:") => &filter[5..],
            _ => filter,
        };
        self.name.eq_ignore_ascii_case(filter)
    }
}

impl TopologyFile {
    /// Load a topology document from disk.
    pub fn load(path: &Path) -> DiscoveryResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DiscoveryError::TopologyUnavailable(format!("{}: {}", path.display(), e))
        })?;

        content.parse()
    }

    /// Edge servers of the matching sites, or of every site when `site` is `None`.
    pub fn edge_servers_for(&self, site: Option<&str>) -> DiscoveryResult<Vec<Host>> {
        let sites: Vec<&Site> = match site {
            Some(filter) => {
                let matched: Vec<&Site> = self.sites.iter().filter(|s| s.matches(filter)).collect();
                if matched.is_empty() {
                    return Err(DiscoveryError::SiteNotFound(filter.to_string()));
                }
                matched
            }
            None => self.sites.iter().collect(),
        };

        Ok(sites
            .into_iter()
            .flat_map(|s| s.pools.iter())
            .flat_map(EdgePool::edge_servers)
            .collect())
    }
}

impl std::str::FromStr for TopologyFile {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(|e| DiscoveryError::InvalidTopology(e.to_string()))
    }
}

#[async_trait]
impl TopologySource for TopologyFile {
    async fn edge_servers(&self, site: Option<&str>) -> DiscoveryResult<Vec<Host>> {
        self.edge_servers_for(site)
    }
}
