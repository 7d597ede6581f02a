//! Target discovery.
//!
//! Targets come either from an explicit host list or from a topology source
//! queried with an optional site filter. The probe engine only ever sees the
//! resulting ordered list of hosts.

mod topology_file;

pub use topology_file::{EdgePool, Site, TopologyFile};

use crate::error::{ConfigError, DiscoveryError, DiscoveryResult};
use crate::types::{Host, HostList, TargetError};
use async_trait::async_trait;

/// A directory of edge servers.
#[async_trait]
pub trait TopologySource: Send + Sync {
    /// Edge servers of the sites matching `site`, or of every site.
    async fn edge_servers(&self, site: Option<&str>) -> DiscoveryResult<Vec<Host>>;
}

/// How the run's targets are chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    /// Hosts named by the operator.
    Explicit(Vec<Host>),
    /// Edge servers from the topology, optionally limited to one site.
    Topology { site: Option<String> },
}

/// Errors building a `TargetSelection` from raw arguments.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error(transparent)]
    Conflict(#[from] ConfigError),
    #[error(transparent)]
    Target(#[from] TargetError),
}

impl TargetSelection {
    /// Build a selection from the `--targets` and `--site` arguments.
    pub fn from_args(targets: Option<&str>, site: Option<&str>) -> Result<Self, SelectionError> {
        match (targets, site) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingSelection.into()),
            (Some(list), None) => {
                let hosts: HostList = list.parse()?;
                Ok(Self::Explicit(hosts.into_vec()))
            }
            (None, site) => Ok(Self::Topology {
                site: site.map(str::to_string),
            }),
        }
    }

    pub fn needs_topology(&self) -> bool {
        matches!(self, Self::Topology { .. })
    }

    /// Produce the ordered target list.
    ///
    /// A topology query that yields nothing is an error: there is nothing to probe.
    pub async fn resolve(self, source: &dyn TopologySource) -> DiscoveryResult<Vec<Host>> {
        match self {
            Self::Explicit(hosts) => Ok(hosts),
            Self::Topology { site } => {
                let hosts = source.edge_servers(site.as_deref()).await?;
                if hosts.is_empty() {
                    return Err(DiscoveryError::NoHosts(site));
                }
                tracing::info!(
                    count = hosts.len(),
                    site = site.as_deref().unwrap_or("*"),
                    "discovered edge servers"
                );
                Ok(hosts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unavailable;

    #[async_trait]
    impl TopologySource for Unavailable {
        async fn edge_servers(&self, _site: Option<&str>) -> DiscoveryResult<Vec<Host>> {
            Err(DiscoveryError::TopologyUnavailable("offline".to_string()))
        }
    }

    fn topology() -> TopologyFile {
        r#"{"sites":[
            {"name":"Dublin","pools":[{"fqdn":"edge1.dub.example.com"}]},
            {"name":"Empty"}
        ]}"#
        .parse()
        .unwrap()
    }

    #[test]
    fn test_conflicting_selection() {
        assert!(matches!(
            TargetSelection::from_args(Some("edge1"), Some("Dublin")),
            Err(SelectionError::Conflict(ConfigError::ConflictingSelection))
        ));
    }

    #[test]
    fn test_selection_from_args() {
        assert_eq!(
            TargetSelection::from_args(Some("edge1, edge2"), None).unwrap(),
            TargetSelection::Explicit(vec![
                Host::parse("edge1").unwrap(),
                Host::parse("edge2").unwrap()
            ])
        );
        assert_eq!(
            TargetSelection::from_args(None, Some("Dublin")).unwrap(),
            TargetSelection::Topology {
                site: Some("Dublin".to_string())
            }
        );
        assert!(TargetSelection::from_args(None, None)
            .unwrap()
            .needs_topology());
        assert!(matches!(
            TargetSelection::from_args(Some("bad host!"), None),
            Err(SelectionError::Target(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_selection_skips_topology() {
        let selection = TargetSelection::Explicit(vec![Host::parse("edge9").unwrap()]);
        let hosts = selection.resolve(&Unavailable).await.unwrap();
        assert_eq!(hosts.len(), 1);
    }

    #[tokio::test]
    async fn test_topology_selection() {
        let selection = TargetSelection::Topology {
            site: Some("dublin".to_string()),
        };
        let hosts = selection.resolve(&topology()).await.unwrap();
        assert_eq!(hosts, vec![Host::parse("edge1.dub.example.com").unwrap()]);
    }

    #[tokio::test]
    async fn test_empty_topology_is_fatal() {
        let selection = TargetSelection::Topology {
            site: Some("Empty".to_string()),
        };
        let err = selection.resolve(&topology()).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::NoHosts(Some(site)) if site == "Empty"));
    }

    #[tokio::test]
    async fn test_topology_failure_propagates() {
        let selection = TargetSelection::Topology { site: None };
        tokio_test::assert_err!(selection.resolve(&Unavailable).await);
    }
}
