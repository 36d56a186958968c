use std::path::Path;

use anyhow::Result;
use tracing::info;
use wfr_oozie::OozieClient;
use wfr_scheduler::{FsProvisioner, PathProvisioner, SchedulerClient};

use crate::dependencies::DependencyResolver;
use crate::poller::{CancelToken, Poller};
use crate::walker::{HierarchyWalker, WalkerSettings};
use crate::Config;

/// Everything a reconciliation run talks to, built from one configuration.
pub struct Session {
    pub cfg: Config,
    pub client: Box<dyn SchedulerClient>,
    pub provisioner: Box<dyn PathProvisioner>,
    pub cancel: CancelToken,
}

impl Session {
    /// Loads `cfg_path` (defaults when absent) and connects to the configured scheduler.
    pub fn open(cfg_path: &Path) -> Result<Self> {
        let cfg = Config::load_or_default(cfg_path)?;
        let client = OozieClient::new(&cfg.scheduler.url, cfg.scheduler.timeout())?;
        let provisioner = FsProvisioner::new(cfg.provisioning_root()?);
        info!(scheduler = %cfg.scheduler.url, "session opened");
        Ok(Self::with_parts(cfg, Box::new(client), Box::new(provisioner)))
    }

    pub fn with_parts(cfg: Config, client: Box<dyn SchedulerClient>, provisioner: Box<dyn PathProvisioner>) -> Self {
        Self { cfg, client, provisioner, cancel: CancelToken::new() }
    }

    /// Writes a default configuration unless one exists. Returns whether a file was written.
    pub fn init_config(cfg_path: &Path) -> Result<bool> {
        if cfg_path.exists() {
            return Ok(false);
        }
        Config::default().save_to(cfg_path)?;
        Ok(true)
    }

    pub fn walker(&self) -> HierarchyWalker<'_> {
        HierarchyWalker::new(
            self.client.as_ref(),
            Poller::with_cancel(self.cancel.clone()),
            WalkerSettings::from(&self.cfg),
        )
    }

    pub fn resolver<'w, 'a>(&'w self, walker: &'w HierarchyWalker<'a>) -> DependencyResolver<'w, 'a> {
        DependencyResolver::new(walker, self.provisioner.as_ref())
    }
}
