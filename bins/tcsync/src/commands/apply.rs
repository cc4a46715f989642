//! Apply command - converge everything declared in a manifest.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tcsync::{ApplyOptions, Manifest, Reconciler};

use crate::Overrides;
use crate::output::Report;

#[derive(Args)]
pub struct ApplyCmd {
    /// Manifest file (YAML, or JSON with a .json extension).
    manifest: PathBuf,

    /// Keep going after a resource fails.
    #[arg(short = 'k', long)]
    keep_going: bool,
}

impl ApplyCmd {
    pub async fn run(&self, overrides: &Overrides, options: ApplyOptions) -> anyhow::Result<Vec<Report>> {
        let manifest = Manifest::load(&self.manifest)
            .with_context(|| format!("failed to load manifest {}", self.manifest.display()))?;
        tracing::info!(
            manifest = %self.manifest.display(),
            resources = manifest.len(),
            "Loaded manifest"
        );

        // Flags given on the command line win over the manifest's settings.
        let settings = overrides.merge(manifest.settings.clone());
        let reconciler = Reconciler::system(settings);
        let options = options.continue_on_error(self.keep_going);

        let report = reconciler.apply_manifest(&manifest, &options).await;
        Ok(report
            .entries
            .iter()
            .map(|entry| Report::new(Some(entry.resource.clone()), &entry.result))
            .collect())
    }
}
