use log::info;

use ngsflow_core::Result;
use ngsflow_vap::consts::VAP_CMD;
use ngsflow_vap::{VapRequest, aggregate};

use crate::dispatch::{Context, Stage};

///
/// Per-gene heatmap of a sample's splits through the aggregation engine.
///
pub struct Vap {
    pub request: VapRequest,
}

impl Stage for Vap {
    fn name(&self) -> &'static str {
        VAP_CMD
    }

    fn run(&mut self, context: &Context, sample: &str) -> Result<()> {
        let heatmap = aggregate(
            &context.workspace,
            context.runner,
            &context.toolbox,
            sample,
            &self.request,
        )?;
        info!("{}: {}", sample, heatmap.display());
        Ok(())
    }
}
