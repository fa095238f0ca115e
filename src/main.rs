use std::panic;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use testpoint_harness::{
    config::{Cli, ProbeKind},
    core::{
        pipeline::execution::ExecutionPipeline, sampler::ResourceSampler,
        traits::probe::MemoryProbe,
    },
    native::probe::ProcessMemoryProbe,
    report::JsonReporter,
    stubs::runtime::RuntimeStub,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("testpoint_harness=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    let cli = Cli::parse();
    let config = cli.harness_config()?;
    let request = cli.request(&config).await?;

    let runtime = Arc::new(RuntimeStub::new());
    let probe: Arc<dyn MemoryProbe> = match cli.probe {
        ProbeKind::Runtime => runtime.clone(),
        ProbeKind::Process => Arc::new(ProcessMemoryProbe::new()?),
    };

    let reporter = JsonReporter::new(std::io::stdout());
    let pipeline = ExecutionPipeline::new(request, runtime, ResourceSampler::new(probe), config);
    pipeline.run_and_report(&reporter).await;

    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
