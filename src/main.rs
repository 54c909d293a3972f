use pocketnavi::{Config, run};

fn main() -> anyhow::Result<()> {
    // Config errors are reported by `run` once logging is up.
    let worker_threads = Config::load()
        .map(|config| config.general.worker_threads)
        .unwrap_or_default();

    let mut runtime = tokio::runtime::Builder::new_multi_thread();
    runtime.enable_all();
    if worker_threads > 0 {
        runtime.worker_threads(worker_threads);
    }

    runtime.build()?.block_on(run())
}
