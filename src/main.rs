//! `protein-explorer <PDB_ID | URL | PATH> [OPTIONS.toml]`
//!
//! Runs one viewer generation against the headless engine: looks up
//! metadata for identifiers, resolves the structure source (backend first,
//! public mirror as fallback), downloads and checks it, and reports the
//! final view state. Exits non-zero when the load ends in an error.

use std::path::Path;

use protein_explorer::engine::headless::HeadlessEngine;
use protein_explorer::http::BackendClient;
use protein_explorer::{
    ControllerBuilder, ExplorerError, LoadOutcome, LoadRequest, Options,
    Phase, RegionSize,
};

const REGION: RegionSize = RegionSize::new(1280, 720);

fn load_options(path: Option<&str>) -> Result<Options, ExplorerError> {
    path.map_or_else(|| Ok(Options::default()), |p| Options::load(Path::new(p)))
}

fn is_pdb_id(input: &str) -> bool {
    input.len() == 4 && input.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Prefer the backend's `fileUrl` for identifiers; otherwise let the
/// resolver probe and fall back.
fn request_for(input: &str, client: &BackendClient) -> LoadRequest {
    if !is_pdb_id(input) || Path::new(input).exists() {
        return LoadRequest::from_file(input);
    }
    match client.fetch_metadata(input) {
        Ok(meta) => {
            log::info!("structure metadata:\n{meta}");
            meta.load_request()
                .unwrap_or_else(|| LoadRequest::from_identifier(input))
        }
        Err(e) => {
            log::warn!("no metadata for {input}: {e}");
            LoadRequest::from_identifier(input)
        }
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        log::error!("Usage: protein-explorer <PDB_ID | URL | PATH> [OPTIONS.toml]");
        std::process::exit(2);
    };

    let options = match load_options(args.next().as_deref()) {
        Ok(options) => options,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };
    let client = match BackendClient::new(&options.backend) {
        Ok(client) => client,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };
    match client.hello() {
        Ok(greeting) => log::info!("backend says: {}", greeting.message),
        Err(e) => log::warn!(
            "backend at {} unreachable: {e}",
            client.endpoints().base()
        ),
    }

    let request = request_for(&input, &client);
    let engine = HeadlessEngine::new(&options.backend);
    let controller = match ControllerBuilder::new()
        .with_options(options)
        .with_region_size(REGION)
        .build(engine, client)
    {
        Ok(controller) => controller,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };

    let outcome = pollster::block_on(controller.start(request));
    if let LoadOutcome::Ready { source, .. } = &outcome {
        let summary = controller
            .live_session()
            .and_then(|session| session.engine())
            .and_then(|engine| engine.structure());
        if let Some(summary) = summary {
            log::info!(
                "{source} ({:?}): {} atoms in {} model(s), {}",
                source.origin(),
                summary.atoms,
                summary.models,
                summary.format
            );
        }
    }

    let state = controller.view_state();
    if let Some(overlay) = state.overlay_text() {
        log::error!("{overlay}");
    }
    controller.dispose();
    if state.phase == Phase::Error {
        std::process::exit(1);
    }
}
