//! Planviz - headless floor-plan editor session
//!
//! Loads a plan (or seeds one from a detection summary), attaches the model's
//! named nodes, runs a short scripted edit session and writes a screenshot.

use clap::Parser;
use planviz::app::{Editor, EditorCommand, EditorEvent, ViewerHandle};
use planviz::assets::ModelAsset;
use planviz::render::{CameraPreset, HeadlessScene, PointerEvent, RenderConfig, SceneGraph};
use planviz::scene::serialization;
use planviz::scene::{DetectionSummary, EntityStore};
use planviz::ui::EditorSettings;
use std::path::PathBuf;

/// Headless floor-plan editor session
#[derive(Debug, clap::Parser)]
#[command(name = "planviz", version, about)]
struct Args {
    /// Editor settings JSON
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// glTF or GLB model whose named nodes back the detected entities
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Entity store snapshot JSON; seeded from a demo detection if absent
    #[arg(long, value_name = "FILE")]
    store: Option<PathBuf>,

    /// Directory for the screenshot and the saved plan
    #[arg(long, value_name = "DIR", default_value = ".")]
    out: PathBuf,
}

fn demo_summary() -> DetectionSummary {
    DetectionSummary {
        walls_detected: 6,
        doors_detected: 2,
        windows_detected: 3,
        rooms_detected: 2,
    }
}

fn load_store(args: &Args) -> EntityStore {
    let Some(path) = &args.store else {
        return EntityStore::from_detection(demo_summary());
    };
    match serialization::load_store_from_file(path) {
        Ok(store) => {
            log::info!("Loaded {} entities from {}", store.len(), path.display());
            store
        }
        Err(err) => {
            log::error!("Failed to load {}: {}", path.display(), err);
            EntityStore::from_detection(demo_summary())
        }
    }
}

fn load_settings(args: &Args) -> EditorSettings {
    let Some(path) = &args.settings else {
        return EditorSettings::default();
    };
    serialization::load_settings_from_file(path).unwrap_or_else(|err| {
        log::error!("Failed to load settings {}: {}", path.display(), err);
        EditorSettings::default()
    })
}

fn load_model(args: &Args, store: &EntityStore) -> ModelAsset {
    if let Some(path) = &args.model {
        match ModelAsset::load(path) {
            Ok(model) => return model,
            Err(err) => log::error!("Failed to load model {}: {}", path.display(), err),
        }
    }
    // Without an asset, stand in one node per detected entity.
    let names: Vec<String> = store.iter().map(|(_, entity)| entity.id.to_string()).collect();
    ModelAsset::from_node_names("detected", names)
}

fn run_session(editor: &mut Editor<HeadlessScene>) -> Result<(), planviz::EditorError> {
    editor.dispatch(EditorCommand::SetEditMode(true))?;
    for _ in 0..3 {
        editor.dispatch(EditorCommand::AddWall)?;
    }
    editor.dispatch(EditorCommand::UpdateSelectedColor("#d97706".into()))?;
    editor.dispatch(EditorCommand::ToggleCategoryVisibility("rooms".into()))?;

    if let Some((node, _)) = editor.scene().nodes().into_iter().next() {
        editor.pointer(PointerEvent::Enter(node));
        editor.pointer(PointerEvent::Click(node));
    }

    editor.set_top_view();
    editor.dispatch(EditorCommand::Camera(CameraPreset::Front))?;
    editor.reset_camera();
    editor.dispatch(EditorCommand::Screenshot)?;
    editor.key("Escape")?;
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("🚀 Planviz - headless floor-plan session");

    let args = Args::parse();
    let store = load_store(&args);
    let settings = load_settings(&args);
    let model = load_model(&args, &store);
    let out = args.out.clone();

    let mut editor = Editor::new(HeadlessScene::new(RenderConfig::default()), store, settings)
        .with_capture_dir(&out);
    let attached = editor.attach_model(&model);
    log::info!("Attached {} nodes from {}", attached, model.name);

    if let Err(err) = run_session(&mut editor) {
        log::error!("Session failed: {}", err);
    }

    for event in editor.drain_events() {
        match event {
            EditorEvent::ScreenshotSaved(path) => log::info!("📸 Saved {}", path.display()),
            EditorEvent::SelectionChanged(Some(selection)) => {
                log::info!("Selected {} ({})", selection.name, selection.kind_label())
            }
            EditorEvent::SelectionChanged(None) => log::info!("Selection cleared"),
            EditorEvent::Affordance(_) => {}
        }
    }

    let snapshot = out.join("plan.json");
    if let Err(err) = serialization::save_store_to_file(editor.store(), &snapshot) {
        log::error!("Failed to write {}: {}", snapshot.display(), err);
    }

    let stats = editor.scene().stats();
    log::info!(
        "Scene: {} spawned, {} despawned, {} appearance writes",
        stats.spawned,
        stats.despawned,
        stats.appearance_writes
    );
    let scene = editor.into_scene();
    log::info!("👋 Done ({} nodes left)", scene.node_count());
}
