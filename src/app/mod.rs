//! Application module - EditorApp and its frame loop.
//!
//! - `events` - scene store events, panel intents, decode results
//! - `run` - eframe::App implementation
//! - `textures` - GPU textures for decoded images

mod events;
mod run;
pub mod textures;

use std::path::Path;

use anyhow::Result;
use eframe::egui;
use log::{debug, info, warn};

use crate::cli::Args;
use crate::core::{EventBus, ImageDecoder, SceneEventEmitter};
use crate::entities::Scene;
use crate::entities::data_url::read_file_as_data_url;
use crate::settings::EditorSettings;
use crate::widgets::layer_list::LayerListState;
use crate::widgets::preview3d::{Preview3d, PreviewView, build_preview};
use crate::widgets::stage::StageAdapter;
use crate::widgets::toolbar::{ToolbarState, fmt_meters};
use textures::TextureStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorTab {
    #[default]
    Stage,
    Preview,
}

impl EditorTab {
    pub fn label(&self) -> &'static str {
        match self {
            EditorTab::Stage => "2D editor",
            EditorTab::Preview => "3D preview",
        }
    }
}

/// Main application state.
pub struct EditorApp {
    pub settings: EditorSettings,
    pub scene: Scene,
    /// Scene store events, drained every frame
    pub event_bus: EventBus,
    pub decoder: ImageDecoder,
    pub stage: StageAdapter,
    pub textures: TextureStore,
    pub preview: Preview3d,
    pub preview_view: PreviewView,
    /// Preview is rebuilt from the scene when set
    pub preview_dirty: bool,
    pub tab: EditorTab,
    pub toolbar: ToolbarState,
    pub layer_list: LayerListState,
}

impl EditorApp {
    pub fn new(settings: EditorSettings) -> Result<Self> {
        let event_bus = EventBus::new();
        let mut scene = Scene::from_settings(&settings);
        scene.set_event_emitter(SceneEventEmitter::from_emitter(event_bus.emitter()));

        let threads = settings.decode_threads();
        info!("Image decoder: {} worker thread(s)", threads);
        let decoder = ImageDecoder::new(threads)?;

        let preview = build_preview(&scene, settings.show_light_grid);
        Ok(Self {
            stage: StageAdapter::from_settings(&settings),
            toolbar: ToolbarState::from_settings(&settings),
            layer_list: LayerListState::new(),
            textures: TextureStore::new(),
            preview,
            preview_view: PreviewView::new(),
            preview_dirty: false,
            tab: EditorTab::default(),
            settings,
            scene,
            event_bus,
            decoder,
        })
    }

    /// Wake the UI when a decode finishes off-thread.
    pub fn attach_context(&mut self, ctx: &egui::Context) {
        let ctx = ctx.clone();
        self.decoder.set_waker(move || ctx.request_repaint());
    }

    /// Load the background and layers named on the command line.
    pub fn preload(&mut self, args: &Args) {
        if let Some(w) = args.width_meters {
            self.toolbar.width_text = fmt_meters(w);
        }
        if let Some(h) = args.height_meters {
            self.toolbar.height_text = fmt_meters(h);
        }
        if let Some(size) = args.projector_size_meters {
            if self.scene.set_projector_size_meters(size) {
                self.toolbar.projector_size_text = fmt_meters(size);
            } else {
                warn!("Ignoring --projector-size {}", size);
            }
        }

        if let Some(path) = &args.background {
            let width = args.width_meters.unwrap_or(self.scene.background().width_meters());
            let height = args.height_meters.unwrap_or(self.scene.background().height_meters());
            self.load_background(path, width, height);
        }
        for path in &args.layers {
            self.load_layer(path);
        }
    }

    pub fn load_background(&mut self, path: &Path, width_meters: f32, height_meters: f32) {
        let url = match read_file_as_data_url(path) {
            Ok(url) => url,
            Err(e) => {
                warn!("Background not loaded: {:#}", e);
                return;
            }
        };
        match self.scene.set_background(Some(url), width_meters, height_meters) {
            Ok(()) => info!("Background: {} ({} x {} m)", path.display(), width_meters, height_meters),
            Err(e) => debug!("Background rejected: {}", e),
        }
    }

    pub fn load_layer(&mut self, path: &Path) {
        match read_file_as_data_url(path) {
            Ok(url) => {
                let id = self.scene.add_layer(url);
                info!("Layer {} from {}", id, path.display());
            }
            Err(e) => warn!("Layer not loaded: {:#}", e),
        }
    }
}
