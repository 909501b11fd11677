//! GPU textures for decoded images, keyed like decode requests.

use std::collections::HashMap;

use eframe::egui;
use glam::Vec2;
use image::RgbaImage;

use crate::core::ImageKey;

#[derive(Default)]
pub struct TextureStore {
    textures: HashMap<ImageKey, egui::TextureHandle>,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload a bitmap, replacing any texture under `key`. Returns its pixel size.
    pub fn insert(&mut self, ctx: &egui::Context, key: ImageKey, image: &RgbaImage) -> Vec2 {
        let size = [image.width() as usize, image.height() as usize];
        let color = egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
        let name = match key {
            ImageKey::Background => "background".to_string(),
            ImageKey::Layer(id) => format!("layer-{}", id),
        };
        let handle = ctx.load_texture(name, color, egui::TextureOptions::LINEAR);
        self.textures.insert(key, handle);
        Vec2::new(size[0] as f32, size[1] as f32)
    }

    pub fn get(&self, key: ImageKey) -> Option<&egui::TextureHandle> {
        self.textures.get(&key)
    }

    pub fn remove(&mut self, key: ImageKey) {
        self.textures.remove(&key);
    }

    /// Drop layer textures whose layer is gone.
    pub fn retain_layers(&mut self, mut keep: impl FnMut(crate::entities::LayerId) -> bool) {
        self.textures.retain(|key, _| match key {
            ImageKey::Background => true,
            ImageKey::Layer(id) => keep(*id),
        });
    }
}
