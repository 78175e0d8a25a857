use fireline_shared::compass::EntryHeading;
use fireline_shared::models::{AssetCategory, AssetMarker, Coordinates};

/// What to draw, independent of how it looks.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDescriptor {
    pub category: AssetCategory,
    pub direction: EntryHeading,
    pub coordinates: Coordinates,
}

impl From<&AssetMarker> for MarkerDescriptor {
    fn from(m: &AssetMarker) -> Self {
        MarkerDescriptor {
            category: m.category,
            direction: m.facing.clone(),
            coordinates: m.coordinates,
        }
    }
}

/// A descriptor resolved to a concrete visual asset.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerVisual {
    pub descriptor: MarkerDescriptor,
    pub icon: String,
    pub label: String,
}

/// Maps marker descriptors to visual assets. Swap it to change icon sets.
pub trait IconResolver {
    fn icon_for(&self, descriptor: &MarkerDescriptor) -> String;

    fn resolve(&self, marker: &AssetMarker) -> MarkerVisual {
        let descriptor = MarkerDescriptor::from(marker);
        MarkerVisual {
            icon: self.icon_for(&descriptor),
            descriptor,
            label: marker.label.clone(),
        }
    }
}

/// Directional PNGs named `<category>-<direction>.png` under a base path.
#[derive(Debug, Clone)]
pub struct ImageIcons {
    base: String,
}

impl ImageIcons {
    pub fn new(base: impl Into<String>) -> Self {
        ImageIcons { base: base.into() }
    }
}

impl Default for ImageIcons {
    fn default() -> Self {
        ImageIcons::new("/images")
    }
}

impl IconResolver for ImageIcons {
    fn icon_for(&self, descriptor: &MarkerDescriptor) -> String {
        format!(
            "{}/{}-{}.png",
            self.base.trim_end_matches('/'),
            descriptor.category.slug(),
            descriptor.direction.slug()
        )
    }
}
