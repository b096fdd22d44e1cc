//! Glint configuration: color pipeline variant, prepass policy, swapchain.

/// Which forward color pipeline a renderer instance uses. The two variants
/// have incompatible bind group layouts and are never interchangeable at
/// draw time; selecting one here fixes the layout for the whole renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PipelineKind {
    /// Linear-depth prepass + manual per-fragment comparison (discard on
    /// ties and farther fragments).
    #[default]
    ManualDepth,
    /// Fixed-function depth test only; no prepass is encoded.
    Plain,
}

/// Write policy for the linear-depth prepass when geometry overlaps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrepassDepthPolicy {
    /// Hardware depth test on an auxiliary Depth32Float buffer; the stored
    /// distance is the nearest surface along the camera ray. Deterministic.
    #[default]
    NearestWins,
    /// No depth attachment; the stored distance is whatever fragment was
    /// rasterized last. Not portable across hardware, but cheaper.
    LastWriteWins,
}

/// Glint renderer and bridge configuration.
#[derive(Clone, Debug)]
pub struct GlintConfig {
    /// Forward color pipeline variant.
    pub pipeline_kind: PipelineKind,
    /// Overlap policy for the prepass target.
    pub prepass_policy: PrepassDepthPolicy,
    /// Value the linear-depth target is cleared to at the start of each
    /// frame. Must exceed any real surface distance so the strict `<`
    /// comparison accepts the first surface at a pixel.
    pub clear_distance: f32,
    /// Swapchain texture format for present (e.g. Rgba8Unorm or Bgra8Unorm).
    pub swapchain_format: wgpu::TextureFormat,
}

impl Default for GlintConfig {
    fn default() -> Self {
        Self {
            pipeline_kind: PipelineKind::default(),
            prepass_policy: PrepassDepthPolicy::default(),
            clear_distance: f32::MAX,
            swapchain_format: wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clear_distance_rejects_nothing() {
        let config = GlintConfig::default();
        // Any representable surface distance passes strict < against it.
        assert!(1.0e30f32 < config.clear_distance);
    }
}
