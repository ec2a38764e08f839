use presentation::viewer::PointCloudFrame;

use crate::camera::Camera3D;
use crate::{HostError, RenderHost, RenderStats, Viewport};

/// A visible point as it would be submitted to the GPU.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawPoint {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Headless point-cloud scene.
///
/// Visibility is honoured per point from the frame's mask; hidden points
/// are left out of the draw list instead of being culled in a shader.
#[derive(Debug, Default)]
pub struct SceneHost {
    camera: Camera3D,
    viewport: Option<Viewport>,
    frame: Option<PointCloudFrame>,
    draw_list: Vec<DrawPoint>,
    stats: RenderStats,
}

impl SceneHost {
    pub fn new(camera: Camera3D) -> Self {
        Self {
            camera,
            ..Self::default()
        }
    }

    pub fn camera(&self) -> &Camera3D {
        &self.camera
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn frame(&self) -> Option<&PointCloudFrame> {
        self.frame.as_ref()
    }

    /// Points submitted by the most recent render.
    pub fn draw_list(&self) -> &[DrawPoint] {
        &self.draw_list
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }
}

impl RenderHost for SceneHost {
    type Data = PointCloudFrame;

    fn initialize(&mut self, viewport: Viewport) -> Result<(), HostError> {
        if self.viewport.is_some() {
            return Ok(());
        }
        let viewport = viewport.validate()?;
        self.camera.set_aspect(viewport.aspect());
        self.viewport = Some(viewport);
        tracing::debug!(width = viewport.width, height = viewport.height, "scene initialized");
        Ok(())
    }

    fn set_data(&mut self, data: PointCloudFrame) {
        self.frame = Some(data);
    }

    fn resize(&mut self, viewport: Viewport) -> Result<(), HostError> {
        if self.viewport.is_none() {
            return Err(HostError::NotInitialized);
        }
        let viewport = viewport.validate()?;
        self.camera.set_aspect(viewport.aspect());
        self.viewport = Some(viewport);
        Ok(())
    }

    fn render(&mut self) -> Result<RenderStats, HostError> {
        if self.viewport.is_none() {
            return Err(HostError::NotInitialized);
        }
        self.draw_list.clear();
        let mut hidden = 0;
        if let Some(frame) = &self.frame {
            for ((position, color), visible) in frame
                .positions
                .iter()
                .zip(&frame.colors)
                .zip(&frame.visible)
            {
                if *visible {
                    self.draw_list.push(DrawPoint {
                        position: *position,
                        color: *color,
                    });
                } else {
                    hidden += 1;
                }
            }
        }
        self.stats.renders += 1;
        self.stats.last_drawn = self.draw_list.len();
        self.stats.last_hidden = hidden;
        Ok(self.stats)
    }

    fn dispose(&mut self) {
        self.viewport = None;
        self.frame = None;
        self.draw_list.clear();
    }

    fn is_initialized(&self) -> bool {
        self.viewport.is_some()
    }
}
