//! One-shot render capture.
//!
//! The compositing engine is an external collaborator consumed through the
//! [`Compositor`] and [`Surface`] traits, so the orchestration in
//! [`one_shot`] never touches a concrete UI primitive and stays portable
//! when the concrete resource type changes.

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc;

pub mod one_shot;
pub mod render;

pub use render::capture_once;
pub use one_shot::OneShotError;

/// Describes the scoped, temporary surface a capture runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurfaceDescriptor {
    /// Identifier the compositor addresses the surface by.
    pub surface_id: String,
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
}

/// Display properties applied to the surface before rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayProperties {
    /// Lower bound of the displayed value range.
    pub lower: f64,
    /// Upper bound of the displayed value range.
    pub upper: f64,
}

/// The copied result of one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedFrame {
    /// Identifier of the surface the frame was captured from.
    pub surface_id: String,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw frame pixels.
    pub pixels: Bytes,
}

/// Receiver for "rendered" notifications from a surface's owning element.
///
/// The source is at-least-once: it may fire again after the first
/// notification, and the orchestrator enforces exactly-once semantics on
/// top of it.
pub type RenderedSignal = mpsc::UnboundedReceiver<()>;

/// Capture failures.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The compositor rejected an operation.
    #[error("compositor error: {0}")]
    Compositor(String),

    /// The requested surface does not exist or is not enabled.
    #[error("surface '{0}' unavailable")]
    SurfaceUnavailable(String),

    /// The draw itself failed.
    #[error("render failed: {0}")]
    Render(String),

    /// Orchestration failed (timeout, closed notification source, or a
    /// wrapped stage failure).
    #[error(transparent)]
    OneShot(#[from] OneShotError),
}

/// External rendering engine, consumed by interface only.
pub trait Compositor: Send + Sync {
    /// The surface type this compositor produces.
    type Surface: Surface;

    /// Create and enable a surface for `descriptor`.
    fn enable(&self, descriptor: &SurfaceDescriptor) -> Result<(), CaptureError>;

    /// Look up an enabled surface.
    fn surface(&self, surface_id: &str) -> Result<Self::Surface, CaptureError>;

    /// Dispose of an enabled surface. Idempotent from the compositor's view;
    /// the orchestrator guarantees it is called exactly once per capture.
    fn disable(&self, surface_id: &str);
}

/// One enabled compositing surface.
pub trait Surface: Send {
    /// Hand the payload to the surface for drawing.
    fn render_payload(&mut self, payload: &Bytes) -> Result<(), CaptureError>;

    /// Apply display properties before the draw.
    fn set_display_properties(&mut self, properties: &DisplayProperties);

    /// Trigger the asynchronous draw. Completion arrives via the
    /// [`RenderedSignal`], not a return value.
    fn render(&mut self);

    /// Subscribe to "rendered" notifications for this surface.
    fn rendered(&mut self) -> RenderedSignal;

    /// Copy the current frame out of the surface.
    fn capture(&self) -> Result<CapturedFrame, CaptureError>;
}
