//! Render a payload to a temporary surface and capture the result once.

use crate::capture::one_shot::{run_one_shot, OneShotError};
use crate::capture::{
    CaptureError, CapturedFrame, Compositor, DisplayProperties, Surface, SurfaceDescriptor,
};
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, Instrument};

/// Render `payload` on a temporary surface and capture the first rendered
/// frame.
///
/// The surface is enabled for this call only: the "rendered" subscription is
/// released and the surface disposed exactly once, whether the capture
/// succeeds, the draw notification never arrives within `timeout`, or the
/// frame copy fails. Duplicate notifications from the compositor are
/// ignored; the result is always the first capture.
pub async fn capture_once<C: Compositor>(
    compositor: &C,
    descriptor: &SurfaceDescriptor,
    payload: Bytes,
    properties: Option<DisplayProperties>,
    timeout: Option<Duration>,
) -> Result<CapturedFrame, CaptureError> {
    let span = tracing::info_span!("capture_once", surface_id = %descriptor.surface_id);
    capture_inner(compositor, descriptor, payload, properties, timeout)
        .instrument(span)
        .await
}

async fn capture_inner<C: Compositor>(
    compositor: &C,
    descriptor: &SurfaceDescriptor,
    payload: Bytes,
    properties: Option<DisplayProperties>,
    timeout: Option<Duration>,
) -> Result<CapturedFrame, CaptureError> {
    let frame = run_one_shot(
        timeout,
        || {
            compositor
                .enable(descriptor)
                .map_err(|e| OneShotError::Setup(e.to_string()))?;
            compositor
                .surface(&descriptor.surface_id)
                .map_err(|e| OneShotError::Setup(e.to_string()))
        },
        |surface| surface.rendered(),
        |surface| {
            surface
                .render_payload(&payload)
                .map_err(|e| OneShotError::Trigger(e.to_string()))?;
            if let Some(properties) = &properties {
                surface.set_display_properties(properties);
            }
            surface.render();
            Ok(())
        },
        |surface| {
            surface
                .capture()
                .map_err(|e| OneShotError::Notify(e.to_string()))
        },
        |surface| {
            drop(surface);
            compositor.disable(&descriptor.surface_id);
        },
    )
    .await?;

    debug!(
        width = frame.width,
        height = frame.height,
        "frame captured"
    );
    Ok(frame)
}
