//! One-shot capture scenarios against a fake compositor.
//!
//! The fake queues its "rendered" notifications eagerly at render time, which
//! lets the tests simulate an at-least-once notification source and verify
//! the exactly-once capture and cleanup guarantees on top of it.

use blobfetch::{
    capture_once, CaptureError, CapturedFrame, Compositor, DisplayProperties, OneShotError,
    Surface, SurfaceDescriptor,
};
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct Shared {
    enables: AtomicUsize,
    disables: AtomicUsize,
    captures: AtomicUsize,
    applied_properties: Mutex<Option<DisplayProperties>>,
    /// How many rendered notifications one `render` call produces.
    notifications_per_render: usize,
    fail_capture: bool,
}

struct FakeCompositor {
    shared: Arc<Shared>,
}

impl FakeCompositor {
    fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }
}

struct FakeSurface {
    shared: Arc<Shared>,
    descriptor: SurfaceDescriptor,
    sender: mpsc::UnboundedSender<()>,
    receiver: Option<mpsc::UnboundedReceiver<()>>,
    payload: Option<Bytes>,
}

impl Compositor for FakeCompositor {
    type Surface = FakeSurface;

    fn enable(&self, _descriptor: &SurfaceDescriptor) -> Result<(), CaptureError> {
        self.shared.enables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn surface(&self, surface_id: &str) -> Result<Self::Surface, CaptureError> {
        let (sender, receiver) = mpsc::unbounded_channel();
        Ok(FakeSurface {
            shared: self.shared.clone(),
            descriptor: SurfaceDescriptor {
                surface_id: surface_id.to_string(),
                width: 4,
                height: 4,
            },
            sender,
            receiver: Some(receiver),
            payload: None,
        })
    }

    fn disable(&self, _surface_id: &str) {
        self.shared.disables.fetch_add(1, Ordering::SeqCst);
    }
}

impl Surface for FakeSurface {
    fn render_payload(&mut self, payload: &Bytes) -> Result<(), CaptureError> {
        self.payload = Some(payload.clone());
        Ok(())
    }

    fn set_display_properties(&mut self, properties: &DisplayProperties) {
        *self.shared.applied_properties.lock().unwrap() = Some(*properties);
    }

    fn render(&mut self) {
        for _ in 0..self.shared.notifications_per_render {
            let _ = self.sender.send(());
        }
    }

    fn rendered(&mut self) -> mpsc::UnboundedReceiver<()> {
        self.receiver.take().expect("rendered subscribed once")
    }

    fn capture(&self) -> Result<CapturedFrame, CaptureError> {
        self.shared.captures.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_capture {
            return Err(CaptureError::Render("frame copy failed".to_string()));
        }
        Ok(CapturedFrame {
            surface_id: self.descriptor.surface_id.clone(),
            width: self.descriptor.width,
            height: self.descriptor.height,
            pixels: self.payload.clone().unwrap_or_default(),
        })
    }
}

fn descriptor() -> SurfaceDescriptor {
    SurfaceDescriptor {
        surface_id: "scratch-1".to_string(),
        width: 4,
        height: 4,
    }
}

#[tokio::test]
async fn test_duplicate_notifications_capture_once_and_clean_up_once() {
    // Scenario: the notification source fires twice; only the first
    // notification produces a capture and the surface is disposed once.
    let shared = Arc::new(Shared {
        notifications_per_render: 2,
        ..Default::default()
    });
    let compositor = FakeCompositor::new(shared.clone());

    let frame = capture_once(
        &compositor,
        &descriptor(),
        Bytes::from_static(&[0x10, 0x20]),
        None,
        Some(Duration::from_secs(1)),
    )
    .await
    .unwrap();

    assert_eq!(frame.surface_id, "scratch-1");
    assert_eq!(frame.pixels, Bytes::from_static(&[0x10, 0x20]));
    assert_eq!(shared.captures.load(Ordering::SeqCst), 1);
    assert_eq!(shared.enables.load(Ordering::SeqCst), 1);
    assert_eq!(shared.disables.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_display_properties_are_applied_before_the_draw() {
    let shared = Arc::new(Shared {
        notifications_per_render: 1,
        ..Default::default()
    });
    let compositor = FakeCompositor::new(shared.clone());

    let properties = DisplayProperties {
        lower: -100.0,
        upper: 300.0,
    };
    capture_once(
        &compositor,
        &descriptor(),
        Bytes::from_static(&[0x01]),
        Some(properties),
        Some(Duration::from_secs(1)),
    )
    .await
    .unwrap();

    assert_eq!(*shared.applied_properties.lock().unwrap(), Some(properties));
}

#[tokio::test]
async fn test_capture_failure_still_disposes_the_surface() {
    let shared = Arc::new(Shared {
        notifications_per_render: 1,
        fail_capture: true,
        ..Default::default()
    });
    let compositor = FakeCompositor::new(shared.clone());

    let error = capture_once(
        &compositor,
        &descriptor(),
        Bytes::from_static(&[0x01]),
        None,
        Some(Duration::from_secs(1)),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        error,
        CaptureError::OneShot(OneShotError::Notify(_))
    ));
    assert_eq!(shared.disables.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_notification_times_out_and_cleans_up() {
    // render produces no notification at all; the deadline fires and the
    // surface is still disposed exactly once.
    let shared = Arc::new(Shared {
        notifications_per_render: 0,
        ..Default::default()
    });
    let compositor = FakeCompositor::new(shared.clone());

    let error = capture_once(
        &compositor,
        &descriptor(),
        Bytes::from_static(&[0x01]),
        None,
        Some(Duration::from_millis(20)),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        error,
        CaptureError::OneShot(OneShotError::NotificationTimeout(_))
    ));
    assert_eq!(shared.captures.load(Ordering::SeqCst), 0);
    assert_eq!(shared.disables.load(Ordering::SeqCst), 1);
}
